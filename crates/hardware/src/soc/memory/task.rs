//! Latency-modelled device tasks.
//!
//! One `DeviceTask` serves one admitted [`IoMessage`]. It idles for the device's
//! configured latency, then performs its single byte transfer on the following step.

use tracing::{trace, warn};

use super::buffer::MemoryBuffer;
use crate::common::clock::Step;
use crate::soc::message::IoMessage;

/// Access rights of the device running a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Reads and writes reach the buffer.
    ReadWrite,
    /// Writes are dropped (and still acknowledged).
    ReadOnly,
}

/// A request in flight on a device.
#[derive(Debug)]
pub struct DeviceTask {
    message: IoMessage,
    offset: u64,
    remaining: u32,
}

impl DeviceTask {
    /// Creates a task for `message`, which targets the device-relative `offset`.
    pub const fn new(message: IoMessage, offset: u64, latency: u32) -> Self {
        Self {
            message,
            offset,
            remaining: latency,
        }
    }

    /// Advances the task by one device cycle.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Backing store of the device.
    /// * `access` - Whether writes reach the buffer.
    /// * `device` - Device name for logs.
    ///
    /// # Returns
    ///
    /// `Step::Done` on the step that performs the transfer.
    pub fn step(&mut self, buffer: &mut MemoryBuffer, access: Access, device: &str) -> Step {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Step::Pending;
        }

        match &self.message {
            IoMessage::Write {
                address,
                value,
                ack,
            } => {
                if access == Access::ReadOnly {
                    warn!(device, %address, "write to read-only device dropped");
                } else if !buffer.set_byte(self.offset, *value) {
                    warn!(device, %address, "write past end of buffer dropped");
                }
                trace!(device, %address, value, "write complete");
                if let Some(ack) = ack {
                    ack.push(self.message.clone());
                }
            }
            IoMessage::Read { address, reply } => {
                let value = buffer.byte(self.offset).unwrap_or(0);
                trace!(device, %address, value, "read complete");
                reply.push(IoMessage::write(*address, value));
            }
        }
        Step::Done
    }
}
