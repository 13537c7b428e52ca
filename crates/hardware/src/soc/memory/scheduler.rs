//! Per-device request scheduling.
//!
//! This module implements the bounded concurrent task model of a memory device. It provides:
//! 1. **RequestQueue:** The inbound FIFO plus an outstanding-request counter shared with
//!    the device front end.
//! 2. **RequestScheduler:** The worker-side state machine that admits requests up to the
//!    concurrency bound and steps every running task once per tick.
//!
//! The scheduler needs no thread, so timing can be checked by ticking it by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use super::buffer::MemoryBuffer;
use super::task::{Access, DeviceTask};
use crate::common::addr::AddressRange;
use crate::config::DeviceConfig;
use crate::soc::message::{IoMessage, IoQueue};

/// Inbound requests of one device.
///
/// `outstanding` counts requests submitted but not yet completed, so it covers both
/// queued messages and running tasks without a window where a request is in neither.
#[derive(Clone, Debug, Default)]
pub struct RequestQueue {
    messages: IoQueue,
    outstanding: Arc<AtomicUsize>,
}

impl RequestQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request.
    pub fn submit(&self, message: IoMessage) {
        let _ = self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.messages.push(message);
    }

    fn take(&self) -> Option<IoMessage> {
        self.messages.pop()
    }

    fn complete(&self) {
        let _ = self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    /// Requests submitted and not yet completed.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Requests waiting for admission.
    pub fn queued(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` when every submitted request has completed.
    pub fn is_idle(&self) -> bool {
        self.outstanding() == 0
    }
}

/// Worker-side state of a memory device.
#[derive(Debug)]
pub struct RequestScheduler {
    name: String,
    range: AddressRange,
    read_latency: u32,
    write_latency: u32,
    max_concurrent: usize,
    access: Access,
    requests: RequestQueue,
    running: Vec<DeviceTask>,
    buffer: MemoryBuffer,
}

impl RequestScheduler {
    /// Creates a scheduler serving `requests` for a device mapped at `range`.
    ///
    /// A concurrency bound of zero is treated as one.
    pub fn new(
        name: impl Into<String>,
        range: AddressRange,
        config: &DeviceConfig,
        access: Access,
        buffer: MemoryBuffer,
        requests: RequestQueue,
    ) -> Self {
        Self {
            name: name.into(),
            range,
            read_latency: config.read_latency,
            write_latency: config.write_latency,
            max_concurrent: config.max_concurrent_tasks.max(1),
            access,
            requests,
            running: Vec::new(),
            buffer,
        }
    }

    /// Advances the device by one cycle.
    ///
    /// Admits queued requests while fewer than the bound are running, then steps
    /// every running task once in admission order.
    ///
    /// # Returns
    ///
    /// Number of requests completed during this tick.
    pub fn tick(&mut self) -> usize {
        while self.running.len() < self.max_concurrent {
            let Some(message) = self.requests.take() else {
                break;
            };
            let Some(offset) = self.range.offset_of(message.address()) else {
                warn!(device = %self.name, address = %message.address(), "request outside device range dropped");
                self.requests.complete();
                continue;
            };
            let latency = if message.is_write() {
                self.write_latency
            } else {
                self.read_latency
            };
            self.running.push(DeviceTask::new(message, offset, latency));
        }

        let Self {
            name,
            access,
            requests,
            running,
            buffer,
            ..
        } = self;
        let before = running.len();
        running.retain_mut(|task| {
            if task.step(buffer, *access, name).is_done() {
                requests.complete();
                false
            } else {
                true
            }
        });
        before - running.len()
    }

    /// Returns `true` when nothing is queued or running.
    pub fn is_done(&self) -> bool {
        self.running.is_empty() && self.requests.queued() == 0
    }

    /// Number of running tasks.
    pub fn running_tasks(&self) -> usize {
        self.running.len()
    }

    /// Number of requests waiting for admission.
    pub fn queued(&self) -> usize {
        self.requests.queued()
    }

    /// Backing store.
    pub const fn buffer(&self) -> &MemoryBuffer {
        &self.buffer
    }

    /// Consumes the scheduler, returning the backing store.
    pub fn into_buffer(self) -> MemoryBuffer {
        self.buffer
    }
}
