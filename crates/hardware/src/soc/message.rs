//! Bus messages and thread-safe message queues.
//!
//! This module defines the only currency exchanged between cores and devices:
//! 1. **IoMessage:** A single-byte write, or a single-byte read carrying its reply queue.
//! 2. **IoQueue:** A cloneable, thread-safe FIFO of messages.
//!
//! A read completes when a `Write` message with the same address appears on its
//! reply queue. There is no synchronous return path.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::common::addr::Address;

/// One byte-sized request travelling over the bus.
#[derive(Clone, Debug)]
pub enum IoMessage {
    /// Store `value` at `address`. When `ack` is set, the device pushes this
    /// message back onto it after the store completes.
    Write {
        /// Absolute target address.
        address: Address,
        /// Byte to store.
        value: u8,
        /// Completion queue for acknowledged writes.
        ack: Option<IoQueue>,
    },
    /// Load the byte at `address` and answer with a `Write` on `reply`.
    Read {
        /// Absolute source address.
        address: Address,
        /// Write-back queue receiving the answer.
        reply: IoQueue,
    },
}

impl IoMessage {
    /// Fire-and-forget write.
    pub const fn write(address: Address, value: u8) -> Self {
        Self::Write {
            address,
            value,
            ack: None,
        }
    }

    /// Write acknowledged on `ack` once stored.
    pub const fn acked_write(address: Address, value: u8, ack: IoQueue) -> Self {
        Self::Write {
            address,
            value,
            ack: Some(ack),
        }
    }

    /// Read answered on `reply`.
    pub const fn read(address: Address, reply: IoQueue) -> Self {
        Self::Read { address, reply }
    }

    /// Target address of the message.
    pub const fn address(&self) -> Address {
        match self {
            Self::Write { address, .. } | Self::Read { address, .. } => *address,
        }
    }

    /// Returns `true` for writes.
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Thread-safe FIFO of [`IoMessage`]s.
///
/// Clones share the same queue. Every operation holds the lock for a single
/// push or pop, so a poisoned lock still guards a consistent queue and is recovered.
#[derive(Clone, Debug, Default)]
pub struct IoQueue {
    inner: Arc<Mutex<VecDeque<IoMessage>>>,
}

impl IoQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<IoMessage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message at the back.
    pub fn push(&self, message: IoMessage) {
        self.lock().push_back(message);
    }

    /// Removes the message at the front.
    pub fn pop(&self) -> Option<IoMessage> {
        self.lock().pop_front()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns all queued messages.
    pub fn drain(&self) -> Vec<IoMessage> {
        self.lock().drain(..).collect()
    }
}
