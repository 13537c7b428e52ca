//! Device trait for bus-attached components.
//!
//! This module defines the `Device` trait implemented by every component the bus
//! routes to. It provides:
//! 1. **Identification:** `name`, `size`, an optional pinned base, and the assigned range.
//! 2. **Lifecycle:** `power_on` with the range the bus planned, and a draining `power_off`.
//! 3. **Access:** Asynchronous `push_io_message`, plus host-side `load`/`peek` while off.
//!
//! All methods take `&self`; implementors synchronise internally so one device can be
//! shared between the bus and its own worker thread.

use std::fmt;

use crate::common::addr::{Address, AddressRange};
use crate::common::error::DeviceError;
use crate::common::power::PowerStatus;
use crate::soc::message::IoMessage;

/// A component reachable through the bus.
pub trait Device: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors (e.g. `"RAM0"`, `"ROM"`).
    fn name(&self) -> &str;

    /// Capacity in bytes.
    fn size(&self) -> u64;

    /// Fixed base address, if the device does not take the next free RAM slot.
    fn pinned_base(&self) -> Option<Address> {
        None
    }

    /// Current power status.
    fn status(&self) -> PowerStatus;

    /// Range assigned at power-on; `None` while off.
    fn address_range(&self) -> Option<AddressRange>;

    /// Assigns `range` and starts the worker. Illegal unless OFF.
    fn power_on(&self, range: AddressRange) -> Result<(), DeviceError>;

    /// Drains all queued and running requests, stops the worker and clears the
    /// range. Illegal unless ON.
    fn power_off(&self) -> Result<(), DeviceError>;

    /// Queues a request. Rejected unless ON or when the address is outside the
    /// assigned range.
    fn push_io_message(&self, message: IoMessage) -> Result<(), DeviceError>;

    /// Returns `true` when no request is queued or running.
    fn is_done(&self) -> bool;

    /// Copies `data` into the backing store at a device-relative offset. Requires OFF.
    fn load(&self, offset: u64, data: &[u8]) -> Result<(), DeviceError>;

    /// Reads `len` bytes from a device-relative offset. Requires OFF.
    fn peek(&self, offset: u64, len: usize) -> Result<Vec<u8>, DeviceError>;
}
