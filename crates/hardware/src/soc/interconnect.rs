//! System interconnect (bus / memory controller).
//!
//! This module implements the bus that routes byte requests to memory devices. It provides:
//! 1. **Device registration:** Devices are attached in order while the bus is off.
//! 2. **Layout planning:** RAM devices are packed from address 0 in registration order;
//!    devices with a pinned base (ROM) keep it. The plan is deterministic, so images can
//!    be loaded by absolute address before power-on.
//! 3. **Access routing:** A message goes to the first device whose range contains its address.
//! 4. **Power sequencing:** Devices are powered on in registration order and off after
//!    draining their requests.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, info};

use super::message::IoMessage;
use super::traits::Device;
use crate::common::addr::{Address, AddressRange};
use crate::common::constants::ADDRESS_SPACE_END;
use crate::common::error::{BusError, DeviceError};
use crate::common::power::{PowerStatus, StatusCell};

/// Address ranges computed for the attached devices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    ranges: Vec<AddressRange>,
    ram_end: Address,
}

impl Layout {
    /// Range of each device, in registration order.
    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }

    /// End of the contiguous RAM region; the initial stack pointer.
    pub const fn ram_end(&self) -> Address {
        self.ram_end
    }

    /// Index of the first device containing `address`, with the device-relative offset.
    pub fn locate(&self, address: Address) -> Option<(usize, u64)> {
        self.ranges
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.offset_of(address).map(|off| (i, off)))
    }
}

/// System bus connecting cores and memory devices.
#[derive(Debug, Default)]
pub struct Bus {
    devices: Vec<Arc<dyn Device>>,
    status: StatusCell,
    layout: RwLock<Option<Layout>>,
}

impl Bus {
    /// Creates an empty, powered-off bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device.
    ///
    /// # Arguments
    ///
    /// * `device` - The device to add; registration order decides layout and routing.
    ///
    /// # Returns
    ///
    /// `BusError::AttachWhilePowered` unless the bus is off.
    pub fn attach(&mut self, device: Arc<dyn Device>) -> Result<(), BusError> {
        if self.status.get() != PowerStatus::Off {
            return Err(BusError::AttachWhilePowered);
        }
        self.devices.push(device);
        Ok(())
    }

    /// Attached devices in registration order.
    pub fn devices(&self) -> &[Arc<dyn Device>] {
        &self.devices
    }

    /// Current bus status.
    pub fn status(&self) -> PowerStatus {
        self.status.get()
    }

    fn routes(&self) -> RwLockReadGuard<'_, Option<Layout>> {
        self.layout.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Computes the address layout without applying it.
    ///
    /// # Returns
    ///
    /// The layout, `AddressSpaceExhausted` when a range would end past 2^32, or
    /// `Overlap` when a pinned device collides with another range.
    pub fn plan_layout(&self) -> Result<Layout, BusError> {
        let mut cursor = 0_u64;
        let mut ram_end = 0_u64;
        let mut ranges: Vec<AddressRange> = Vec::with_capacity(self.devices.len());

        for device in &self.devices {
            let size = device.size();
            let base = match device.pinned_base() {
                Some(base) => base.val(),
                None => cursor,
            };
            let end = base.checked_add(size).filter(|&end| end <= ADDRESS_SPACE_END);
            let Some(end) = end else {
                return Err(BusError::AddressSpaceExhausted {
                    name: device.name().to_owned(),
                    base: Address::new(base),
                    size,
                });
            };
            if device.pinned_base().is_none() {
                cursor = end;
                ram_end = end;
            }

            let range = AddressRange::new(Address::new(base), size);
            if let Some(i) = ranges.iter().position(|r| r.overlaps(&range)) {
                return Err(BusError::Overlap {
                    first: self.devices[i].name().to_owned(),
                    first_range: ranges[i],
                    second: device.name().to_owned(),
                    second_range: range,
                });
            }
            ranges.push(range);
        }

        Ok(Layout {
            ranges,
            ram_end: Address::new(ram_end),
        })
    }

    /// End of the contiguous RAM region.
    pub fn ram_end(&self) -> Result<Address, BusError> {
        if let Some(layout) = self.routes().as_ref() {
            return Ok(layout.ram_end());
        }
        self.plan_layout().map(|l| l.ram_end())
    }

    /// Applies the layout and powers on every device in registration order.
    ///
    /// If a device fails, the devices already started are powered off again and the
    /// bus returns to OFF.
    pub fn power_on(&self) -> Result<(), BusError> {
        self.status
            .transition(PowerStatus::Off, PowerStatus::Starting)
            .map_err(|from| BusError::IllegalTransition {
                from,
                expected: PowerStatus::Off,
            })?;

        let layout = match self.plan_layout() {
            Ok(layout) => layout,
            Err(e) => {
                self.status.set(PowerStatus::Off);
                return Err(e);
            }
        };

        for (i, (device, range)) in self.devices.iter().zip(layout.ranges()).enumerate() {
            if let Err(e) = device.power_on(*range) {
                for started in &self.devices[..i] {
                    let _ = started.power_off();
                }
                self.status.set(PowerStatus::Off);
                return Err(e.into());
            }
            info!(device = device.name(), range = %range, "address range assigned");
        }

        *self.layout.write().unwrap_or_else(PoisonError::into_inner) = Some(layout);
        self.status.set(PowerStatus::On);
        info!(devices = self.devices.len(), "bus powered on");
        Ok(())
    }

    /// Drains and powers off every device, then clears the layout.
    ///
    /// Every device is powered off even if an earlier one fails; the first error is returned.
    pub fn power_off(&self) -> Result<(), BusError> {
        self.status
            .transition(PowerStatus::On, PowerStatus::Stopping)
            .map_err(|from| BusError::IllegalTransition {
                from,
                expected: PowerStatus::On,
            })?;

        let mut first_error: Option<DeviceError> = None;
        for device in &self.devices {
            if let Err(e) = device.power_off() {
                let _ = first_error.get_or_insert(e);
            }
        }

        *self.layout.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.status.set(PowerStatus::Off);
        info!("bus powered off");
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    /// Returns the first device whose range contains `address`.
    pub fn route(&self, address: Address) -> Result<Arc<dyn Device>, BusError> {
        self.routes()
            .as_ref()
            .and_then(|layout| layout.locate(address))
            .map(|(i, _)| Arc::clone(&self.devices[i]))
            .ok_or(BusError::Unmapped(address))
    }

    /// Routes a message to its device.
    pub fn push_io_message(&self, message: IoMessage) -> Result<(), BusError> {
        let device = self.route(message.address())?;
        device.push_io_message(message)?;
        Ok(())
    }

    /// Returns `true` when no device has queued or running requests.
    pub fn is_done(&self) -> bool {
        self.devices.iter().all(|d| d.is_done())
    }

    /// Copies an image into the devices covering `[address, address + data.len())`.
    ///
    /// Uses the planned layout; every device involved must be off.
    pub fn load_image(&self, address: Address, data: &[u8]) -> Result<(), BusError> {
        let layout = self.plan_layout()?;
        let mut cursor = address;
        let mut rest = data;
        while !rest.is_empty() {
            let (i, offset) = layout.locate(cursor).ok_or(BusError::Unmapped(cursor))?;
            let room = layout.ranges()[i].size - offset;
            let take = rest.len().min(usize::try_from(room).unwrap_or(usize::MAX));
            self.devices[i].load(offset, &rest[..take])?;
            debug!(device = self.devices[i].name(), %cursor, bytes = take, "image loaded");
            rest = &rest[take..];
            cursor = cursor + take as u64;
        }
        Ok(())
    }

    /// Reads `len` bytes starting at `address` from powered-off devices.
    pub fn peek(&self, address: Address, len: usize) -> Result<Vec<u8>, BusError> {
        let layout = self.plan_layout()?;
        let mut out = Vec::with_capacity(len);
        let mut cursor = address;
        while out.len() < len {
            let (i, offset) = layout.locate(cursor).ok_or(BusError::Unmapped(cursor))?;
            let room = layout.ranges()[i].size - offset;
            let take = (len - out.len()).min(usize::try_from(room).unwrap_or(usize::MAX));
            out.extend(self.devices[i].peek(offset, take)?);
            cursor = cursor + take as u64;
        }
        Ok(out)
    }

    /// Reads a big-endian word from powered-off devices.
    pub fn peek_word(&self, address: Address) -> Result<u32, BusError> {
        let bytes = self.peek(address, 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
