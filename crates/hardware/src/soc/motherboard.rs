//! Machine construction and top-level `Motherboard` type.
//!
//! This module builds the complete machine from configuration. It performs:
//! 1. **Bus setup:** Creates the bus and registers RAM devices in order, then the ROM.
//! 2. **Package setup:** Creates the package and its cores.
//! 3. **Image loading:** Copies machine code into devices by absolute address while off.
//! 4. **Power sequencing:** Bus before package on power-on, package before bus on power-off.

use std::sync::Arc;

use tracing::info;

use super::interconnect::Bus;
use super::memory::Memory;
use crate::common::addr::Address;
use crate::common::error::{PowerError, SimError};
use crate::common::power::{PowerStatus, StatusCell, agreed_status};
use crate::config::Config;
use crate::core::package::Package;
use crate::stats::CoreStats;

/// Top-level machine: one package and one bus.
#[derive(Debug)]
pub struct Motherboard {
    package: Package,
    bus: Arc<Bus>,
    status: StatusCell,
}

impl Motherboard {
    /// Builds a powered-off machine from configuration.
    ///
    /// RAM devices are named `RAM0`, `RAM1`, ... in configuration order; the optional
    /// ROM is named `ROM`.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine configuration.
    ///
    /// # Returns
    ///
    /// The machine, or the error of attaching a device.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let mut bus = Bus::new();
        for (i, ram) in config.memory.ram.iter().enumerate() {
            bus.attach(Arc::new(Memory::ram(format!("RAM{i}"), *ram)))?;
        }
        if let Some(rom) = &config.memory.rom {
            bus.attach(Arc::new(Memory::rom("ROM", rom)))?;
        }
        Ok(Self::from_parts(Package::new(config), bus))
    }

    /// Assembles a machine from an existing package and bus.
    pub fn from_parts(package: Package, bus: Bus) -> Self {
        Self {
            package,
            bus: Arc::new(bus),
            status: StatusCell::new(),
        }
    }

    /// The CPU package.
    pub const fn package(&self) -> &Package {
        &self.package
    }

    /// The bus.
    pub const fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Status the package and bus agree on.
    ///
    /// # Panics
    ///
    /// Panics when they disagree, e.g. after a core halted while the bus is still on.
    pub fn status(&self) -> PowerStatus {
        agreed_status(
            "motherboard",
            [self.package.status(), self.bus.status()],
        )
    }

    /// Copies machine code into the devices covering `address`. Requires the machine off.
    pub fn load_image(&self, address: Address, image: &[u8]) -> Result<(), SimError> {
        self.bus.load_image(address, image)?;
        info!(%address, bytes = image.len(), "image loaded");
        Ok(())
    }

    /// Reads memory while the machine is off.
    pub fn peek(&self, address: Address, len: usize) -> Result<Vec<u8>, SimError> {
        Ok(self.bus.peek(address, len)?)
    }

    /// Reads a big-endian word while the machine is off.
    pub fn peek_word(&self, address: Address) -> Result<u32, SimError> {
        Ok(self.bus.peek_word(address)?)
    }

    fn illegal(from: PowerStatus, expected: PowerStatus) -> PowerError {
        PowerError::IllegalTransition {
            component: "motherboard".to_owned(),
            from,
            expected,
        }
    }

    /// Powers on the bus (and every device), then the package (and every core).
    ///
    /// If the package fails, the bus is powered off again.
    pub fn power_on(&self) -> Result<(), SimError> {
        self.status
            .transition(PowerStatus::Off, PowerStatus::Starting)
            .map_err(|from| Self::illegal(from, PowerStatus::Off))?;

        if let Err(e) = self.bus.power_on() {
            self.status.set(PowerStatus::Off);
            return Err(e.into());
        }
        if let Err(e) = self.package.power_on(&self.bus) {
            let _ = self.bus.power_off();
            self.status.set(PowerStatus::Off);
            return Err(e);
        }

        self.status.set(PowerStatus::On);
        info!("motherboard powered on");
        Ok(())
    }

    /// Stops the package, then drains and powers off the bus.
    ///
    /// The bus is powered off even when the package reports an error; the package
    /// error wins.
    pub fn power_off(&self) -> Result<(), SimError> {
        self.status
            .transition(PowerStatus::On, PowerStatus::Stopping)
            .map_err(|from| Self::illegal(from, PowerStatus::On))?;

        let package = self.package.power_off();
        let bus = self.bus.power_off();
        self.status.set(PowerStatus::Off);
        info!("motherboard powered off");
        package?;
        bus?;
        Ok(())
    }

    /// Blocks until every core stopped on its own.
    pub fn wait(&self) -> Result<(), SimError> {
        self.package.wait()
    }

    /// Powers on, waits for every core to halt, and powers off.
    ///
    /// # Returns
    ///
    /// The combined statistics of all cores, or the first error.
    pub fn run(&self) -> Result<CoreStats, SimError> {
        self.power_on()?;
        let waited = self.wait();
        let stopped = self.power_off();
        waited?;
        stopped?;
        Ok(self.package.stats())
    }
}
