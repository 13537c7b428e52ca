//! Configuration system for the emulator.
//!
//! This module defines all configuration structures used to parameterize the machine.
//! It provides:
//! 1. **Defaults:** Baseline constants (memory sizes, latencies, clock rates).
//! 2. **Structures:** Hierarchical config for general, system, memory, and ALU settings.
//!
//! Configuration is supplied as JSON or built from `Config::default()`. Every field is
//! optional in JSON; missing fields take the same values as `Default`.
//!
//! ```
//! use microsim_core::config::Config;
//!
//! let json = r#"{ "system": { "cores": 2 }, "memory": { "ram": [ { "size": 4096 } ] } }"#;
//! let config = Config::from_json(json).unwrap();
//! assert_eq!(config.system.cores, 2);
//! assert_eq!(config.memory.ram[0].size, 4096);
//! assert_eq!(config.memory.ram[0].read_latency, 2);
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::SimError;
use crate::common::reg::PrivilegeMode;

/// Default configuration constants.
mod defaults {
    use crate::common::constants::{ROM_REFERENCE_BASE, ROM_REFERENCE_SIZE};

    /// Address the first instruction is fetched from.
    pub const ENTRY_POINT: u32 = 0;

    /// Package identity reported by CPUID.
    pub const PACKAGE_ID: u32 = 0;

    /// Cores per package.
    pub const CORES: usize = 1;

    /// Core clock; zero runs unthrottled.
    pub const CORE_FREQUENCY_HZ: u64 = 0;

    /// CPUID vendor string.
    pub const VENDOR: &str = "MicroSimCore32  ";

    /// RAM device size (64 KiB).
    pub const RAM_SIZE: u64 = 64 * 1024;

    /// Device read latency in device cycles.
    pub const READ_LATENCY: u32 = 2;

    /// Device write latency in device cycles.
    pub const WRITE_LATENCY: u32 = 2;

    /// Requests a device serves at once.
    pub const MAX_CONCURRENT_TASKS: usize = 4;

    /// Device clock; zero runs unthrottled.
    pub const DEVICE_FREQUENCY_HZ: u64 = 0;

    /// Firmware ROM base.
    pub const ROM_BASE: u64 = ROM_REFERENCE_BASE;

    /// Firmware ROM size.
    pub const ROM_SIZE: u64 = ROM_REFERENCE_SIZE;

    /// Integer add/subtract latency in pipeline cycles.
    pub const ALU_ADD: u32 = 1;

    /// Integer multiply latency.
    pub const ALU_MUL: u32 = 3;

    /// Integer divide latency.
    pub const ALU_DIV: u32 = 8;

    /// Bitwise logic latency.
    pub const ALU_LOGIC: u32 = 0;

    /// Shift latency.
    pub const ALU_SHIFT: u32 = 1;

    /// Float add/subtract latency.
    pub const ALU_FLOAT_ADD: u32 = 4;

    /// Float multiply latency.
    pub const ALU_FLOAT_MUL: u32 = 5;

    /// Float divide latency.
    pub const ALU_FLOAT_DIV: u32 = 12;
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Boot settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Package and core settings.
    #[serde(default)]
    pub system: SystemConfig,
    /// Memory devices attached to the bus.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// ALU latency table.
    #[serde(default)]
    pub alu: AluConfig,
}

impl Config {
    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Reads and parses a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}

/// Boot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Initial instruction pointer.
    #[serde(default = "GeneralConfig::default_entry_point")]
    pub entry_point: u32,
    /// Privilege level cores start in.
    #[serde(default)]
    pub start_privilege: PrivilegeMode,
}

impl GeneralConfig {
    fn default_entry_point() -> u32 {
        defaults::ENTRY_POINT
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            entry_point: defaults::ENTRY_POINT,
            start_privilege: PrivilegeMode::default(),
        }
    }
}

/// Package and core settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Package identity.
    #[serde(default = "SystemConfig::default_package_id")]
    pub package_id: u32,
    /// Number of cores in the package.
    #[serde(default = "SystemConfig::default_cores")]
    pub cores: usize,
    /// Core clock in hertz; zero runs unthrottled.
    #[serde(default = "SystemConfig::default_core_frequency")]
    pub core_frequency_hz: u64,
    /// Vendor string returned by CPUID request 0.
    #[serde(default = "SystemConfig::default_vendor")]
    pub vendor: String,
}

impl SystemConfig {
    fn default_package_id() -> u32 {
        defaults::PACKAGE_ID
    }

    fn default_cores() -> usize {
        defaults::CORES
    }

    fn default_core_frequency() -> u64 {
        defaults::CORE_FREQUENCY_HZ
    }

    fn default_vendor() -> String {
        defaults::VENDOR.to_owned()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            package_id: defaults::PACKAGE_ID,
            cores: defaults::CORES,
            core_frequency_hz: defaults::CORE_FREQUENCY_HZ,
            vendor: defaults::VENDOR.to_owned(),
        }
    }
}

/// Memory devices attached to the bus.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// RAM devices, mapped contiguously from address 0 in this order.
    #[serde(default = "MemoryConfig::default_ram")]
    pub ram: Vec<DeviceConfig>,
    /// Optional firmware ROM at a fixed base.
    #[serde(default)]
    pub rom: Option<RomConfig>,
}

impl MemoryConfig {
    fn default_ram() -> Vec<DeviceConfig> {
        vec![DeviceConfig::default()]
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram: Self::default_ram(),
            rom: None,
        }
    }
}

/// Timing and capacity of one memory device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Capacity in bytes.
    #[serde(default = "DeviceConfig::default_size")]
    pub size: u64,
    /// Device cycles a read idles before completing.
    #[serde(default = "DeviceConfig::default_read_latency")]
    pub read_latency: u32,
    /// Device cycles a write idles before completing.
    #[serde(default = "DeviceConfig::default_write_latency")]
    pub write_latency: u32,
    /// Requests in flight at once.
    #[serde(default = "DeviceConfig::default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Device clock in hertz; zero runs unthrottled.
    #[serde(default = "DeviceConfig::default_frequency")]
    pub frequency_hz: u64,
}

impl DeviceConfig {
    fn default_size() -> u64 {
        defaults::RAM_SIZE
    }

    fn default_read_latency() -> u32 {
        defaults::READ_LATENCY
    }

    fn default_write_latency() -> u32 {
        defaults::WRITE_LATENCY
    }

    fn default_max_concurrent_tasks() -> usize {
        defaults::MAX_CONCURRENT_TASKS
    }

    fn default_frequency() -> u64 {
        defaults::DEVICE_FREQUENCY_HZ
    }

    /// Returns a copy with a different capacity.
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Returns a copy with both latencies set to `latency`.
    pub const fn with_latency(mut self, latency: u32) -> Self {
        self.read_latency = latency;
        self.write_latency = latency;
        self
    }

    /// Returns a copy with a different concurrency bound.
    pub const fn with_max_concurrent_tasks(mut self, tasks: usize) -> Self {
        self.max_concurrent_tasks = tasks;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            size: defaults::RAM_SIZE,
            read_latency: defaults::READ_LATENCY,
            write_latency: defaults::WRITE_LATENCY,
            max_concurrent_tasks: defaults::MAX_CONCURRENT_TASKS,
            frequency_hz: defaults::DEVICE_FREQUENCY_HZ,
        }
    }
}

/// Firmware ROM placement and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RomConfig {
    /// Fixed base address.
    #[serde(default = "RomConfig::default_base")]
    pub base: u64,
    /// Capacity in bytes.
    #[serde(default = "RomConfig::default_size")]
    pub size: u64,
    /// Device cycles a read idles before completing.
    #[serde(default = "DeviceConfig::default_read_latency")]
    pub read_latency: u32,
    /// Requests in flight at once.
    #[serde(default = "DeviceConfig::default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Device clock in hertz; zero runs unthrottled.
    #[serde(default = "DeviceConfig::default_frequency")]
    pub frequency_hz: u64,
}

impl RomConfig {
    fn default_base() -> u64 {
        defaults::ROM_BASE
    }

    fn default_size() -> u64 {
        defaults::ROM_SIZE
    }

    /// Timing as a generic device configuration; ROM writes are dropped, so the
    /// write latency only paces their acknowledgement.
    pub const fn device(&self) -> DeviceConfig {
        DeviceConfig {
            size: self.size,
            read_latency: self.read_latency,
            write_latency: self.read_latency,
            max_concurrent_tasks: self.max_concurrent_tasks,
            frequency_hz: self.frequency_hz,
        }
    }
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            base: defaults::ROM_BASE,
            size: defaults::ROM_SIZE,
            read_latency: defaults::READ_LATENCY,
            max_concurrent_tasks: defaults::MAX_CONCURRENT_TASKS,
            frequency_hz: defaults::DEVICE_FREQUENCY_HZ,
        }
    }
}

/// ALU latency per operation kind, in pipeline cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AluConfig {
    /// ADD and SUB.
    #[serde(default = "AluConfig::default_add")]
    pub add: u32,
    /// UNSIGNED_MUL and SIGNED_MUL.
    #[serde(default = "AluConfig::default_mul")]
    pub mul: u32,
    /// UNSIGNED_DIV and SIGNED_DIV.
    #[serde(default = "AluConfig::default_div")]
    pub div: u32,
    /// AND, OR, XOR.
    #[serde(default = "AluConfig::default_logic")]
    pub logic: u32,
    /// SHL and SHR.
    #[serde(default = "AluConfig::default_shift")]
    pub shift: u32,
    /// FADD and FSUB.
    #[serde(default = "AluConfig::default_float_add")]
    pub float_add: u32,
    /// FMUL.
    #[serde(default = "AluConfig::default_float_mul")]
    pub float_mul: u32,
    /// FDIV.
    #[serde(default = "AluConfig::default_float_div")]
    pub float_div: u32,
}

impl AluConfig {
    fn default_add() -> u32 {
        defaults::ALU_ADD
    }

    fn default_mul() -> u32 {
        defaults::ALU_MUL
    }

    fn default_div() -> u32 {
        defaults::ALU_DIV
    }

    fn default_logic() -> u32 {
        defaults::ALU_LOGIC
    }

    fn default_shift() -> u32 {
        defaults::ALU_SHIFT
    }

    fn default_float_add() -> u32 {
        defaults::ALU_FLOAT_ADD
    }

    fn default_float_mul() -> u32 {
        defaults::ALU_FLOAT_MUL
    }

    fn default_float_div() -> u32 {
        defaults::ALU_FLOAT_DIV
    }

    /// A table with every latency at zero.
    pub const fn immediate() -> Self {
        Self {
            add: 0,
            mul: 0,
            div: 0,
            logic: 0,
            shift: 0,
            float_add: 0,
            float_mul: 0,
            float_div: 0,
        }
    }
}

impl Default for AluConfig {
    fn default() -> Self {
        Self {
            add: defaults::ALU_ADD,
            mul: defaults::ALU_MUL,
            div: defaults::ALU_DIV,
            logic: defaults::ALU_LOGIC,
            shift: defaults::ALU_SHIFT,
            float_add: defaults::ALU_FLOAT_ADD,
            float_mul: defaults::ALU_FLOAT_MUL,
            float_div: defaults::ALU_FLOAT_DIV,
        }
    }
}
