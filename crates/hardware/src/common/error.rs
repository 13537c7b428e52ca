//! Error definitions.
//!
//! This module defines the failure types of the emulator. It provides:
//! 1. **Codec Errors:** Malformed instruction-word input.
//! 2. **Device and Bus Errors:** Routing, allocation, and device-state failures.
//! 3. **Power Errors:** Illegal lifecycle transitions.
//! 4. **Core Errors:** Fatal dispatch and execution failures of a core worker.
//!
//! Guest-visible arithmetic conditions (division by zero, oversized shifts) are not
//! errors; the ALU reports them through the condition-code register.

use thiserror::Error;

use super::addr::{Address, AddressRange};
use super::power::PowerStatus;
use crate::isa::opcodes::Opcode;
use crate::isa::registers::RegisterId;

/// Failure decoding a machine word.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input was not exactly one 4-byte word.
    #[error("instruction word must be 4 bytes, got {0}")]
    InvalidLength(usize),
}

/// Failure of a single memory device.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// A request was pushed while the device was not powered on.
    #[error("device {0} is not powered on")]
    PoweredOff(String),
    /// Host-side access (load or peek) attempted while the device was running.
    #[error("device {0} is powered on; host access requires it to be off")]
    PoweredOn(String),
    /// A lifecycle call did not match the current power status.
    #[error("device {name}: illegal power transition from {from} (expected {expected})")]
    IllegalTransition {
        /// Device name.
        name: String,
        /// Status observed.
        from: PowerStatus,
        /// Status the call requires.
        expected: PowerStatus,
    },
    /// A host access fell outside the backing buffer.
    #[error("device {name}: access of {len} bytes at offset {offset:#x} exceeds capacity {capacity:#x}")]
    OutOfRange {
        /// Device name.
        name: String,
        /// Device-relative offset.
        offset: u64,
        /// Access length.
        len: usize,
        /// Device capacity.
        capacity: u64,
    },
    /// An address handed to the device lies outside its assigned range.
    #[error("device {name}: address {address} is not mapped by this device")]
    Unmapped {
        /// Device name.
        name: String,
        /// Offending address.
        address: Address,
    },
    /// The device worker thread could not be spawned.
    #[error("device {name}: failed to spawn worker: {reason}")]
    WorkerSpawn {
        /// Device name.
        name: String,
        /// OS error text.
        reason: String,
    },
    /// The device worker thread panicked.
    #[error("device {0} worker panicked")]
    WorkerPanicked(String),
}

/// Failure of the bus (memory controller).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BusError {
    /// No powered device owns the address.
    #[error("no device mapped at {0}")]
    Unmapped(Address),
    /// A device range would end past the 32-bit address ceiling.
    #[error("device {name} of {size:#x} bytes at {base} exceeds the 32-bit address space")]
    AddressSpaceExhausted {
        /// Device name.
        name: String,
        /// Planned base address.
        base: Address,
        /// Device size in bytes.
        size: u64,
    },
    /// Two planned ranges overlap.
    #[error("device {first} {first_range} overlaps device {second} {second_range}")]
    Overlap {
        /// Earlier device name.
        first: String,
        /// Earlier device range.
        first_range: AddressRange,
        /// Later device name.
        second: String,
        /// Later device range.
        second_range: AddressRange,
    },
    /// Devices may only be attached while the bus is off.
    #[error("devices can only be attached while the bus is off")]
    AttachWhilePowered,
    /// A lifecycle call did not match the current power status.
    #[error("bus: illegal power transition from {from} (expected {expected})")]
    IllegalTransition {
        /// Status observed.
        from: PowerStatus,
        /// Status the call requires.
        expected: PowerStatus,
    },
    /// A device reported an error while being routed to.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Illegal lifecycle transition of a composite (core, package, motherboard).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PowerError {
    /// The call requires a different current status.
    #[error("{component}: illegal power transition from {from} (expected {expected})")]
    IllegalTransition {
        /// Component description, e.g. `core 0`.
        component: String,
        /// Status observed.
        from: PowerStatus,
        /// Status the call requires.
        expected: PowerStatus,
    },
}

/// Fatal failure of a core's execution pipeline.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CoreError {
    /// The dispatcher met an opcode value outside the catalogue.
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),
    /// The opcode is catalogued but reserved.
    #[error("opcode {0} is reserved and not implemented")]
    UnimplementedOpcode(Opcode),
    /// An instruction named a register ID that guests cannot address.
    #[error("invalid register id {0}")]
    InvalidRegister(u8),
    /// An instruction needs an operand that the encoded word leaves empty.
    #[error("{opcode} requires a {operand} register operand")]
    MissingOperand {
        /// Offending opcode.
        opcode: Opcode,
        /// `first` or `second`.
        operand: &'static str,
    },
    /// A register gated to kernel mode was accessed from user mode.
    #[error("privilege violation accessing {0}")]
    PrivilegeViolation(RegisterId),
    /// CPUID was given a request code it does not define.
    #[error("unknown CPUID request {0}")]
    UnknownCpuIdRequest(u32),
    /// A memory micro-operation could not be routed.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The core worker thread could not be spawned.
    #[error("core {id}: failed to spawn worker: {reason}")]
    WorkerSpawn {
        /// Core index within its package.
        id: usize,
        /// OS error text.
        reason: String,
    },
    /// The core worker thread panicked.
    #[error("core {0} worker panicked")]
    WorkerPanicked(usize),
}

/// Umbrella error for top-level callers.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimError {
    /// Codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Device failure.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// Bus failure.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// Composite power failure.
    #[error(transparent)]
    Power(#[from] PowerError),
    /// Core execution failure.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
