//! Common utilities and types used throughout the emulator.
//!
//! This module provides the building blocks shared by the core and the memory subsystem:
//! 1. **Address Types:** Absolute byte addresses and half-open address ranges.
//! 2. **Clock:** Frequency-to-wait conversion and the cooperative step result.
//! 3. **Constants:** Word size, address-space ceiling, and the reference memory map.
//! 4. **Error Handling:** Error enums for every fallible component.
//! 5. **Power:** The OFF/STARTING/ON/STOPPING lifecycle shared by all components.
//! 6. **Register Management:** 32-bit registers, condition codes, and the register file.

/// Address and address-range types.
pub mod addr;

/// Per-component clock.
pub mod clock;

/// Common constants used throughout the emulator.
pub mod constants;

/// Error types.
pub mod error;

/// Power lifecycle states.
pub mod power;

/// Register file implementation.
pub mod reg;

pub use addr::{Address, AddressRange};
pub use clock::{Clock, Step};
pub use error::{BusError, CodecError, CoreError, DeviceError, PowerError, SimError};
pub use power::PowerStatus;
pub use reg::{ConditionCodes, PrivilegeMode, Register, RegisterAccess, RegisterFile};
