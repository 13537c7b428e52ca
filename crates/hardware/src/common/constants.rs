//! Global System Constants.
//!
//! This module defines machine-wide constants. It includes:
//! 1. **Word Constants:** Register and instruction widths.
//! 2. **Address Space:** The 32-bit ceiling every device range must fit under.
//! 3. **Reference Memory Map:** The firmware ROM window of the reference configuration.

/// Width of a register, an instruction word, and an immediate word, in bytes.
pub const WORD_SIZE: u32 = 4;

/// First address past the 32-bit address space.
pub const ADDRESS_SPACE_END: u64 = 1 << 32;

/// Base of the firmware ROM window in the reference configuration.
pub const ROM_REFERENCE_BASE: u64 = 0xFFFF_FBFF;

/// Size of the firmware ROM window (`0xFFFFFBFF..=0xFFFFFFFF`).
pub const ROM_REFERENCE_SIZE: u64 = ADDRESS_SPACE_END - ROM_REFERENCE_BASE;

/// Number of slots in the register file (the full 6-bit register ID space).
pub const REGISTER_SLOTS: usize = 64;

/// Length of the CPUID vendor string in bytes (four registers).
pub const VENDOR_ID_LEN: usize = 16;
