//! Registers and the register file.
//!
//! This module provides the storage a core's micro-operations act on:
//! 1. **Register:** A 4-byte cell readable as unsigned, signed, float, or raw bytes.
//! 2. **Access Gates:** Kernel-only read/write gates and the reserved "no direct move" gate.
//! 3. **Condition Codes:** Named bit accessors over the condition-code register.
//! 4. **Register File:** One slot per 6-bit register ID, indexed directly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constants::REGISTER_SLOTS;
use super::error::CoreError;
use crate::isa::registers::RegisterId;

/// Privilege level a core executes at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PrivilegeMode {
    /// Guest user code; kernel-gated registers are inaccessible.
    User,
    /// Firmware and kernel code; every register is accessible.
    #[default]
    Kernel,
}

/// Access gates attached to a register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterAccess {
    /// Reads require kernel mode.
    pub kernel_read: bool,
    /// Writes require kernel mode.
    pub kernel_write: bool,
    /// Register may not be the target of a direct move. Recorded only; not enforced.
    pub no_direct_move: bool,
}

impl RegisterAccess {
    /// No restrictions.
    pub const OPEN: Self = Self {
        kernel_read: false,
        kernel_write: false,
        no_direct_move: false,
    };

    /// Kernel-only read and write.
    pub const KERNEL: Self = Self {
        kernel_read: true,
        kernel_write: true,
        no_direct_move: false,
    };

    /// Open access, flagged as not directly movable.
    pub const NO_MOVE: Self = Self {
        kernel_read: false,
        kernel_write: false,
        no_direct_move: true,
    };

    /// Returns `true` if `mode` may read the register.
    pub const fn can_read(&self, mode: PrivilegeMode) -> bool {
        !self.kernel_read || matches!(mode, PrivilegeMode::Kernel)
    }

    /// Returns `true` if `mode` may write the register.
    pub const fn can_write(&self, mode: PrivilegeMode) -> bool {
        !self.kernel_write || matches!(mode, PrivilegeMode::Kernel)
    }
}

/// A 32-bit register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Register {
    value: u32,
    access: RegisterAccess,
}

impl Register {
    /// Creates a zeroed register with the given gates.
    pub const fn new(access: RegisterAccess) -> Self {
        Self { value: 0, access }
    }

    /// Returns the access gates.
    pub const fn access(&self) -> RegisterAccess {
        self.access
    }

    /// Unsigned view.
    #[inline(always)]
    pub const fn as_u32(&self) -> u32 {
        self.value
    }

    /// Two's-complement view.
    #[inline(always)]
    pub const fn as_i32(&self) -> i32 {
        self.value as i32
    }

    /// IEEE-754 binary32 view.
    #[inline(always)]
    pub const fn as_f32(&self) -> f32 {
        f32::from_bits(self.value)
    }

    /// Raw bytes, big-endian.
    pub const fn to_bytes(&self) -> [u8; 4] {
        self.value.to_be_bytes()
    }

    /// Stores an unsigned value.
    #[inline(always)]
    pub const fn set_u32(&mut self, value: u32) {
        self.value = value;
    }

    /// Stores a signed value.
    pub const fn set_i32(&mut self, value: i32) {
        self.value = value as u32;
    }

    /// Stores a float value.
    pub const fn set_f32(&mut self, value: f32) {
        self.value = value.to_bits();
    }

    /// Stores raw big-endian bytes.
    pub const fn set_bytes(&mut self, bytes: [u8; 4]) {
        self.value = u32::from_be_bytes(bytes);
    }

    /// Returns bit `n` (0 = least significant).
    pub const fn bit(&self, n: u32) -> bool {
        n < 32 && (self.value >> n) & 1 == 1
    }
}

/// View over the condition-code register.
///
/// ALU operations with a condition-code target overwrite all bits at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCodes(pub u32);

impl ConditionCodes {
    /// Result was zero.
    pub const ZERO: u32 = 1 << 0;
    /// Unsigned overflow (carry out or borrow).
    pub const CARRY: u32 = 1 << 1;
    /// Result was negative.
    pub const SIGN: u32 = 1 << 2;
    /// Signed overflow.
    pub const OVERFLOW: u32 = 1 << 3;
    /// Division by zero was attempted.
    pub const ZERO_DIVISION: u32 = 1 << 4;

    /// Creates an empty flag set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns the raw word.
    pub const fn bits(self) -> u32 {
        self.0
    }

    const fn get(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    const fn with(self, mask: u32, on: bool) -> Self {
        if on { Self(self.0 | mask) } else { Self(self.0 & !mask) }
    }

    /// Zero flag.
    pub const fn zero(self) -> bool {
        self.get(Self::ZERO)
    }

    /// Carry flag.
    pub const fn carry(self) -> bool {
        self.get(Self::CARRY)
    }

    /// Sign flag.
    pub const fn sign(self) -> bool {
        self.get(Self::SIGN)
    }

    /// Overflow flag.
    pub const fn overflow(self) -> bool {
        self.get(Self::OVERFLOW)
    }

    /// Zero-division flag.
    pub const fn zero_division(self) -> bool {
        self.get(Self::ZERO_DIVISION)
    }

    /// Returns a copy with the zero flag set to `on`.
    pub const fn with_zero(self, on: bool) -> Self {
        self.with(Self::ZERO, on)
    }

    /// Returns a copy with the carry flag set to `on`.
    pub const fn with_carry(self, on: bool) -> Self {
        self.with(Self::CARRY, on)
    }

    /// Returns a copy with the sign flag set to `on`.
    pub const fn with_sign(self, on: bool) -> Self {
        self.with(Self::SIGN, on)
    }

    /// Returns a copy with the overflow flag set to `on`.
    pub const fn with_overflow(self, on: bool) -> Self {
        self.with(Self::OVERFLOW, on)
    }

    /// Returns a copy with the zero-division flag set to `on`.
    pub const fn with_zero_division(self, on: bool) -> Self {
        self.with(Self::ZERO_DIVISION, on)
    }
}

/// A core's register file: one slot per register ID.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    regs: [Register; REGISTER_SLOTS],
}

impl RegisterFile {
    /// Creates a zeroed register file with each register's gates installed.
    pub fn new() -> Self {
        let mut regs = [Register::default(); REGISTER_SLOTS];
        for id in RegisterId::ALL {
            regs[id.index()] = Register::new(id.access());
        }
        Self { regs }
    }

    /// Zeroes every register, keeping the gates.
    pub fn reset(&mut self) {
        for reg in &mut self.regs {
            reg.set_u32(0);
        }
    }

    /// Returns the register cell.
    pub const fn get(&self, id: RegisterId) -> &Register {
        &self.regs[id.index()]
    }

    /// Returns the register cell mutably.
    pub const fn get_mut(&mut self, id: RegisterId) -> &mut Register {
        &mut self.regs[id.index()]
    }

    /// Reads a register without checking gates (host peek).
    pub const fn read(&self, id: RegisterId) -> u32 {
        self.regs[id.index()].as_u32()
    }

    /// Writes a register without checking gates (host poke).
    pub const fn write(&mut self, id: RegisterId, value: u32) {
        self.regs[id.index()].set_u32(value);
    }

    /// Reads a register on behalf of code running in `mode`.
    pub fn read_checked(&self, id: RegisterId, mode: PrivilegeMode) -> Result<u32, CoreError> {
        let reg = &self.regs[id.index()];
        if reg.access().can_read(mode) {
            Ok(reg.as_u32())
        } else {
            Err(CoreError::PrivilegeViolation(id))
        }
    }

    /// Writes a register on behalf of code running in `mode`.
    pub fn write_checked(
        &mut self,
        id: RegisterId,
        mode: PrivilegeMode,
        value: u32,
    ) -> Result<(), CoreError> {
        let reg = &mut self.regs[id.index()];
        if reg.access().can_write(mode) {
            reg.set_u32(value);
            Ok(())
        } else {
            Err(CoreError::PrivilegeViolation(id))
        }
    }

    /// Returns the condition-code register as flags.
    pub const fn flags(&self) -> ConditionCodes {
        ConditionCodes(self.read(RegisterId::Ccr))
    }

    /// Logs every architectural register at debug level.
    pub fn dump(&self) {
        for id in RegisterId::ALL {
            debug!(register = %id, value = format_args!("{:#010x}", self.read(id)), "register");
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
