//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the 32-bit ALU driven by `AluOperation` micro-ops.
//! It handles integer arithmetic, bitwise logic, shifts, and IEEE-754 binary32
//! arithmetic, computing the condition codes for every result.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, UnsignedMul, SignedMul, UnsignedDiv, SignedDiv
//! - [`logic`]:      And, Or, Xor
//! - [`shifts`]:     Shl, Shr
//! - [`float`]:      FAdd, FSub, FMul, FDiv
//!
//! The computation itself is pure. Latency is modelled by the caller: the
//! micro-op idles for [`Alu::latency`] pipeline steps before asking for the result.

/// Integer arithmetic operations (add, subtract, multiply, divide).
pub mod arithmetic;

/// Single-precision float operations.
pub mod float;

/// Bitwise logical operations (and, or, xor).
pub mod logic;

/// Shift operations (shl, shr).
pub mod shifts;

use std::fmt;

use crate::common::reg::ConditionCodes;
use crate::config::AluConfig;

/// Operation kinds understood by the ALU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Two's-complement addition.
    Add,
    /// Two's-complement subtraction.
    Sub,
    /// Unsigned multiplication, low word kept.
    UnsignedMul,
    /// Signed multiplication, low word kept.
    SignedMul,
    /// Unsigned division; quotient left, remainder right.
    UnsignedDiv,
    /// Signed division; quotient left, remainder right.
    SignedDiv,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Logical shift left.
    Shl,
    /// Logical shift right.
    Shr,
    /// Float addition.
    FAdd,
    /// Float subtraction.
    FSub,
    /// Float multiplication.
    FMul,
    /// Float division.
    FDiv,
}

impl AluOp {
    /// Upper-case mnemonic used in traces.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::UnsignedMul => "UNSIGNED_MUL",
            Self::SignedMul => "SIGNED_MUL",
            Self::UnsignedDiv => "UNSIGNED_DIV",
            Self::SignedDiv => "SIGNED_DIV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
            Self::FAdd => "FADD",
            Self::FSub => "FSUB",
            Self::FMul => "FMUL",
            Self::FDiv => "FDIV",
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one ALU operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluOutcome {
    /// New value of the left operand register.
    pub left: u32,
    /// New value of the right operand register, for operations that write it.
    pub right: Option<u32>,
    /// Condition codes describing the result.
    pub flags: ConditionCodes,
}

impl AluOutcome {
    /// Outcome that only replaces the left operand.
    pub const fn left(value: u32, flags: ConditionCodes) -> Self {
        Self {
            left: value,
            right: None,
            flags,
        }
    }
}

/// Zero and sign flags for an integer result.
pub(crate) const fn result_flags(value: u32) -> ConditionCodes {
    ConditionCodes::empty()
        .with_zero(value == 0)
        .with_sign(value & 0x8000_0000 != 0)
}

/// Arithmetic Logic Unit with a per-operation latency table.
#[derive(Clone, Copy, Debug, Default)]
pub struct Alu {
    latency: AluConfig,
}

impl Alu {
    /// Creates an ALU with the given latency table.
    pub const fn new(latency: AluConfig) -> Self {
        Self { latency }
    }

    /// Pipeline steps an operation idles before producing its result.
    pub const fn latency(&self, op: AluOp) -> u32 {
        match op {
            AluOp::Add | AluOp::Sub => self.latency.add,
            AluOp::UnsignedMul | AluOp::SignedMul => self.latency.mul,
            AluOp::UnsignedDiv | AluOp::SignedDiv => self.latency.div,
            AluOp::And | AluOp::Or | AluOp::Xor => self.latency.logic,
            AluOp::Shl | AluOp::Shr => self.latency.shift,
            AluOp::FAdd | AluOp::FSub => self.latency.float_add,
            AluOp::FMul => self.latency.float_mul,
            AluOp::FDiv => self.latency.float_div,
        }
    }

    /// Executes an operation on two 32-bit operands.
    ///
    /// Dispatches to the appropriate submodule based on the operation type.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a`  - Left operand (raw register bits)
    /// * `b`  - Right operand (raw register bits, also the shift amount)
    ///
    /// # Returns
    ///
    /// The new left value, the new right value for division, and the flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use microsim_core::core::units::alu::{Alu, AluOp};
    ///
    /// let out = Alu::compute(AluOp::Add, 0xFFFF_FFFF, 1);
    /// assert_eq!(out.left, 0);
    /// assert!(out.flags.zero());
    /// assert!(out.flags.carry());
    ///
    /// let out = Alu::compute(AluOp::UnsignedDiv, 100, 7);
    /// assert_eq!(out.left, 14);
    /// assert_eq!(out.right, Some(2));
    ///
    /// let out = Alu::compute(AluOp::Shl, 1, 32);
    /// assert_eq!(out.left, 0);
    /// assert!(out.flags.overflow());
    /// ```
    pub fn compute(op: AluOp, a: u32, b: u32) -> AluOutcome {
        match op {
            AluOp::Add
            | AluOp::Sub
            | AluOp::UnsignedMul
            | AluOp::SignedMul
            | AluOp::UnsignedDiv
            | AluOp::SignedDiv => arithmetic::execute(op, a, b),

            AluOp::And | AluOp::Or | AluOp::Xor => logic::execute(op, a, b),

            AluOp::Shl | AluOp::Shr => shifts::execute(op, a, b),

            AluOp::FAdd | AluOp::FSub | AluOp::FMul | AluOp::FDiv => float::execute(op, a, b),
        }
    }
}
