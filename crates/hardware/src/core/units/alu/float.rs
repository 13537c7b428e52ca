//! ALU single-precision float operations.
//!
//! Operands are the raw register bits reinterpreted as IEEE-754 binary32.
//! The IEEE result is always kept; the flags describe it:
//! 1. **Zero:** result is `+0.0` or `-0.0`.
//! 2. **Sign:** result is negative (sign bit set, NaN excluded).
//! 3. **Carry:** result is unordered (NaN).
//! 4. **Overflow:** result is infinite while both operands were finite.
//! 5. **Zero division:** FDIV with a zero divisor.

use super::{AluOp, AluOutcome};
use crate::common::reg::ConditionCodes;

/// Executes a float operation on raw binary32 bits.
///
/// Non-float opcodes return `a` unchanged with empty flags.
pub fn execute(op: AluOp, a: u32, b: u32) -> AluOutcome {
    let (lhs, rhs) = (f32::from_bits(a), f32::from_bits(b));
    let value = match op {
        AluOp::FAdd => lhs + rhs,
        AluOp::FSub => lhs - rhs,
        AluOp::FMul => lhs * rhs,
        AluOp::FDiv => lhs / rhs,
        _ => return AluOutcome::left(a, ConditionCodes::empty()),
    };

    let flags = ConditionCodes::empty()
        .with_zero(value == 0.0)
        .with_sign(!value.is_nan() && value.is_sign_negative() && value != 0.0)
        .with_carry(value.is_nan())
        .with_overflow(value.is_infinite() && lhs.is_finite() && rhs.is_finite())
        .with_zero_division(op == AluOp::FDiv && rhs == 0.0);

    AluOutcome::left(value.to_bits(), flags)
}
