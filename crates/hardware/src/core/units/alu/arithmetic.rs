//! ALU arithmetic operations.
//!
//! Implements 32-bit two's-complement addition, subtraction, multiplication,
//! and division together with their condition codes.
//!
//! Division by zero is not a fault: it sets the zero-division flag and zeroes
//! both operands. Signed `i32::MIN / -1` wraps and sets the overflow flag.

use super::{AluOp, AluOutcome, result_flags};
use crate::common::reg::ConditionCodes;

/// Executes an integer arithmetic operation.
///
/// # Arguments
///
/// * `op` - The ALU operation to perform (must be an arithmetic variant).
/// * `a`  - Left operand.
/// * `b`  - Right operand.
///
/// # Returns
///
/// The outcome; division also replaces the right operand with the remainder.
/// Non-arithmetic opcodes return `a` unchanged with empty flags.
pub fn execute(op: AluOp, a: u32, b: u32) -> AluOutcome {
    match op {
        AluOp::Add => add(a, b),
        AluOp::Sub => sub(a, b),
        AluOp::UnsignedMul => {
            let wide = u64::from(a) * u64::from(b);
            let value = wide as u32;
            let spilled = wide > u64::from(u32::MAX);
            AluOutcome::left(
                value,
                result_flags(value)
                    .with_carry(spilled)
                    .with_overflow(spilled),
            )
        }
        AluOp::SignedMul => {
            let wide = i64::from(a as i32) * i64::from(b as i32);
            let value = wide as u32;
            let spilled = i32::try_from(wide).is_err();
            AluOutcome::left(
                value,
                result_flags(value)
                    .with_carry(spilled)
                    .with_overflow(spilled),
            )
        }
        AluOp::UnsignedDiv => {
            if b == 0 {
                return divide_by_zero();
            }
            let quotient = a / b;
            AluOutcome {
                left: quotient,
                right: Some(a % b),
                flags: result_flags(quotient),
            }
        }
        AluOp::SignedDiv => {
            if b == 0 {
                return divide_by_zero();
            }
            let (lhs, rhs) = (a as i32, b as i32);
            let (quotient, overflow) = lhs.overflowing_div(rhs);
            let remainder = lhs.wrapping_rem(rhs);
            AluOutcome {
                left: quotient as u32,
                right: Some(remainder as u32),
                flags: result_flags(quotient as u32).with_overflow(overflow),
            }
        }
        _ => AluOutcome::left(a, ConditionCodes::empty()),
    }
}

fn add(a: u32, b: u32) -> AluOutcome {
    let (value, carry) = a.overflowing_add(b);
    let (_, overflow) = (a as i32).overflowing_add(b as i32);
    AluOutcome::left(
        value,
        result_flags(value).with_carry(carry).with_overflow(overflow),
    )
}

fn sub(a: u32, b: u32) -> AluOutcome {
    let (value, borrow) = a.overflowing_sub(b);
    let (_, overflow) = (a as i32).overflowing_sub(b as i32);
    AluOutcome::left(
        value,
        result_flags(value).with_carry(borrow).with_overflow(overflow),
    )
}

const fn divide_by_zero() -> AluOutcome {
    AluOutcome {
        left: 0,
        right: Some(0),
        flags: ConditionCodes::empty()
            .with_zero(true)
            .with_zero_division(true),
    }
}
