//! ALU shift operations.
//!
//! Implements logical shift-left (SHL) and logical shift-right (SHR) on
//! 32-bit operands.
//!
//! Shift amounts are not masked. An amount of 32 or more yields zero with the
//! overflow and zero flags set and carry clear. Valid amounts (0-31) keep
//! overflow clear and report the last bit shifted out in carry.

use super::{AluOp, AluOutcome, result_flags};
use crate::common::reg::ConditionCodes;

/// Width of an operand in bits.
const WORD_BITS: u32 = 32;

/// Executes a shift operation.
///
/// # Arguments
///
/// * `op` - The ALU operation to perform (must be a shift variant).
/// * `a`  - The value to be shifted.
/// * `b`  - The shift amount, used in full.
///
/// # Returns
///
/// The outcome. Non-shift opcodes return `a` unchanged with empty flags.
pub fn execute(op: AluOp, a: u32, b: u32) -> AluOutcome {
    if !matches!(op, AluOp::Shl | AluOp::Shr) {
        return AluOutcome::left(a, ConditionCodes::empty());
    }
    if b >= WORD_BITS {
        return AluOutcome::left(
            0,
            ConditionCodes::empty().with_zero(true).with_overflow(true),
        );
    }
    let (value, carry) = match op {
        AluOp::Shl => (a << b, b > 0 && (a >> (WORD_BITS - b)) & 1 != 0),
        _ => (a >> b, b > 0 && (a >> (b - 1)) & 1 != 0),
    };
    AluOutcome::left(value, result_flags(value).with_carry(carry))
}
