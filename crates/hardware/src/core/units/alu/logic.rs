//! ALU bitwise logical operations.
//!
//! AND, OR and XOR set zero and sign from the result and always clear carry
//! and overflow.

use super::{AluOp, AluOutcome, result_flags};
use crate::common::reg::ConditionCodes;

/// Executes a bitwise logical operation.
///
/// Non-logic opcodes return `a` unchanged with empty flags.
pub fn execute(op: AluOp, a: u32, b: u32) -> AluOutcome {
    let value = match op {
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        _ => return AluOutcome::left(a, ConditionCodes::empty()),
    };
    AluOutcome::left(value, result_flags(value))
}
