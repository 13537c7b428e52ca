//! # ALU Tests
//!
//! Results and condition codes of every ALU operation, including the guest-visible
//! conditions that must not fault (division by zero, oversized shifts).

use microsim_core::config::AluConfig;
use microsim_core::core::units::alu::{Alu, AluOp};
use proptest::prelude::*;
use rstest::rstest;

/// Verifies the unsigned and signed overflow flags of addition.
#[rstest]
#[case(1, 2, 3, false, false)]
#[case(u32::MAX, 1, 0, true, false)]
#[case(0x7FFF_FFFF, 1, 0x8000_0000, false, true)]
#[case(0x8000_0000, 0x8000_0000, 0, true, true)]
fn test_add_flags(
    #[case] a: u32,
    #[case] b: u32,
    #[case] sum: u32,
    #[case] carry: bool,
    #[case] overflow: bool,
) {
    let out = Alu::compute(AluOp::Add, a, b);
    assert_eq!(out.left, sum);
    assert_eq!(out.right, None);
    assert_eq!(out.flags.carry(), carry);
    assert_eq!(out.flags.overflow(), overflow);
    assert_eq!(out.flags.zero(), sum == 0);
}

/// Verifies that subtraction reports a borrow in carry.
#[test]
fn test_sub_borrow() {
    let out = Alu::compute(AluOp::Sub, 1, 2);
    assert_eq!(out.left, u32::MAX);
    assert!(out.flags.carry());
    assert!(out.flags.sign());
    assert!(!out.flags.overflow());
}

/// Verifies that a product that does not fit sets carry and overflow.
#[rstest]
#[case(AluOp::UnsignedMul, 0x1_0000, 0x1_0000, 0, true)]
#[case(AluOp::UnsignedMul, 0xFFFF, 0xFFFF, 0xFFFE_0001, false)]
#[case(AluOp::SignedMul, (-3_i32) as u32, 4, (-12_i32) as u32, false)]
#[case(AluOp::SignedMul, 0x4000_0000, 2, 0x8000_0000, true)]
fn test_mul_overflow(
    #[case] op: AluOp,
    #[case] a: u32,
    #[case] b: u32,
    #[case] product: u32,
    #[case] spilled: bool,
) {
    let out = Alu::compute(op, a, b);
    assert_eq!(out.left, product);
    assert_eq!(out.flags.carry(), spilled);
    assert_eq!(out.flags.overflow(), spilled);
}

/// Verifies that division by zero zeroes both operands and flags it instead of faulting.
#[rstest]
#[case(AluOp::UnsignedDiv)]
#[case(AluOp::SignedDiv)]
fn test_division_by_zero(#[case] op: AluOp) {
    let out = Alu::compute(op, 10, 0);
    assert_eq!(out.left, 0);
    assert_eq!(out.right, Some(0));
    assert!(out.flags.zero_division());
    assert!(out.flags.zero());
}

/// Verifies quotient and remainder placement.
#[test]
fn test_division_remainder() {
    let out = Alu::compute(AluOp::UnsignedDiv, 17, 5);
    assert_eq!(out.left, 3);
    assert_eq!(out.right, Some(2));
    assert!(!out.flags.zero_division());
}

/// Verifies oversized shift amounts.
#[rstest]
#[case(AluOp::Shl, 32)]
#[case(AluOp::Shl, 255)]
#[case(AluOp::Shr, 32)]
#[case(AluOp::Shr, u32::MAX)]
fn test_oversized_shift(#[case] op: AluOp, #[case] amount: u32) {
    let out = Alu::compute(op, 0xFFFF_FFFF, amount);
    assert_eq!(out.left, 0);
    assert!(out.flags.zero());
    assert!(out.flags.overflow());
    assert!(!out.flags.carry());
}

/// Verifies in-range shifts.
#[rstest]
#[case(AluOp::Shl, 1, 4, 16)]
#[case(AluOp::Shr, 0x8000_0000, 31, 1)]
#[case(AluOp::Shl, 0xABCD, 0, 0xABCD)]
fn test_shift_values(#[case] op: AluOp, #[case] a: u32, #[case] b: u32, #[case] expected: u32) {
    let out = Alu::compute(op, a, b);
    assert_eq!(out.left, expected);
    assert!(!out.flags.overflow());
}

/// Verifies that bitwise logic only reports zero and sign.
#[test]
fn test_logic_flags() {
    let out = Alu::compute(AluOp::Xor, 0xF0F0_F0F0, 0xF0F0_F0F0);
    assert_eq!(out.left, 0);
    assert!(out.flags.zero());

    let out = Alu::compute(AluOp::Or, 0x8000_0000, 1);
    assert_eq!(out.left, 0x8000_0001);
    assert!(out.flags.sign());
    assert!(!out.flags.carry());
    assert!(!out.flags.overflow());

    assert_eq!(Alu::compute(AluOp::And, 0b1100, 0b1010).left, 0b1000);
}

/// Verifies single-precision results and flags.
#[test]
fn test_float_ops() {
    let bits = |v: f32| v.to_bits();

    let out = Alu::compute(AluOp::FAdd, bits(1.5), bits(2.25));
    assert_eq!(f32::from_bits(out.left), 3.75);
    assert_eq!(out.flags.bits(), 0);

    let out = Alu::compute(AluOp::FSub, bits(1.0), bits(3.0));
    assert_eq!(f32::from_bits(out.left), -2.0);
    assert!(out.flags.sign());

    let out = Alu::compute(AluOp::FMul, bits(f32::MAX), bits(2.0));
    assert!(f32::from_bits(out.left).is_infinite());
    assert!(out.flags.overflow());

    let out = Alu::compute(AluOp::FDiv, bits(0.0), bits(0.0));
    assert!(f32::from_bits(out.left).is_nan());
    assert!(out.flags.carry());
    assert!(out.flags.zero_division());
}

/// Verifies the latency lookup per operation class.
#[test]
fn test_latency_table() {
    let alu = Alu::new(AluConfig {
        add: 1,
        mul: 2,
        div: 3,
        logic: 4,
        shift: 5,
        float_add: 6,
        float_mul: 7,
        float_div: 8,
    });
    assert_eq!(alu.latency(AluOp::Add), 1);
    assert_eq!(alu.latency(AluOp::Sub), 1);
    assert_eq!(alu.latency(AluOp::SignedMul), 2);
    assert_eq!(alu.latency(AluOp::UnsignedDiv), 3);
    assert_eq!(alu.latency(AluOp::Xor), 4);
    assert_eq!(alu.latency(AluOp::Shr), 5);
    assert_eq!(alu.latency(AluOp::FSub), 6);
    assert_eq!(alu.latency(AluOp::FMul), 7);
    assert_eq!(alu.latency(AluOp::FDiv), 8);
    assert_eq!(Alu::new(AluConfig::immediate()).latency(AluOp::FDiv), 0);
}

proptest! {
    /// ADD wraps modulo 2^32 and its carry matches unsigned overflow.
    #[test]
    fn prop_add_wraps(a in any::<u32>(), b in any::<u32>()) {
        let out = Alu::compute(AluOp::Add, a, b);
        prop_assert_eq!(out.left, a.wrapping_add(b));
        prop_assert_eq!(out.flags.carry(), a.checked_add(b).is_none());
        prop_assert_eq!(out.flags.overflow(), (a as i32).checked_add(b as i32).is_none());
        prop_assert_eq!(out.flags.zero(), out.left == 0);
        prop_assert_eq!(out.flags.sign(), (out.left as i32) < 0);
    }

    /// SUB wraps modulo 2^32 and its carry is the unsigned borrow.
    #[test]
    fn prop_sub_wraps(a in any::<u32>(), b in any::<u32>()) {
        let out = Alu::compute(AluOp::Sub, a, b);
        prop_assert_eq!(out.left, a.wrapping_sub(b));
        prop_assert_eq!(out.flags.carry(), a < b);
        prop_assert_eq!(out.flags.overflow(), (a as i32).checked_sub(b as i32).is_none());
    }

    /// Division never faults, whatever the operands.
    #[test]
    fn prop_division_is_total(a in any::<u32>(), b in any::<u32>()) {
        for op in [AluOp::UnsignedDiv, AluOp::SignedDiv] {
            let out = Alu::compute(op, a, b);
            prop_assert_eq!(out.flags.zero_division(), b == 0);
            prop_assert!(out.right.is_some());
        }
    }

    /// Unsigned quotient and remainder reconstruct the dividend.
    #[test]
    fn prop_unsigned_division_identity(a in any::<u32>(), b in 1u32..) {
        let out = Alu::compute(AluOp::UnsignedDiv, a, b);
        let remainder = out.right.unwrap();
        prop_assert!(remainder < b);
        prop_assert_eq!(u64::from(out.left) * u64::from(b) + u64::from(remainder), u64::from(a));
    }
}
