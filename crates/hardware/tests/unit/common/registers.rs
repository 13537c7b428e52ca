//! # Register File Tests
//!
//! Register views, condition-code accessors and the kernel-mode gates.

use microsim_core::common::error::CoreError;
use microsim_core::common::reg::{
    ConditionCodes, PrivilegeMode, Register, RegisterAccess, RegisterFile,
};
use microsim_core::isa::RegisterId;
use rstest::rstest;

/// Verifies that one cell reads back as unsigned, signed, float and big-endian bytes.
#[test]
fn test_register_views() {
    let mut reg = Register::new(RegisterAccess::OPEN);
    reg.set_i32(-2);
    assert_eq!(reg.as_u32(), 0xFFFF_FFFE);
    assert_eq!(reg.as_i32(), -2);
    assert_eq!(reg.to_bytes(), [0xFF, 0xFF, 0xFF, 0xFE]);

    reg.set_f32(1.5);
    assert_eq!(reg.as_u32(), 0x3FC0_0000);
    assert_eq!(reg.as_f32(), 1.5);

    reg.set_bytes([0x12, 0x34, 0x56, 0x78]);
    assert_eq!(reg.as_u32(), 0x1234_5678);
    assert!(reg.bit(3));
    assert!(!reg.bit(0));
}

/// Verifies the named flag accessors against the bit layout.
#[test]
fn test_condition_code_bits() {
    let flags = ConditionCodes::empty()
        .with_zero(true)
        .with_overflow(true)
        .with_zero_division(true);
    assert_eq!(
        flags.bits(),
        ConditionCodes::ZERO | ConditionCodes::OVERFLOW | ConditionCodes::ZERO_DIVISION
    );
    assert!(flags.zero());
    assert!(!flags.carry());
    assert!(!flags.sign());

    let cleared = flags.with_zero(false);
    assert!(!cleared.zero());
    assert!(cleared.overflow());
}

/// Verifies which registers are kernel-gated.
#[rstest]
#[case(RegisterId::Cr0, true)]
#[case(RegisterId::Vatta, true)]
#[case(RegisterId::Idt, true)]
#[case(RegisterId::Tra, true)]
#[case(RegisterId::Tdta, true)]
#[case(RegisterId::Kstp, true)]
#[case(RegisterId::Kfbp, true)]
#[case(RegisterId::Kip, true)]
#[case(RegisterId::Rd0, false)]
#[case(RegisterId::Stp, false)]
#[case(RegisterId::Fbp, false)]
#[case(RegisterId::Ira, false)]
#[case(RegisterId::Ip, false)]
#[case(RegisterId::Ccr, false)]
fn test_kernel_gates(#[case] id: RegisterId, #[case] kernel_only: bool) {
    let mut regs = RegisterFile::new();

    assert!(regs.read_checked(id, PrivilegeMode::Kernel).is_ok());
    assert!(regs.write_checked(id, PrivilegeMode::Kernel, 7).is_ok());

    let read = regs.read_checked(id, PrivilegeMode::User);
    let write = regs.write_checked(id, PrivilegeMode::User, 9);
    if kernel_only {
        assert_eq!(read, Err(CoreError::PrivilegeViolation(id)));
        assert_eq!(write, Err(CoreError::PrivilegeViolation(id)));
        assert_eq!(regs.read(id), 7);
    } else {
        assert_eq!(read, Ok(7));
        assert_eq!(write, Ok(()));
        assert_eq!(regs.read(id), 9);
    }
}

/// Verifies that the instruction pointer and flags carry the no-direct-move marker.
#[test]
fn test_no_direct_move_marker() {
    let regs = RegisterFile::new();
    assert!(regs.get(RegisterId::Ip).access().no_direct_move);
    assert!(regs.get(RegisterId::Ccr).access().no_direct_move);
    assert!(!regs.get(RegisterId::Rd0).access().no_direct_move);
}

/// Verifies that reset zeroes values but keeps the gates.
#[test]
fn test_reset_keeps_gates() {
    let mut regs = RegisterFile::new();
    regs.write(RegisterId::Idt, 0x200);
    regs.write(RegisterId::Rd5, 5);
    regs.reset();

    assert_eq!(regs.read(RegisterId::Idt), 0);
    assert_eq!(regs.read(RegisterId::Rd5), 0);
    assert_eq!(regs.get(RegisterId::Idt).access(), RegisterAccess::KERNEL);
}

/// Verifies that `flags` views the condition-code register.
#[test]
fn test_flags_view() {
    let mut regs = RegisterFile::new();
    regs.write(RegisterId::Ccr, ConditionCodes::SIGN | ConditionCodes::CARRY);
    let flags = regs.flags();
    assert!(flags.sign());
    assert!(flags.carry());
    assert!(!flags.zero());
}
