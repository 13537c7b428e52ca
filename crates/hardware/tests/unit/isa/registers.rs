//! # Register ID Tests

use microsim_core::common::error::CoreError;
use microsim_core::isa::RegisterId;
use rstest::rstest;

/// Verifies that `0` decodes to "no operand".
#[test]
fn test_zero_is_no_operand() {
    assert_eq!(RegisterId::decode_operand(0), Ok(None));
}

/// Verifies that every architectural ID is addressable by guest code.
#[test]
fn test_architectural_ids_decode() {
    for raw in 1..=29u8 {
        let id = RegisterId::decode_operand(raw).unwrap().unwrap();
        assert_eq!(id.id(), raw);
        assert!(!id.is_internal());
    }
}

/// Verifies that undefined and internal IDs are rejected as operands.
#[rstest]
#[case(30)]
#[case(45)]
#[case(59)]
#[case(60)]
#[case(61)]
#[case(62)]
#[case(63)]
fn test_invalid_operands(#[case] raw: u8) {
    assert_eq!(
        RegisterId::decode_operand(raw),
        Err(CoreError::InvalidRegister(raw))
    );
}

/// Verifies that internal IDs still resolve for micro-op sequences.
#[test]
fn test_internal_ids_resolve() {
    assert_eq!(RegisterId::from_u8(60), Some(RegisterId::Tmp));
    assert_eq!(RegisterId::from_u8(63), Some(RegisterId::Fetch));
    assert!(RegisterId::Imm.is_internal());
}

/// Verifies the data register table and names.
#[test]
fn test_data_registers() {
    assert_eq!(RegisterId::data(0), Some(RegisterId::Rd0));
    assert_eq!(RegisterId::data(15), Some(RegisterId::Rdf));
    assert_eq!(RegisterId::data(16), None);
    assert_eq!(RegisterId::Rda.to_string(), "RDA");
    assert_eq!(RegisterId::Stp.to_string(), "STP");
    assert_eq!(RegisterId::Ip.id(), 24);
}
