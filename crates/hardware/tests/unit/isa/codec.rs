//! # Instruction Codec Tests
//!
//! Bit layout of the 32-bit instruction word and its big-endian byte form.

use microsim_core::common::error::CodecError;
use microsim_core::isa::instruction::{
    InstructionWord, decode_word, float_immediate, int_immediate,
};
use microsim_core::isa::{Opcode, RegisterId};
use proptest::prelude::*;

/// Verifies the field positions with a hand-assembled word.
#[test]
fn test_field_layout() {
    let word = InstructionWord::of(Opcode::MovRegReg)
        .with_first(RegisterId::Rd0)
        .with_second(RegisterId::Rd1);
    // opcode 0x0010, second = 2 at bit 16, first = 1 at bit 22
    assert_eq!(word.encode(), 0x0010 | (2 << 16) | (1 << 22));
    assert_eq!(word.size_bytes(), 4);
}

/// Verifies that the size flag is the top bit and doubles the encoded length.
#[test]
fn test_size_flag() {
    let word = InstructionWord::of(Opcode::MovRegCon)
        .with_first(RegisterId::Rd0)
        .with_immediate();
    assert_eq!(word.encode() & 0x8000_0000, 0x8000_0000);
    assert_eq!(word.size_bytes(), 8);
    assert_eq!(word.to_bytes()[0] & 0x80, 0x80);
}

/// Verifies big-endian byte order on the wire.
#[test]
fn test_big_endian_bytes() {
    let word = InstructionWord::of(Opcode::Halt);
    assert_eq!(word.to_bytes(), [0x00, 0x00, 0x00, 0x01]);
    assert_eq!(
        InstructionWord::from_bytes(&[0x00, 0x00, 0x00, 0x01]).unwrap(),
        word
    );
}

/// Verifies the length check of the byte decoder.
#[test]
fn test_decode_word_rejects_wrong_length() {
    assert_eq!(decode_word(&[1, 2, 3]), Err(CodecError::InvalidLength(3)));
    assert_eq!(
        InstructionWord::from_bytes(&[0; 5]),
        Err(CodecError::InvalidLength(5))
    );
    assert_eq!(decode_word(&[0xDE, 0xAD, 0xBE, 0xEF]), Ok(0xDEAD_BEEF));
}

/// Verifies the immediate encoders.
#[test]
fn test_immediates() {
    assert_eq!(int_immediate(-1), [0xFF; 4]);
    assert_eq!(int_immediate(0x0102_0304), [1, 2, 3, 4]);
    assert_eq!(float_immediate(1.0), [0x3F, 0x80, 0x00, 0x00]);
}

/// Verifies that unknown opcode values decode but do not resolve.
#[test]
fn test_unknown_opcode_value() {
    let word = InstructionWord::decode(0x0000_FFFF);
    assert_eq!(word.opcode, 0xFFFF);
    assert_eq!(word.opcode(), None);
}

/// Verifies that every catalogued opcode resolves to itself and is unique.
#[test]
fn test_catalogue_is_consistent() {
    for (i, op) in Opcode::ALL.iter().enumerate() {
        assert_eq!(Opcode::from_u16(op.value()), Some(*op));
        assert!(
            Opcode::ALL[i + 1..].iter().all(|other| other.value() != op.value()),
            "{op} is catalogued twice"
        );
    }
}

/// Verifies that exactly the eight IN/OUT opcodes are reserved.
#[test]
fn test_port_io_family() {
    let reserved: Vec<Opcode> = Opcode::ALL
        .iter()
        .copied()
        .filter(|op| op.is_port_io())
        .collect();
    assert_eq!(reserved.len(), 8);
    assert!(!Opcode::Int.is_port_io());
}

fn any_opcode() -> impl Strategy<Value = Opcode> {
    proptest::sample::select(Opcode::ALL.to_vec())
}

proptest! {
    /// Decoding an encoded word yields the same fields.
    #[test]
    fn prop_encode_decode_identity(
        opcode in any_opcode(),
        first in 0u8..64,
        second in 0u8..64,
        wide in any::<bool>(),
    ) {
        let word = InstructionWord {
            opcode: opcode.value(),
            first,
            second,
            wide,
        };
        let decoded = InstructionWord::decode(word.encode());
        prop_assert_eq!(decoded, word);
        prop_assert_eq!(InstructionWord::from_bytes(&word.to_bytes()).unwrap(), word);
        prop_assert_eq!(decoded.opcode(), Some(opcode));
    }

    /// Bits 28..31 are not part of any field.
    #[test]
    fn prop_unused_bits_ignored(raw in any::<u32>()) {
        let word = InstructionWord::decode(raw);
        prop_assert_eq!(word.encode(), raw & !0x7000_0000);
    }
}
