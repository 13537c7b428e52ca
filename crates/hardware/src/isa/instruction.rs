//! Instruction word codec.
//!
//! This module converts between the 32-bit machine word and its fields. It provides:
//! 1. **Field Layout:** Masks and shifts for the opcode, both register IDs, and the size flag.
//! 2. **Encoding:** OR-ing fields into an opcode-valued word.
//! 3. **Decoding:** Field extraction from a word or a 4-byte big-endian buffer.
//! 4. **Immediates:** Big-endian conversion of the optional trailing 32-bit word.
//!
//! The codec never interprets the opcode; [`InstructionWord::opcode`] is a lookup the
//! dispatcher uses, and an unknown value is its error to report.

use crate::common::constants::WORD_SIZE;
use crate::common::error::CodecError;
use crate::isa::opcodes::Opcode;
use crate::isa::registers::RegisterId;

/// Bit mask of the opcode field.
pub const OPCODE_MASK: u32 = 0xFFFF;

/// Bit mask of a register ID field (6 bits), before shifting.
pub const REGISTER_MASK: u32 = 0x3F;

/// Bit position of the second register ID field.
pub const SECOND_REGISTER_SHIFT: u32 = 16;

/// Bit position of the first register ID field.
pub const FIRST_REGISTER_SHIFT: u32 = 22;

/// Bit set when a 32-bit immediate word follows.
pub const SIZE_FLAG: u32 = 1 << 31;

/// Fields of one instruction word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstructionWord {
    /// Raw opcode value.
    pub opcode: u16,
    /// First register ID (`0` = none).
    pub first: u8,
    /// Second register ID (`0` = none).
    pub second: u8,
    /// A trailing immediate word follows.
    pub wide: bool,
}

impl InstructionWord {
    /// Starts a word with only the opcode set.
    pub const fn new(opcode: u16) -> Self {
        Self {
            opcode,
            first: 0,
            second: 0,
            wide: false,
        }
    }

    /// Starts a word for a catalogued opcode.
    pub const fn of(opcode: Opcode) -> Self {
        Self::new(opcode.value())
    }

    /// Sets the first register.
    pub const fn with_first(mut self, reg: RegisterId) -> Self {
        self.first = reg.id();
        self
    }

    /// Sets the second register.
    pub const fn with_second(mut self, reg: RegisterId) -> Self {
        self.second = reg.id();
        self
    }

    /// Marks the word as followed by an immediate.
    pub const fn with_immediate(mut self) -> Self {
        self.wide = true;
        self
    }

    /// Packs the fields into a machine word.
    ///
    /// Register IDs wider than six bits are truncated to the field.
    pub const fn encode(self) -> u32 {
        let mut word = self.opcode as u32;
        word |= (self.second as u32 & REGISTER_MASK) << SECOND_REGISTER_SHIFT;
        word |= (self.first as u32 & REGISTER_MASK) << FIRST_REGISTER_SHIFT;
        if self.wide {
            word |= SIZE_FLAG;
        }
        word
    }

    /// Unpacks a machine word.
    pub const fn decode(word: u32) -> Self {
        Self {
            opcode: (word & OPCODE_MASK) as u16,
            first: ((word >> FIRST_REGISTER_SHIFT) & REGISTER_MASK) as u8,
            second: ((word >> SECOND_REGISTER_SHIFT) & REGISTER_MASK) as u8,
            wide: word & SIZE_FLAG != 0,
        }
    }

    /// Unpacks a big-endian 4-byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::decode(decode_word(bytes)?))
    }

    /// Packs the word into big-endian bytes.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.encode().to_be_bytes()
    }

    /// Resolves the opcode against the catalogue.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode)
    }

    /// Total encoded length including a trailing immediate.
    pub const fn size_bytes(&self) -> u32 {
        if self.wide { 2 * WORD_SIZE } else { WORD_SIZE }
    }
}

/// Reads one big-endian 32-bit word.
pub fn decode_word(bytes: &[u8]) -> Result<u32, CodecError> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| CodecError::InvalidLength(bytes.len()))?;
    Ok(u32::from_be_bytes(arr))
}

/// Encodes a two's-complement integer immediate.
pub const fn int_immediate(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Encodes an IEEE-754 binary32 immediate.
pub const fn float_immediate(value: f32) -> [u8; 4] {
    value.to_bits().to_be_bytes()
}
