//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the register ID space, the opcode catalogue, and the bit-exact codec for
//! 32-bit instruction words.
//!
//! # Word layout
//!
//! * bits `[0, 16)`: opcode
//! * bits `[16, 22)`: second register ID
//! * bits `[22, 28)`: first register ID
//! * bit `31`: size flag (a 32-bit immediate word follows)
//!
//! Words and immediates are big-endian on the wire.

/// Instruction word encoding and decoding.
pub mod instruction;

/// Opcode catalogue.
pub mod opcodes;

/// Register ID space.
pub mod registers;

pub use instruction::InstructionWord;
pub use opcodes::Opcode;
pub use registers::RegisterId;
