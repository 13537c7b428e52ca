//! # ISA Tests

/// Instruction word encoding and decoding.
pub mod codec;

/// Register ID space and operand validation.
pub mod registers;
