//! Execution units.
//!
//! The micro-op engine has a single functional unit, the ALU. Memory access goes
//! through the bus directly; no cache sits in the access path.

/// Arithmetic Logic Unit for integer and float operations.
pub mod alu;
