//! # Builders
//!
//! Fluent APIs for producing test inputs.


pub use instruction::Program;
