//! Core processor implementation.
//!
//! This module contains the CPU side of the machine: the cores with their micro-op
//! pipeline and ALU, and the package that groups them.

/// CPU core and its worker thread.
pub mod cpu;

/// Core grouping, identity and shared interrupts.
pub mod package;

/// Micro-operation pipeline and instruction dispatch.
pub mod pipeline;

/// Execution units.
pub mod units;

pub use self::cpu::{Core, CoreState};
pub use self::package::{InterruptQueue, Package};
