//! Micro-operation CPU emulator library.
//!
//! This crate emulates a small 32-bit computer at micro-operation granularity:
//! 1. **Core:** A per-core micro-op pipeline, execution-time dispatch and a flag-computing ALU.
//! 2. **Memory:** RAM and ROM devices with modelled latency and bounded concurrency,
//!    each on its own worker thread.
//! 3. **ISA:** The 32-bit instruction word codec, opcode catalogue and register ID space.
//! 4. **SoC:** The address-routing bus and the motherboard that powers everything on and off.
//! 5. **Configuration:** JSON-deserialisable machine description and per-core statistics.
//!
//! ```no_run
//! use microsim_core::{Config, Motherboard};
//! use microsim_core::common::Address;
//!
//! # fn main() -> Result<(), microsim_core::common::SimError> {
//! let board = Motherboard::new(&Config::default())?;
//! board.load_image(Address::new(0), &[0x00, 0x00, 0x00, 0x01])?; // HALT
//! let stats = board.run()?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

/// Common types (addresses, clock, errors, power states, registers).
pub mod common;
/// Machine configuration (defaults and hierarchical config structures).
pub mod config;
/// CPU side (cores, package, pipeline, ALU).
pub mod core;
/// Instruction set (word codec, opcodes, register IDs).
pub mod isa;
/// Bus, memory devices and motherboard.
pub mod soc;
/// Per-core execution statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// A CPU core.
pub use crate::core::Core;
/// Top-level machine; construct with `Motherboard::new`.
pub use crate::soc::Motherboard;
