//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components outside the cores: the bus messages,
//! the device trait, the latency-modelled memory devices, the bus that routes
//! between them, and the motherboard that assembles the whole machine.

/// System bus interconnect and routing.
pub mod interconnect;

/// Memory devices (RAM and ROM).
pub mod memory;

/// Bus messages and thread-safe queues.
pub mod message;

/// Top-level machine composition.
pub mod motherboard;

/// Device trait definition.
pub mod traits;

pub use interconnect::Bus;
pub use memory::Memory;
pub use message::{IoMessage, IoQueue};
pub use motherboard::Motherboard;
pub use traits::Device;
