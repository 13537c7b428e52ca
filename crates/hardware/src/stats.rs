//! Execution statistics.
//!
//! This module tracks per-core counters. It provides:
//! 1. **Cycle and throughput:** Worker cycles, micro-ops retired, instructions decoded.
//! 2. **Memory traffic:** Bytes read and written over the bus.
//! 3. **ALU occupancy:** Cycles spent idling on configured ALU latency.
//! 4. **Interrupts:** Interrupts raised by `INT` and delivered at decode.
//!
//! Counters are plain fields owned by the core worker; a snapshot is returned when the
//! worker is joined. `CoreStats` serialises with `serde` for JSON dumps.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// Counters collected by one core between power-on and power-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreStats {
    /// Worker loop iterations.
    pub cycles: u64,
    /// Micro-operations that ran to completion.
    pub micro_ops_retired: u64,
    /// Instruction words dispatched by `InstructionDecode`.
    pub instructions_decoded: u64,
    /// Bytes loaded over the bus.
    pub bytes_read: u64,
    /// Bytes stored over the bus.
    pub bytes_written: u64,
    /// Cycles ALU operations spent waiting out their latency.
    pub alu_idle_cycles: u64,
    /// Interrupt ids pushed by `INT`.
    pub interrupts_raised: u64,
    /// Interrupts that entered a handler.
    pub interrupts_delivered: u64,
}

impl CoreStats {
    /// Average micro-operations per decoded instruction.
    pub fn micro_ops_per_instruction(&self) -> f64 {
        if self.instructions_decoded == 0 {
            0.0
        } else {
            self.micro_ops_retired as f64 / self.instructions_decoded as f64
        }
    }

    /// Cycles per decoded instruction.
    pub fn cycles_per_instruction(&self) -> f64 {
        if self.instructions_decoded == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_decoded as f64
        }
    }
}

impl AddAssign for CoreStats {
    fn add_assign(&mut self, rhs: Self) {
        self.cycles += rhs.cycles;
        self.micro_ops_retired += rhs.micro_ops_retired;
        self.instructions_decoded += rhs.instructions_decoded;
        self.bytes_read += rhs.bytes_read;
        self.bytes_written += rhs.bytes_written;
        self.alu_idle_cycles += rhs.alu_idle_cycles;
        self.interrupts_raised += rhs.interrupts_raised;
        self.interrupts_delivered += rhs.interrupts_delivered;
    }
}

impl fmt::Display for CoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycles                   {}", self.cycles)?;
        writeln!(f, "instructions_decoded     {}", self.instructions_decoded)?;
        writeln!(f, "micro_ops_retired        {}", self.micro_ops_retired)?;
        writeln!(f, "micro_ops_per_inst       {:.4}", self.micro_ops_per_instruction())?;
        writeln!(f, "cycles_per_inst          {:.4}", self.cycles_per_instruction())?;
        writeln!(f, "bytes_read               {}", self.bytes_read)?;
        writeln!(f, "bytes_written            {}", self.bytes_written)?;
        writeln!(f, "alu_idle_cycles          {}", self.alu_idle_cycles)?;
        writeln!(f, "interrupts_raised        {}", self.interrupts_raised)?;
        write!(f, "interrupts_delivered     {}", self.interrupts_delivered)
    }
}
