//! Micro-operation pipeline.
//!
//! This module contains the per-core execution engine. It includes the following components:
//! 1. **MicroOp:** Resumable micro-operations and the jump condition table.
//! 2. **Decode:** The execution-time dispatch table from instruction words to micro-ops.
//! 3. **Pipeline:** The FIFO of queued micro-ops plus the one currently in progress.
//! 4. **ExecutionContext:** What a micro-op may touch while it steps.
//!
//! At most one micro-op is in progress. Each step pops the next one when the slot is
//! empty and advances it once; micro-ops queue follow-ups onto the same FIFO.

/// Instruction dispatch.
pub mod decode;

/// Micro-operation state machines.
pub mod microop;

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use self::microop::MicroOp;
use crate::common::clock::Step;
use crate::common::error::CoreError;
use crate::common::power::StatusCell;
use crate::core::cpu::CoreState;
use crate::core::package::PackageLink;
use crate::core::units::alu::Alu;
use crate::isa::registers::RegisterId;
use crate::soc::interconnect::Bus;

/// Read-only surroundings of a running core.
#[derive(Debug)]
pub struct CoreEnv {
    /// Core index within the package.
    pub core_id: u32,
    /// Bus for memory micro-ops.
    pub bus: Arc<Bus>,
    /// ALU latency table.
    pub alu: Alu,
    /// Package identity and interrupt queue.
    pub link: PackageLink,
    /// Core power status, published as STOPPING by HALT.
    pub status: StatusCell,
}

/// Everything a micro-op may read or change during one step.
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    /// Architectural state of the core.
    pub state: &'a mut CoreState,
    /// Pending micro-ops; new ones go to the back.
    pub queue: &'a mut VecDeque<MicroOp>,
    /// Shared surroundings.
    pub env: &'a CoreEnv,
}

impl ExecutionContext<'_> {
    /// Reads a register, enforcing privilege gates.
    pub fn read(&self, id: RegisterId) -> Result<u32, CoreError> {
        self.state.regs.read_checked(id, self.state.privilege)
    }

    /// Writes a register, enforcing privilege gates.
    pub fn write(&mut self, id: RegisterId, value: u32) -> Result<(), CoreError> {
        self.state.regs.write_checked(id, self.state.privilege, value)
    }
}

/// Result of one pipeline step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    /// A micro-op was advanced.
    Busy,
    /// Nothing was queued.
    Idle,
}

/// FIFO of micro-operations with one in-progress slot.
#[derive(Debug, Default)]
pub struct Pipeline {
    queue: VecDeque<MicroOp>,
    current: Option<MicroOp>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a micro-op.
    pub fn push(&mut self, op: MicroOp) {
        self.queue.push_back(op);
    }

    /// Appends several micro-ops in order.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = MicroOp>) {
        self.queue.extend(ops);
    }

    /// Queued micro-ops, excluding the one in progress.
    pub fn queued(&self) -> impl ExactSizeIterator<Item = &MicroOp> {
        self.queue.iter()
    }

    /// Number of queued micro-ops, excluding the one in progress.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when nothing is queued or in progress.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }

    /// The micro-op in progress.
    pub const fn current(&self) -> Option<&MicroOp> {
        self.current.as_ref()
    }

    /// Discards every queued and in-progress micro-op.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    /// Advances the pipeline by one cycle.
    ///
    /// # Arguments
    ///
    /// * `state` - Architectural state of the core.
    /// * `env`   - Bus, ALU and package surroundings.
    ///
    /// # Returns
    ///
    /// `Idle` if there was nothing to run. A micro-op error is fatal to the core; the
    /// failed micro-op is dropped.
    pub fn step(
        &mut self,
        state: &mut CoreState,
        env: &CoreEnv,
    ) -> Result<PipelineStatus, CoreError> {
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }
        let Some(mut op) = self.current.take() else {
            return Ok(PipelineStatus::Idle);
        };

        let mut ctx = ExecutionContext {
            state,
            queue: &mut self.queue,
            env,
        };
        match op.step(&mut ctx)? {
            Step::Pending => self.current = Some(op),
            Step::Done => {
                ctx.state.stats.micro_ops_retired += 1;
                trace!(core = env.core_id, op = %op, "micro-op retired");
            }
        }
        Ok(PipelineStatus::Busy)
    }
}
