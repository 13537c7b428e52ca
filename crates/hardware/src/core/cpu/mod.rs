//! CPU core definition and power lifecycle.
//!
//! This module defines the `Core`, the unit that executes instructions. It coordinates
//! the following:
//! 1. **State Management:** The register file, privilege mode and statistics (`CoreState`).
//! 2. **Power Lifecycle:** OFF, STARTING, ON, STOPPING, driven by `power_on`, `power_off`
//!    and HALT.
//! 3. **Worker Thread:** One thread per powered core runs the micro-op pipeline against
//!    the shared bus.
//!
//! While the core is on, its state lives in the worker. It comes back when the worker
//! is joined, so register values can be inspected once the core is off.

/// Worker thread body.
mod execution;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use self::execution::WorkerExit;
use crate::common::clock::Clock;
use crate::common::error::{CoreError, PowerError, SimError};
use crate::common::power::{PowerStatus, StatusCell};
use crate::common::reg::{PrivilegeMode, RegisterFile};
use crate::config::Config;
use crate::core::package::PackageLink;
use crate::core::pipeline::CoreEnv;
use crate::core::units::alu::Alu;
use crate::isa::registers::RegisterId;
use crate::soc::interconnect::Bus;
use crate::stats::CoreStats;

/// Architectural state owned by the core worker.
#[derive(Clone, Debug, Default)]
pub struct CoreState {
    /// Register file.
    pub regs: RegisterFile,
    /// Current privilege level.
    pub privilege: PrivilegeMode,
    /// Set while an interrupt handler runs; blocks nested delivery.
    pub in_interrupt: bool,
    /// Set by HALT; the worker exits at the top of its next iteration.
    pub halt_requested: bool,
    /// Counters since power-on.
    pub stats: CoreStats,
}

impl CoreState {
    /// Power-on state: registers reset, `IP` at `entry`, stack and frame pointers at
    /// `stack_top`.
    pub fn boot(entry: u32, stack_top: u32, privilege: PrivilegeMode) -> Self {
        let mut regs = RegisterFile::new();
        regs.write(RegisterId::Ip, entry);
        regs.write(RegisterId::Stp, stack_top);
        regs.write(RegisterId::Fbp, stack_top);
        Self {
            regs,
            privilege,
            ..Self::default()
        }
    }
}

/// A CPU core executing on its own worker thread.
pub struct Core {
    id: usize,
    clock: Clock,
    alu: Alu,
    entry_point: u32,
    start_privilege: PrivilegeMode,
    status: StatusCell,
    stop: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<WorkerExit>>>,
    state: Mutex<CoreState>,
}

impl Core {
    /// Creates a powered-off core.
    ///
    /// # Arguments
    ///
    /// * `id` - Index within the package, reported by CPUID.
    /// * `config` - Entry point, privilege, clock and ALU latencies.
    pub fn new(id: usize, config: &Config) -> Self {
        Self {
            id,
            clock: Clock::new(config.system.core_frequency_hz),
            alu: Alu::new(config.alu),
            entry_point: config.general.entry_point,
            start_privilege: config.general.start_privilege,
            status: StatusCell::new(),
            stop: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            state: Mutex::new(CoreState::default()),
        }
    }

    /// Index within the package.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Current power status.
    pub fn status(&self) -> PowerStatus {
        self.status.get()
    }

    fn component(&self) -> String {
        format!("core {}", self.id)
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<JoinHandle<WorkerExit>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn saved_state(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins `worker`, stores the returned state and yields the worker's result.
    fn join(&self, worker: JoinHandle<WorkerExit>) -> Result<(), CoreError> {
        match worker.join() {
            Ok((state, result)) => {
                *self.saved_state() = state;
                result
            }
            Err(_) => {
                self.status.set(PowerStatus::Off);
                Err(CoreError::WorkerPanicked(self.id))
            }
        }
    }

    /// Resets the core and starts its worker.
    ///
    /// # Arguments
    ///
    /// * `bus` - Powered bus; its RAM end becomes the initial stack pointer.
    /// * `link` - Package identity and shared interrupt queue.
    ///
    /// # Returns
    ///
    /// `PowerError` unless the core is OFF. A previous worker that stopped on its own
    /// (HALT or a fatal error) is reaped first; its error is logged and discarded.
    pub fn power_on(&self, bus: &Arc<Bus>, link: PackageLink) -> Result<(), SimError> {
        let mut slot = self.worker_slot();
        self.status
            .transition(PowerStatus::Off, PowerStatus::Starting)
            .map_err(|from| PowerError::IllegalTransition {
                component: self.component(),
                from,
                expected: PowerStatus::Off,
            })?;

        if let Some(stale) = slot.take() {
            if let Err(e) = self.join(stale) {
                warn!(core = self.id, error = %e, "discarding error of previous run");
            }
        }

        let stack_top = match bus.ram_end() {
            Ok(end) => end.val() as u32,
            Err(e) => {
                self.status.set(PowerStatus::Off);
                return Err(e.into());
            }
        };
        let state = CoreState::boot(self.entry_point, stack_top, self.start_privilege);
        let env = CoreEnv {
            core_id: self.id as u32,
            bus: Arc::clone(bus),
            alu: self.alu,
            link,
            status: self.status.clone(),
        };
        self.stop.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop);
        let clock = self.clock;

        // ON is published before the worker runs so a fast HALT cannot be overwritten.
        self.status.set(PowerStatus::On);
        let handle = thread::Builder::new()
            .name(format!("core-{}", self.id))
            .spawn(move || execution::run(state, &env, &stop, clock))
            .map_err(|e| {
                self.status.set(PowerStatus::Off);
                CoreError::WorkerSpawn {
                    id: self.id,
                    reason: e.to_string(),
                }
            })?;

        *slot = Some(handle);
        info!(core = self.id, entry = self.entry_point, stack_top, "core powered on");
        Ok(())
    }

    /// Stops a running core, discarding its in-flight micro-ops, and joins the worker.
    ///
    /// A worker that already stopped itself (HALT, possibly still in progress, or a
    /// fatal error) is joined the same way instead.
    ///
    /// # Returns
    ///
    /// The error that stopped the worker, if any. `PowerError` when the core is
    /// neither ON nor holding an unjoined worker.
    pub fn power_off(&self) -> Result<(), SimError> {
        let mut slot = self.worker_slot();
        if let Err(from) = self
            .status
            .transition(PowerStatus::On, PowerStatus::Stopping)
        {
            let Some(worker) = slot.take() else {
                return Err(PowerError::IllegalTransition {
                    component: self.component(),
                    from,
                    expected: PowerStatus::On,
                }
                .into());
            };
            debug!(core = self.id, %from, "worker stopped itself; joining");
            let result = self.join(worker);
            self.status.set(PowerStatus::Off);
            info!(core = self.id, "core powered off");
            return result.map_err(SimError::from);
        }

        self.stop.store(true, Ordering::Release);
        let result = slot.take().map_or(Ok(()), |worker| self.join(worker));
        self.status.set(PowerStatus::Off);
        info!(core = self.id, "core powered off");
        result.map_err(SimError::from)
    }

    /// Blocks until the worker exits on its own (HALT or a fatal error) and joins it.
    ///
    /// # Returns
    ///
    /// The error that stopped the worker, if any. Returns immediately when no worker
    /// is attached.
    pub fn wait(&self) -> Result<(), SimError> {
        let worker = self.worker_slot().take();
        match worker {
            Some(worker) => self.join(worker).map_err(SimError::from),
            None => Ok(()),
        }
    }

    /// Returns `true` when a worker is attached and has not been joined.
    pub fn has_worker(&self) -> bool {
        self.worker_slot().is_some()
    }

    /// Register value saved when the worker was last joined.
    ///
    /// Returns `None` while a worker is attached.
    pub fn register(&self, id: RegisterId) -> Option<u32> {
        if self.has_worker() {
            return None;
        }
        Some(self.saved_state().regs.read(id))
    }

    /// Statistics saved when the worker was last joined.
    pub fn stats(&self) -> CoreStats {
        self.saved_state().stats
    }

    /// Copy of the state saved when the worker was last joined.
    pub fn snapshot(&self) -> CoreState {
        self.saved_state().clone()
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("id", &self.id)
            .field("status", &self.status.get())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
