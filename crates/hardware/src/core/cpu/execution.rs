//! Core worker loop.
//!
//! This module implements the body of a core's worker thread. Each iteration it:
//! 1. **Checks for shutdown:** Exits when power-off was requested or HALT ran.
//! 2. **Advances the pipeline:** Steps the in-progress micro-op once.
//! 3. **Waits:** Sleeps (or yields) for one core clock cycle.
//!
//! The worker owns the architectural state and returns it when it exits, together
//! with the error that stopped it, if any.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error};

use super::CoreState;
use crate::common::clock::Clock;
use crate::common::error::CoreError;
use crate::common::power::PowerStatus;
use crate::core::pipeline::microop::fetch_next;
use crate::core::pipeline::{CoreEnv, Pipeline};

/// What a worker hands back when joined.
pub(super) type WorkerExit = (CoreState, Result<(), CoreError>);

/// Runs the fetch-decode-execute loop until stopped.
///
/// A power-off request leaves the status to the caller, which publishes OFF after
/// joining. HALT and fatal errors publish OFF here, since nobody may be joining.
pub(super) fn run(
    mut state: CoreState,
    env: &CoreEnv,
    stop: &AtomicBool,
    clock: Clock,
) -> WorkerExit {
    let mut pipeline = Pipeline::new();
    pipeline.extend(fetch_next());

    let result = loop {
        if stop.load(Ordering::Acquire) {
            debug!(core = env.core_id, "power-off observed");
            break Ok(());
        }
        if state.halt_requested {
            debug!(core = env.core_id, "halted");
            env.status.set(PowerStatus::Off);
            break Ok(());
        }

        state.stats.cycles += 1;
        if let Err(e) = pipeline.step(&mut state, env) {
            error!(core = env.core_id, error = %e, "core stopped on fatal error");
            env.status.set(PowerStatus::Off);
            break Err(e);
        }
        clock.wait_cycle();
    };

    pipeline.clear();
    state.regs.dump();
    (state, result)
}
