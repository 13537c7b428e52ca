//! Per-component clock.
//!
//! Cores and devices each own a `Clock` and call `wait_cycle` once per emulated cycle.
//! A frequency of zero runs unthrottled: the worker yields instead of sleeping.
//!
//! Work done inside one cycle is a cooperative step that reports [`Step`].

use std::thread;
use std::time::Duration;

/// Outcome of advancing a cooperative state machine by one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// More steps are needed.
    Pending,
    /// The work finished during this step.
    Done,
}

impl Step {
    /// Returns `true` for [`Step::Done`].
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Converts a frequency into the wait between two emulated cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    frequency_hz: u64,
}

impl Clock {
    /// Creates a clock ticking at `frequency_hz`; zero means unthrottled.
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Creates a clock that never sleeps.
    pub const fn unthrottled() -> Self {
        Self { frequency_hz: 0 }
    }

    /// Returns the duration of one cycle, or `None` when unthrottled.
    pub const fn cycle_duration(&self) -> Option<Duration> {
        if self.frequency_hz == 0 {
            None
        } else {
            Some(Duration::from_nanos(1_000_000_000 / self.frequency_hz))
        }
    }

    /// Blocks the calling worker for one cycle.
    pub fn wait_cycle(&self) {
        match self.cycle_duration() {
            Some(d) if !d.is_zero() => thread::sleep(d),
            _ => thread::yield_now(),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::unthrottled()
    }
}
