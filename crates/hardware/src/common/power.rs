//! Power lifecycle shared by cores, devices, the bus, packages and the motherboard.
//!
//! Every component moves through `Off -> Starting -> On -> Stopping -> Off`. Composites
//! have no status of their own: they report the status their children agree on.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Power state of a component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum PowerStatus {
    /// Not running; configuration and host access allowed.
    #[default]
    Off = 0,
    /// Power-on in progress.
    Starting = 1,
    /// Running.
    On = 2,
    /// Power-off requested, worker still draining or exiting.
    Stopping = 3,
}

impl PowerStatus {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Starting,
            2 => Self::On,
            3 => Self::Stopping,
            _ => Self::Off,
        }
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "OFF",
            Self::Starting => "STARTING",
            Self::On => "ON",
            Self::Stopping => "STOPPING",
        };
        f.write_str(s)
    }
}

/// Power status readable from any thread.
///
/// Clones share the same cell, so a worker thread can publish `Off` on exit while the
/// owner observes it.
#[derive(Clone, Debug, Default)]
pub struct StatusCell(Arc<AtomicU8>);

impl StatusCell {
    /// Creates a cell holding `Off`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the current status.
    pub fn get(&self) -> PowerStatus {
        PowerStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Publishes a new status.
    pub fn set(&self, status: PowerStatus) {
        self.0.store(status as u8, Ordering::Release);
    }

    /// Moves from `from` to `to` atomically.
    ///
    /// Returns the observed status on failure.
    pub fn transition(&self, from: PowerStatus, to: PowerStatus) -> Result<(), PowerStatus> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(PowerStatus::from_u8)
    }
}

/// Returns the status every child reports.
///
/// # Panics
///
/// Panics when children disagree; a composite's status is undefined in that case and
/// reaching it means the power sequence was wired incorrectly. Panics on an empty set.
pub fn agreed_status<I>(component: &str, statuses: I) -> PowerStatus
where
    I: IntoIterator<Item = PowerStatus>,
{
    let mut iter = statuses.into_iter();
    let Some(first) = iter.next() else {
        panic!("{component}: power status of an empty composite is undefined");
    };
    for status in iter {
        assert_eq!(
            status, first,
            "{component}: children disagree on power status ({first} vs {status})"
        );
    }
    first
}
