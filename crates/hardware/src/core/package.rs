//! CPU package.
//!
//! A package groups cores that share an identity (reported by CPUID) and one
//! interrupt queue. It provides:
//! 1. **InterruptQueue:** Thread-safe FIFO of interrupt ids raised by `INT`.
//! 2. **PackageLink:** What each core worker receives from its package.
//! 3. **Package:** Power sequencing over its cores.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::cpu::Core;
use crate::common::constants::VENDOR_ID_LEN;
use crate::common::error::{PowerError, SimError};
use crate::common::power::{PowerStatus, StatusCell, agreed_status};
use crate::config::Config;
use crate::soc::interconnect::Bus;
use crate::stats::CoreStats;

/// Interrupt ids shared by the cores of a package.
#[derive(Clone, Debug, Default)]
pub struct InterruptQueue {
    inner: Arc<Mutex<VecDeque<u32>>>,
}

impl InterruptQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u32>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an interrupt id.
    pub fn push(&self, id: u32) {
        self.lock().push_back(id);
    }

    /// Takes the oldest interrupt id.
    pub fn pop(&self) -> Option<u32> {
        self.lock().pop_front()
    }

    /// Number of pending interrupts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no interrupt is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Package data handed to every core worker.
#[derive(Clone, Debug)]
pub struct PackageLink {
    /// Package identity.
    pub package_id: u32,
    /// Number of cores in the package.
    pub cores: u32,
    /// CPUID vendor string.
    pub vendor: [u8; VENDOR_ID_LEN],
    /// Shared interrupt queue.
    pub interrupts: InterruptQueue,
}

/// Packs a vendor name into the fixed CPUID field, space-padded or truncated.
pub fn vendor_id(name: &str) -> [u8; VENDOR_ID_LEN] {
    let mut out = [b' '; VENDOR_ID_LEN];
    for (dst, src) in out.iter_mut().zip(name.bytes()) {
        *dst = src;
    }
    out
}

/// A group of cores sharing an identity and an interrupt queue.
#[derive(Debug)]
pub struct Package {
    id: u32,
    vendor: [u8; VENDOR_ID_LEN],
    cores: Vec<Core>,
    interrupts: InterruptQueue,
    status: StatusCell,
}

impl Package {
    /// Creates a powered-off package with `config.system.cores` cores.
    pub fn new(config: &Config) -> Self {
        let cores = (0..config.system.cores.max(1))
            .map(|i| Core::new(i, config))
            .collect();
        Self {
            id: config.system.package_id,
            vendor: vendor_id(&config.system.vendor),
            cores,
            interrupts: InterruptQueue::new(),
            status: StatusCell::new(),
        }
    }

    /// Package identity.
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Cores in index order.
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Core by index.
    pub fn core(&self, index: usize) -> Option<&Core> {
        self.cores.get(index)
    }

    /// The shared interrupt queue.
    pub const fn interrupts(&self) -> &InterruptQueue {
        &self.interrupts
    }

    /// Queues an interrupt from outside the cores.
    pub fn raise_interrupt(&self, id: u32) {
        debug!(package = self.id, id, "external interrupt raised");
        self.interrupts.push(id);
    }

    /// Link handed to each core at power-on.
    pub fn link(&self) -> PackageLink {
        PackageLink {
            package_id: self.id,
            cores: self.cores.len() as u32,
            vendor: self.vendor,
            interrupts: self.interrupts.clone(),
        }
    }

    /// Status every core agrees on.
    ///
    /// # Panics
    ///
    /// Panics when cores disagree, e.g. one halted while another still runs.
    pub fn status(&self) -> PowerStatus {
        agreed_status(
            &format!("package {}", self.id),
            self.cores.iter().map(Core::status),
        )
    }

    /// Powers on every core. If one fails, the cores already started are powered off.
    pub fn power_on(&self, bus: &Arc<Bus>) -> Result<(), SimError> {
        self.status
            .transition(PowerStatus::Off, PowerStatus::Starting)
            .map_err(|from| PowerError::IllegalTransition {
                component: format!("package {}", self.id),
                from,
                expected: PowerStatus::Off,
            })?;

        for (i, core) in self.cores.iter().enumerate() {
            if let Err(e) = core.power_on(bus, self.link()) {
                for started in &self.cores[..i] {
                    let _ = started.power_off();
                }
                self.status.set(PowerStatus::Off);
                return Err(e);
            }
        }
        self.status.set(PowerStatus::On);
        info!(package = self.id, cores = self.cores.len(), "package powered on");
        Ok(())
    }

    /// Powers off running cores and reaps halted ones.
    ///
    /// Every core is handled even if one fails; the first error is returned.
    pub fn power_off(&self) -> Result<(), SimError> {
        self.status
            .transition(PowerStatus::On, PowerStatus::Stopping)
            .map_err(|from| PowerError::IllegalTransition {
                component: format!("package {}", self.id),
                from,
                expected: PowerStatus::On,
            })?;

        let mut first_error = None;
        for core in &self.cores {
            // Only an OFF core without a worker stays put; a HALT racing this call is
            // joined by `Core::power_off`.
            let result = if core.status() == PowerStatus::Off && !core.has_worker() {
                Ok(())
            } else {
                core.power_off()
            };
            if let Err(e) = result {
                let _ = first_error.get_or_insert(e);
            }
        }
        self.status.set(PowerStatus::Off);
        info!(package = self.id, "package powered off");
        first_error.map_or(Ok(()), Err)
    }

    /// Blocks until every core stopped on its own (HALT or a fatal error).
    ///
    /// Every core is joined; the first error is returned.
    pub fn wait(&self) -> Result<(), SimError> {
        let mut first_error = None;
        for core in &self.cores {
            if let Err(e) = core.wait() {
                let _ = first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Sum of the statistics saved by every core.
    pub fn stats(&self) -> CoreStats {
        let mut total = CoreStats::default();
        for core in &self.cores {
            total += core.stats();
        }
        total
    }
}
