//! Memory devices (RAM and ROM).
//!
//! This module implements the latency-modelled memory device. It provides:
//! 1. **Buffer:** Backing storage for device contents.
//! 2. **Task:** One cooperative task per admitted request.
//! 3. **Scheduler:** The bounded concurrent task model driven once per device cycle.
//! 4. **Memory:** The `Device` front end that owns the worker thread.
//!
//! While powered on, the buffer lives inside the worker thread and comes back when the
//! worker is joined, so contents survive power cycles.

/// Fixed-size backing store.
pub mod buffer;

/// Request admission and stepping.
pub mod scheduler;

/// Per-request tasks.
pub mod task;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use self::buffer::MemoryBuffer;
use self::scheduler::{RequestQueue, RequestScheduler};
use self::task::Access;
use crate::common::addr::{Address, AddressRange};
use crate::common::clock::Clock;
use crate::common::error::DeviceError;
use crate::common::power::{PowerStatus, StatusCell};
use crate::config::{DeviceConfig, RomConfig};
use crate::soc::message::IoMessage;
use crate::soc::traits::Device;

/// Flavour of a memory device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    /// Read-write memory mapped into the contiguous RAM region.
    Ram,
    /// Read-only firmware at a fixed base.
    Rom,
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<MemoryBuffer>,
}

/// Mutable part of the device, guarded by one lock taken only by lifecycle and
/// host-access calls.
struct DeviceState {
    range: Option<AddressRange>,
    buffer: Option<MemoryBuffer>,
    worker: Option<Worker>,
}

/// A RAM or ROM device with its own worker thread.
pub struct Memory {
    name: String,
    kind: MemoryKind,
    config: DeviceConfig,
    base: Option<Address>,
    status: StatusCell,
    requests: RequestQueue,
    state: Mutex<DeviceState>,
}

impl Memory {
    fn with_kind(
        name: impl Into<String>,
        kind: MemoryKind,
        config: DeviceConfig,
        base: Option<Address>,
    ) -> Self {
        let size = usize::try_from(config.size).unwrap_or(usize::MAX);
        Self {
            name: name.into(),
            kind,
            config,
            base,
            status: StatusCell::new(),
            requests: RequestQueue::new(),
            state: Mutex::new(DeviceState {
                range: None,
                buffer: Some(MemoryBuffer::new(size)),
                worker: None,
            }),
        }
    }

    /// Creates a powered-off RAM device.
    ///
    /// # Arguments
    ///
    /// * `name` - Device name for logs and errors.
    /// * `config` - Size, latencies, concurrency bound and clock.
    pub fn ram(name: impl Into<String>, config: DeviceConfig) -> Self {
        Self::with_kind(name, MemoryKind::Ram, config, None)
    }

    /// Creates a powered-off ROM device pinned at `config.base`.
    pub fn rom(name: impl Into<String>, config: &RomConfig) -> Self {
        Self::with_kind(
            name,
            MemoryKind::Rom,
            config.device(),
            Some(Address::new(config.base)),
        )
    }

    /// RAM or ROM.
    pub const fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Timing configuration.
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    const fn access(&self) -> Access {
        match self.kind {
            MemoryKind::Ram => Access::ReadWrite,
            MemoryKind::Rom => Access::ReadOnly,
        }
    }

    fn require_off(&self) -> Result<(), DeviceError> {
        match self.status.get() {
            PowerStatus::Off => Ok(()),
            _ => Err(DeviceError::PoweredOn(self.name.clone())),
        }
    }

    fn out_of_range(&self, offset: u64, len: usize) -> DeviceError {
        DeviceError::OutOfRange {
            name: self.name.clone(),
            offset,
            len,
            capacity: self.config.size,
        }
    }
}

fn run_worker(
    mut scheduler: RequestScheduler,
    clock: Clock,
    stop: &AtomicBool,
) -> MemoryBuffer {
    loop {
        let _ = scheduler.tick();
        if stop.load(Ordering::Acquire) && scheduler.is_done() {
            break;
        }
        clock.wait_cycle();
    }
    scheduler.into_buffer()
}

impl Device for Memory {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.config.size
    }

    fn pinned_base(&self) -> Option<Address> {
        self.base
    }

    fn status(&self) -> PowerStatus {
        self.status.get()
    }

    fn address_range(&self) -> Option<AddressRange> {
        self.lock().range
    }

    fn power_on(&self, range: AddressRange) -> Result<(), DeviceError> {
        let mut state = self.lock();
        self.status
            .transition(PowerStatus::Off, PowerStatus::Starting)
            .map_err(|from| DeviceError::IllegalTransition {
                name: self.name.clone(),
                from,
                expected: PowerStatus::Off,
            })?;

        let size = usize::try_from(self.config.size).unwrap_or(usize::MAX);
        let buffer = state
            .buffer
            .take()
            .unwrap_or_else(|| MemoryBuffer::new(size));
        let scheduler = RequestScheduler::new(
            self.name.clone(),
            range,
            &self.config,
            self.access(),
            buffer,
            self.requests.clone(),
        );
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let clock = Clock::new(self.config.frequency_hz);

        let handle = thread::Builder::new()
            .name(format!("{}-worker", self.name))
            .spawn(move || run_worker(scheduler, clock, &worker_stop))
            .map_err(|e| {
                self.status.set(PowerStatus::Off);
                DeviceError::WorkerSpawn {
                    name: self.name.clone(),
                    reason: e.to_string(),
                }
            })?;

        state.range = Some(range);
        state.worker = Some(Worker { stop, handle });
        self.status.set(PowerStatus::On);
        info!(device = %self.name, %range, "device powered on");
        Ok(())
    }

    fn power_off(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        self.status
            .transition(PowerStatus::On, PowerStatus::Stopping)
            .map_err(|from| DeviceError::IllegalTransition {
                name: self.name.clone(),
                from,
                expected: PowerStatus::On,
            })?;

        let mut result = Ok(());
        if let Some(worker) = state.worker.take() {
            worker.stop.store(true, Ordering::Release);
            match worker.handle.join() {
                Ok(buffer) => state.buffer = Some(buffer),
                Err(_) => {
                    error!(device = %self.name, "device worker panicked; contents lost");
                    result = Err(DeviceError::WorkerPanicked(self.name.clone()));
                }
            }
        }

        state.range = None;
        self.status.set(PowerStatus::Off);
        info!(device = %self.name, "device powered off");
        result
    }

    fn push_io_message(&self, message: IoMessage) -> Result<(), DeviceError> {
        if self.status.get() != PowerStatus::On {
            return Err(DeviceError::PoweredOff(self.name.clone()));
        }
        let address = message.address();
        // Submit under the state lock so a concurrent power-off drains this request.
        let state = self.lock();
        if !state.range.is_some_and(|r| r.contains(address)) {
            return Err(DeviceError::Unmapped {
                name: self.name.clone(),
                address,
            });
        }
        self.requests.submit(message);
        drop(state);
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.requests.is_idle()
    }

    fn load(&self, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        self.require_off()?;
        let mut state = self.lock();
        let fits = state
            .buffer
            .as_mut()
            .is_some_and(|buffer| buffer.write_slice(offset, data));
        if fits {
            Ok(())
        } else {
            Err(self.out_of_range(offset, data.len()))
        }
    }

    fn peek(&self, offset: u64, len: usize) -> Result<Vec<u8>, DeviceError> {
        self.require_off()?;
        let state = self.lock();
        state
            .buffer
            .as_ref()
            .and_then(|b| b.slice(offset, len))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| self.out_of_range(offset, len))
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.config.size)
            .field("status", &self.status.get())
            .finish_non_exhaustive()
    }
}
