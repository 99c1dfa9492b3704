//! Per-agent in-flight flag.
//!
//! A scan fetches candles over the network and can outlast a tick, so it runs
//! detached from the tick that started it. The flag stops the next tick from
//! starting a second scan for the same agent while the first is still
//! running; other agents are unaffected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
        let _held = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.idle.notify_all();
    }

    /// Claim the flag. `None` when a scan is already running.
    pub fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.claim().then(|| InFlightGuard { flag: self })
    }

    /// Claim the flag with a guard that can move into a detached task.
    pub fn try_acquire_owned(self: &Arc<Self>) -> Option<OwnedInFlightGuard> {
        self.claim().then(|| OwnedInFlightGuard {
            flag: Arc::clone(self),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Block until the flag is released.
    pub fn wait_idle(&self) {
        let mut held = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.is_busy() {
            held = self.idle.wait(held).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Releases the flag on drop, including on early return.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.release();
    }
}

/// Owned form of [`InFlightGuard`], released when the task holding it ends.
#[derive(Debug)]
pub struct OwnedInFlightGuard {
    flag: Arc<InFlight>,
}

impl Drop for OwnedInFlightGuard {
    fn drop(&mut self) {
        self.flag.release();
    }
}
