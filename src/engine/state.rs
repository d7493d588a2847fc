//! Mutable state shared by the receive and dispatch loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

/// Running flag and last bus activity
///
/// The flag only ever goes from running to stopped. Both loops read it
/// without further coordination, so either may notice a stop with some delay.
#[derive(Debug)]
pub(crate) struct BusState {
    running: AtomicBool,
    last_activity: Mutex<Instant>,
}

impl BusState {
    /// Start in the running state, counting construction as bus activity
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Record traffic seen on the bus
    pub fn touch(&self) {
        *self.activity() = Instant::now();
    }

    /// Take the bus for a transmission if it has been quiet for `gap`
    ///
    /// On success the transmission itself counts as activity.
    pub fn claim_bus(&self, gap: Duration) -> bool {
        let now = Instant::now();
        let mut last = self.activity();
        if now.saturating_duration_since(*last) < gap {
            return false;
        }
        *last = now;
        true
    }

    fn activity(&self) -> MutexGuard<'_, Instant> {
        self.last_activity.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
