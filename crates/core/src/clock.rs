//! Monotonic time sources for expiry bookkeeping.
//!
//! The cooldown registry never reads wall-clock time directly; it asks a
//! [`Clock`] for the elapsed duration since the clock was created. Production
//! code uses [`MonotonicClock`]; tests drive a [`ManualClock`] forward
//! explicitly.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of monotonic elapsed time.
pub trait Clock: Send + Sync {
    /// Elapsed time since the clock was created. Never decreases.
    fn now(&self) -> Duration;
}

/// Real time source backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced time source for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}
