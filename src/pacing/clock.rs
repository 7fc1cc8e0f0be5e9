// SPDX-License-Identifier: GPL-3.0-only

//! Time sources for frame pacing

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source that can also block
pub trait Clock: Send {
    /// Current monotonic time
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock for deterministic pacing
///
/// Time only moves through [`ManualClock::advance`] or [`Clock::sleep`].
/// Clones share the same time line, so a test can keep a handle while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    elapsed_nanos: Arc<AtomicU64>,
    slept_nanos: Arc<AtomicU64>,
    sleep_overshoot: Duration,
}

impl ManualClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
            slept_nanos: Arc::new(AtomicU64::new(0)),
            sleep_overshoot: Duration::ZERO,
        }
    }

    /// Make every sleep last `overshoot` longer than requested, like a
    /// scheduler waking the thread late
    pub fn with_sleep_overshoot(mut self, overshoot: Duration) -> Self {
        self.sleep_overshoot = overshoot;
        self
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        self.elapsed_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Time passed since the clock was created
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    /// Total time spent in [`Clock::sleep`]
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        let slept = duration + self.sleep_overshoot;
        self.slept_nanos
            .fetch_add(slept.as_nanos() as u64, Ordering::SeqCst);
        self.advance(slept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_only_on_demand() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(10));
        assert_eq!(clock.now() - start, Duration::from_millis(10));

        clock.sleep(Duration::from_millis(5));
        assert_eq!(clock.now() - start, Duration::from_millis(15));
        assert_eq!(clock.total_slept(), Duration::from_millis(5));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new().with_sleep_overshoot(Duration::from_millis(1));
        let handle = clock.clone();
        clock.sleep(Duration::from_millis(4));
        assert_eq!(handle.elapsed(), Duration::from_millis(5));
    }
}
