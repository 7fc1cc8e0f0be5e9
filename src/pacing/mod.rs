// SPDX-License-Identifier: GPL-3.0-only

//! Frame pacing
//!
//! [`FpsCounter`] tracks the achieved frame rate as an exponential moving
//! average of the interval between sends. [`FramePacer`] uses it to sleep
//! just long enough between frames that the long-run rate converges to the
//! target, even though the time the caller spends producing a frame is
//! unknown and varies:
//!
//! ```text
//! send ──▶ measure ──▶ [caller computes] ──▶ wait_for_next_frame ──▶ send
//!                                              │
//!                                              └─ sleep(next_due - now - extra)
//! ```
//!
//! `extra` is a per-frame compensation that grows while the achieved rate is
//! below target and shrinks while it is above. It absorbs overhead the pacer
//! cannot observe directly, such as late wake-ups.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::constants::pacing::{COMPENSATION_STEP, EMA_WEIGHT};
use std::time::{Duration, Instant};
use tracing::trace;

/// Moving average of the interval between frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    avg_interval: f64,
    last: Option<Instant>,
}

impl FpsCounter {
    /// Create a counter seeded with the interval of `initial_fps`
    ///
    /// Seeding with the target rate keeps the first reports sensible before
    /// any real interval has been measured. `initial_fps` must be positive.
    pub fn new(initial_fps: f64) -> Self {
        Self {
            avg_interval: 1.0 / initial_fps,
            last: None,
        }
    }

    /// Record a frame at `now`
    ///
    /// The first call only stores the timestamp. Later calls move the
    /// average a fifth of the way toward the new interval.
    pub fn measure_at(&mut self, now: Instant) {
        if let Some(last) = self.last {
            let delta = now.saturating_duration_since(last).as_secs_f64();
            self.avg_interval += (delta - self.avg_interval) * EMA_WEIGHT;
        }
        self.last = Some(now);
    }

    /// Average frames per second
    pub fn avg_fps(&self) -> f64 {
        1.0 / self.avg_interval
    }

    /// Average interval between frames
    pub fn avg_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.avg_interval).unwrap_or(Duration::MAX)
    }
}

/// Sleeps between frames so the achieved rate tracks a target
#[derive(Debug)]
pub struct FramePacer<C: Clock = SystemClock> {
    clock: C,
    counter: FpsCounter,
    last_send: Option<Instant>,
    extra_time_per_frame: f64,
}

impl<C: Clock> FramePacer<C> {
    /// Create a pacer for `target_fps` driven by `clock`
    pub fn new(target_fps: f64, clock: C) -> Self {
        Self {
            clock,
            counter: FpsCounter::new(target_fps),
            last_send: None,
            extra_time_per_frame: 0.0,
        }
    }

    /// The pacer's time source
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record that a frame is being sent now and return the timestamp
    pub fn measure(&mut self) -> Instant {
        let now = self.clock.now();
        self.last_send = Some(now);
        self.counter.measure_at(now);
        now
    }

    /// Block until the next frame is due
    ///
    /// Returns immediately when no frame has been measured yet, or when the
    /// caller is already late. Never fails.
    pub fn wait_for_next_frame(&mut self, target_fps: f64) {
        let Some(last_send) = self.last_send else {
            return;
        };
        if !(target_fps.is_finite() && target_fps > 0.0) {
            return;
        }

        let Some(next_due) = Duration::try_from_secs_f64(1.0 / target_fps)
            .ok()
            .and_then(|interval| last_send.checked_add(interval))
        else {
            return;
        };
        let now = self.clock.now();
        if now >= next_due {
            return;
        }

        let factor = target_fps / self.counter.avg_fps() - 1.0;
        self.extra_time_per_frame =
            (self.extra_time_per_frame + COMPENSATION_STEP * factor).max(0.0);

        let sleep = (next_due - now).as_secs_f64() - self.extra_time_per_frame;
        trace!(
            sleep_ms = sleep * 1000.0,
            extra_ms = self.extra_time_per_frame * 1000.0,
            "Pacing frame"
        );
        if let Ok(sleep) = Duration::try_from_secs_f64(sleep) {
            if !sleep.is_zero() {
                self.clock.sleep(sleep);
            }
        }
    }

    /// Achieved frames per second
    pub fn current_fps(&self) -> f64 {
        self.counter.avg_fps()
    }

    /// Current per-frame sleep compensation
    pub fn extra_time_per_frame(&self) -> Duration {
        Duration::try_from_secs_f64(self.extra_time_per_frame).unwrap_or(Duration::MAX)
    }

    /// Share of the frame interval the caller spends busy, in `[0, 1]`
    pub fn busy_ratio(&self, target_fps: f64) -> f64 {
        (self.extra_time_per_frame * target_fps).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_seeded_with_initial_rate() {
        let counter = FpsCounter::new(25.0);
        assert!((counter.avg_fps() - 25.0).abs() < 1e-9);
        assert!((counter.avg_interval().as_secs_f64() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_counter_first_measure_only_records() {
        let mut counter = FpsCounter::new(10.0);
        counter.measure_at(Instant::now());
        assert!((counter.avg_fps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_moves_a_fifth_toward_sample() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(10.0);
        counter.measure_at(start);
        counter.measure_at(start + Duration::from_millis(200));
        // 0.1 + (0.2 - 0.1) * 0.2
        assert!((counter.avg_interval().as_secs_f64() - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_counter_survives_zero_interval() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(30.0);
        for _ in 0..50 {
            counter.measure_at(start);
        }
        assert!(counter.avg_interval() > Duration::ZERO);
        assert!(counter.avg_fps().is_finite());
    }

    #[test]
    fn test_wait_without_measure_returns_immediately() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(30.0, clock.clone());
        pacer.wait_for_next_frame(30.0);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_wait_sleeps_until_next_frame() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(20.0, clock.clone());
        pacer.measure();
        clock.advance(Duration::from_millis(10));
        pacer.wait_for_next_frame(20.0);

        // Counter is still at its 20 fps seed, so no compensation yet
        assert!(pacer.extra_time_per_frame() < Duration::from_micros(1));
        assert!((clock.total_slept().as_secs_f64() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_tiny_target_rate_does_not_panic() {
        // A frame interval of 1e20 s does not fit in a Duration
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(1e-20, clock.clone());
        pacer.measure();
        pacer.wait_for_next_frame(1e-20);

        assert_eq!(clock.total_slept(), Duration::ZERO);
        assert_eq!(pacer.extra_time_per_frame(), Duration::ZERO);
        assert_eq!(pacer.counter.avg_interval(), Duration::MAX);
    }

    #[test]
    fn test_late_caller_does_not_sleep() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(20.0, clock.clone());
        pacer.measure();
        clock.advance(Duration::from_millis(80));
        pacer.wait_for_next_frame(20.0);
        assert_eq!(clock.total_slept(), Duration::ZERO);
    }

    #[test]
    fn test_compensation_grows_when_slow_and_never_negative() {
        let clock = ManualClock::new();
        let mut pacer = FramePacer::new(20.0, clock.clone());

        pacer.measure();
        clock.advance(Duration::from_millis(100));
        pacer.measure();
        // Average interval 0.06 s, so the rate is below target
        clock.advance(Duration::from_millis(10));
        pacer.wait_for_next_frame(20.0);
        assert!(pacer.extra_time_per_frame() > Duration::ZERO);
        assert!(pacer.busy_ratio(20.0) > 0.0);

        let mut fast = FramePacer::new(20.0, ManualClock::new());
        fast.measure();
        // Running at twice the requested rate pushes the compensation below zero
        fast.wait_for_next_frame(10.0);
        assert_eq!(fast.extra_time_per_frame(), Duration::ZERO);
    }

    #[test]
    fn test_busy_ratio_is_capped() {
        let mut pacer = FramePacer::new(20.0, ManualClock::new());
        pacer.extra_time_per_frame = 1.0;
        assert_eq!(pacer.busy_ratio(20.0), 1.0);
    }
}
