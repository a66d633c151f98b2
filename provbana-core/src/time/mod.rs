//! ## provbana-core::time
//! **Scenario clocks**
//!
//! Scenario time starts at zero when the clock is (re)started and is measured
//! in nanoseconds. Two clocks are provided:
//! - `SimClock`: jumps straight to any requested time, never sleeps.
//! - `WallTimeClock`: genuinely waits on the Tokio timer.
//!
//! Both are interchangeable behind the `Clock` trait so the scheduler can be
//! driven deterministically in tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point in scenario time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u64);

impl Time {
    pub const ZERO: Time = Time(0);

    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(NANOS_PER_SEC))
    }

    /// Converts scenario-file seconds. Negative and NaN inputs clamp to zero.
    pub fn from_secs_f32(secs: f32) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self((f64::from(secs) * NANOS_PER_SEC as f64) as u64)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Time) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    pub fn saturating_sub(self, d: Duration) -> Time {
        Time(self.0.saturating_sub(duration_nanos(d)))
    }
}

impl From<Duration> for Time {
    fn from(d: Duration) -> Self {
        Time(duration_nanos(d))
    }
}

impl From<Time> for Duration {
    fn from(t: Time) -> Self {
        Duration::from_nanos(t.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Source of scenario time for the event loop.
pub trait Clock: Send + Sync {
    /// Current scenario time.
    fn now(&self) -> Time;

    /// Returns a receiver that resolves once scenario time reaches `time`.
    fn notify_at(&self, time: Time) -> oneshot::Receiver<()>;

    /// How late the clock is relative to `time`; zero if `time` is still ahead.
    fn delay(&self, time: Time) -> Duration {
        self.now().saturating_duration_since(time)
    }

    /// Resets the origin of scenario time to "now".
    fn restart(&self);
}

/// A simulated clock that advances instantly to every requested time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    // Current simulated time in nanoseconds.
    offset: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock positioned at `start`.
    pub fn starting_at(start: Time) -> Self {
        Self {
            offset: Arc::new(AtomicU64::new(start.as_nanos())),
        }
    }

    /// Moves simulated time forward by `d`.
    #[inline]
    pub fn advance(&self, d: Duration) {
        self.offset.fetch_add(duration_nanos(d), Ordering::AcqRel);
    }
}

impl Clock for SimClock {
    #[inline]
    fn now(&self) -> Time {
        Time(self.offset.load(Ordering::Acquire))
    }

    fn notify_at(&self, time: Time) -> oneshot::Receiver<()> {
        // Simulated time never moves backwards.
        self.offset.fetch_max(time.as_nanos(), Ordering::AcqRel);
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        rx
    }

    fn restart(&self) {
        self.offset.store(0, Ordering::Release);
    }
}

/// A clock following the Tokio timer, so paused test runtimes stay in control.
pub struct WallTimeClock {
    origin: Mutex<Instant>,
}

impl WallTimeClock {
    pub fn new() -> Self {
        Self {
            origin: Mutex::new(Instant::now()),
        }
    }
}

impl Default for WallTimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallTimeClock {
    fn now(&self) -> Time {
        Time::from(self.origin.lock().elapsed())
    }

    /// # Panics
    /// Must be called from within a Tokio runtime.
    fn notify_at(&self, time: Time) -> oneshot::Receiver<()> {
        let deadline = *self.origin.lock() + Duration::from(time);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(());
        });
        rx
    }

    fn restart(&self) {
        *self.origin.lock() = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_conversions() {
        assert_eq!(Time::from_secs_f32(1.5), Time::from_nanos(1_500_000_000));
        assert_eq!(Time::from_secs_f32(-3.0), Time::ZERO);
        assert_eq!(Time::from_secs(7).as_secs_f64(), 7.0);
        assert_eq!(
            Time::from_secs(3).saturating_duration_since(Time::from_secs(5)),
            Duration::ZERO
        );
        assert_eq!(Time::from_secs(2).to_string(), "2.000s");
    }

    #[tokio::test]
    async fn sim_clock_jumps_to_requested_time() {
        let clock = SimClock::new();
        clock.notify_at(Time::from_secs(10)).await.unwrap();
        assert_eq!(clock.now(), Time::from_secs(10));
        assert_eq!(clock.delay(Time::from_secs(10)), Duration::ZERO);

        // Requests for the past do not rewind the clock.
        clock.notify_at(Time::from_secs(4)).await.unwrap();
        assert_eq!(clock.now(), Time::from_secs(10));
        assert_eq!(clock.delay(Time::from_secs(4)), Duration::from_secs(6));
    }

    #[test]
    fn sim_clock_restart_and_advance() {
        let clock = SimClock::starting_at(Time::from_secs(5));
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Time::from_nanos(5_250_000_000));
        clock.restart();
        assert_eq!(clock.now(), Time::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_sleeps_until_target() {
        let clock = WallTimeClock::new();
        let before = Instant::now();
        clock.notify_at(Time::from_secs(3)).await.unwrap();
        assert!(before.elapsed() >= Duration::from_secs(3));
        assert!(clock.now() >= Time::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_restart_moves_origin() {
        let clock = WallTimeClock::new();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(clock.now() >= Time::from_secs(5));
        clock.restart();
        assert!(clock.now() < Time::from_secs(1));
    }
}
