//! Time sources for the worker.
//!
//! Countdowns are anchored to absolute timestamps, so the worker only ever
//! asks a clock for "now". The periodic tick source lives here as well.

use chrono::Utc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// The fixed period of the tick source.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A wall-clock time source, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Reads the system wall clock.
///
/// Unlike a monotonic clock this keeps advancing while the device sleeps,
/// which is what makes an `end_time` anchor survive suspension.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that follows tokio's notion of time.
///
/// The epoch anchor is captured once at construction; afterwards the clock
/// advances with `tokio::time::Instant`, so it honours paused and advanced
/// time in tests.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    anchor_ms: i64,
    anchor: Instant,
}

impl RuntimeClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now().timestamp_millis())
    }

    /// Creates a clock that reads `anchor_ms` right now.
    pub fn anchored_at(anchor_ms: i64) -> Self {
        Self {
            anchor_ms,
            anchor: Instant::now(),
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.anchor_ms.saturating_add(elapsed)
    }
}

/// Creates the periodic tick source for a running session.
///
/// The first periodic tick lands one period from now (the caller emits the
/// immediate tick itself). Ticks missed while the runtime was stalled are
/// skipped, not replayed in a burst; each tick recomputes remaining time
/// from the anchor anyway.
pub fn tick_source() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Waits for the next tick, or forever if no tick source is active.
pub(crate) async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runtime_clock_follows_virtual_time() {
        let clock = RuntimeClock::anchored_at(1_000);
        assert_eq!(clock.now_ms(), 1_000);

        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now_ms(), 3_500);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_source_skips_missed_ticks() {
        let start = Instant::now();
        let mut ticker = tick_source();

        ticker.tick().await;
        assert_eq!(start.elapsed(), TICK_PERIOD);

        tokio::time::advance(Duration::from_millis(3_500)).await;
        ticker.tick().await;
        // The stalled ticks collapse into a single one.
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn wall_clock_reads_epoch_millis() {
        let before = Utc::now().timestamp_millis();
        let now = WallClock.now_ms();
        assert!(now >= before);
    }
}
