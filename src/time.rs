//! Time facilities for the tick loop.
//!
//! [`SimClock`] is the deterministic simulated clock: it advances by exactly one
//! time step per committed tick and supplies the per-tick animation parameter
//! handed to the render adapter. [`TickRate`] measures wall-clock throughput
//! for logging.
//!
//! # Example
//!
//! ```ignore
//! use stereo_flock::time::{SimClock, TickRate};
//!
//! let mut clock = SimClock::new(0.05);
//! let mut rate = TickRate::new();
//!
//! // In the tick loop:
//! clock.advance();
//! rate.record();
//!
//! println!("Simulated: {:.2}s", clock.elapsed());
//! println!("Ticks/s: {:.1}", rate.per_second());
//! ```

use std::time::{Duration, Instant};

/// Deterministic simulated clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimClock {
    time_step: f32,
    ticks: u64,
    /// Multiplier from simulated seconds to the animation parameter.
    time_scale: f32,
}

impl SimClock {
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            ticks: 0,
            time_scale: 1.0,
        }
    }

    /// Scale the animation parameter relative to simulated time.
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Advance by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Number of ticks advanced.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds per tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.time_step
    }

    /// Total simulated seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        (self.ticks as f64 * self.time_step as f64) as f32
    }

    /// Per-tick animation parameter for the render adapter.
    #[inline]
    pub fn animation(&self) -> f32 {
        self.elapsed() * self.time_scale
    }
}

/// Wall-clock tick throughput, recomputed periodically.
#[derive(Debug)]
pub struct TickRate {
    /// Total ticks recorded.
    count: u64,
    /// Tick count at last rate update.
    last_count: u64,
    /// Time of last rate calculation.
    last_update: Instant,
    /// How often to update the rate.
    interval: Duration,
    /// Calculated ticks per second.
    rate: f32,
}

impl TickRate {
    pub fn new() -> Self {
        Self {
            count: 0,
            last_count: 0,
            last_update: Instant::now(),
            interval: Duration::from_millis(500),
            rate: 0.0,
        }
    }

    /// Record one finished tick. Returns `true` when the rate was refreshed.
    pub fn record(&mut self) -> bool {
        self.count += 1;
        let now = Instant::now();
        let since = now.duration_since(self.last_update);
        if since < self.interval {
            return false;
        }
        self.rate = (self.count - self.last_count) as f32 / since.as_secs_f32();
        self.last_count = self.count;
        self.last_update = now;
        true
    }

    /// Ticks per second as of the last refresh.
    #[inline]
    pub fn per_second(&self) -> f32 {
        self.rate
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::new()
    }
}
