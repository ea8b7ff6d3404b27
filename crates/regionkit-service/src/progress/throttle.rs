//! Progress throttling.
//!
//! Rate-limits percentage reports so observers see each percentage at most
//! once and never more often than the configured interval.

use std::time::{Duration, Instant};

/// Rate-limiter for percentage reports of one download.
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    last_percent: Option<u32>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            last_percent: None,
            min_interval,
        }
    }

    /// Create a throttle with a default interval of 100ms.
    pub const fn default_interval() -> Self {
        Self::new(Duration::from_millis(100))
    }

    /// Check whether `percent` should be reported now.
    ///
    /// A repeated percentage is never reported. Completion (100) bypasses
    /// the interval.
    pub fn should_report(&mut self, percent: u32) -> bool {
        if self.last_percent == Some(percent) {
            return false;
        }

        let now = Instant::now();
        let due = percent >= 100
            || self
                .last_emit
                .is_none_or(|last| now.duration_since(last) >= self.min_interval);

        if due {
            self.mark(percent, now);
        }
        due
    }

    /// Report `percent` regardless of the interval, unless it was the last
    /// percentage reported.
    pub fn force(&mut self, percent: u32) -> bool {
        if self.last_percent == Some(percent) {
            return false;
        }
        self.mark(percent, Instant::now());
        true
    }

    /// The last percentage that passed the throttle.
    pub const fn last_reported(&self) -> Option<u32> {
        self.last_percent
    }

    const fn mark(&mut self, percent: u32, now: Instant) {
        self.last_emit = Some(now);
        self.last_percent = Some(percent);
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::default_interval()
    }
}
