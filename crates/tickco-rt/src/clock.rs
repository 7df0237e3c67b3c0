// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Wall-clock sources.
//!
//! The scheduler measures elapsed time itself between ticks; the clock
//! only answers "what time is it". `ManualClock` lets tests and replay
//! hosts move time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Seconds to `Duration`. Negative and NaN give zero; anything too
/// large to represent (including +inf) gives `Duration::MAX`.
pub(crate) fn saturating_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Monotonic system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Move time forward. Saturates instead of overflowing `Instant`.
    pub fn advance(&self, by: Duration) {
        if let Some(next) = self.now.get().checked_add(by) {
            self.now.set(next);
        }
    }

    /// Negative or NaN seconds are a no-op.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(saturating_secs(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
