// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scheduler tuning.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Upper bound on the elapsed time one tick may report. A host that
    /// stalls (debugger, sleep) would otherwise fire every timer at once.
    /// `None` disables the clamp.
    pub max_tick_delta: Option<Duration>,
    /// Contain a panicking resumption: the task settles as failed and the
    /// tick goes on. When off, the task is still settled and evicted, then
    /// the panic resumes into the caller of `start` / `on_tick`.
    pub catch_panics: bool,
    /// Live-task slots reserved up front.
    pub initial_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_tick_delta: None,
            catch_panics: true,
            initial_capacity: 16,
        }
    }
}

impl SchedulerConfig {
    /// Apply `max_tick_delta` to a measured delta.
    pub fn clamp_delta(&self, elapsed: Duration) -> Duration {
        match self.max_tick_delta {
            Some(max) => elapsed.min(max),
            None => elapsed,
        }
    }
}
