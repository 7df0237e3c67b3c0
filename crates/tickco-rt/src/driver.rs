// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Blocking tick source for hosts that don't have a frame loop.
//!
//! Sleeps the current thread between ticks (`std::thread::sleep`).

use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveOptions {
    /// Sleep between ticks.
    pub interval: Duration,
    /// Give up after this long, even with tasks still live.
    pub timeout: Option<Duration>,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
            timeout: None,
        }
    }
}

/// How `drive` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Every task finished.
    Idle { ticks: u64 },
    /// The timeout passed first.
    TimedOut { ticks: u64, live: usize },
}

impl DriveOutcome {
    pub fn ticks(&self) -> u64 {
        match *self {
            DriveOutcome::Idle { ticks } | DriveOutcome::TimedOut { ticks, .. } => ticks,
        }
    }
}

/// Tick `scheduler` every `interval` until it is idle or `timeout` passes.
pub fn drive(scheduler: &mut Scheduler, options: DriveOptions) -> DriveOutcome {
    let started = Instant::now();
    let mut ticks = 0;
    while !scheduler.is_empty() {
        if options.timeout.is_some_and(|t| started.elapsed() >= t) {
            let live = scheduler.len();
            debug!("drive timed out after {} ticks, {} live", ticks, live);
            return DriveOutcome::TimedOut { ticks, live };
        }
        thread::sleep(options.interval);
        scheduler.on_tick();
        ticks += 1;
    }
    debug!("drive idle after {} ticks", ticks);
    DriveOutcome::Idle { ticks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awaitable::Yield;
    use crate::owner::Owner;
    use crate::routine::{from_fn, Step};
    use crate::SchedulerConfig;

    fn fast() -> DriveOptions {
        DriveOptions {
            interval: Duration::from_millis(1),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn empty_scheduler_is_idle_immediately() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        assert_eq!(drive(&mut sched, fast()), DriveOutcome::Idle { ticks: 0 });
    }

    #[test]
    fn runs_timer_to_completion() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let owner = Owner::new("host");
        let mut waited = false;
        let h = sched
            .start(
                &owner,
                from_fn(move |_| {
                    if waited {
                        return Step::Done;
                    }
                    waited = true;
                    Step::Yield(Yield::seconds(0.02))
                }),
            )
            .unwrap();
        let outcome = drive(&mut sched, fast());
        assert!(matches!(outcome, DriveOutcome::Idle { .. }));
        assert!(outcome.ticks() >= 1);
        assert!(h.is_finished());
    }

    #[test]
    fn times_out_with_endless_task() {
        let mut sched = Scheduler::new(SchedulerConfig::default());
        let owner = Owner::new("host");
        sched
            .start(&owner, from_fn(|_| Step::Yield(Yield::Next)))
            .unwrap();
        let options = DriveOptions {
            interval: Duration::from_millis(1),
            timeout: Some(Duration::from_millis(20)),
        };
        match drive(&mut sched, options) {
            DriveOutcome::TimedOut { live, .. } => assert_eq!(live, 1),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
