// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tick-driven cooperative scheduler.
//!
//! Owns every live task. Each tick it measures elapsed time, walks a
//! snapshot of the live set newest-first, and resumes the tasks whose
//! wait is satisfied. Tasks started during a tick join the live set but
//! are not visited until the next one.
//!
//! Per task: `Running(wait)` → wait satisfied → resume → either a new
//! wait, or `Done` and the record is evicted.

use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, error, trace};

use crate::awaitable::Wait;
use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::StartError;
use crate::owner::OwnerRef;
use crate::routine::{derive_label, Context, Origin, Routine, Step};
use crate::task::{TaskHandle, TaskId, TaskInfo, TaskRecord, TaskState};

/// Summary of one tick pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Elapsed time fed to the wait adapters (after clamping).
    pub elapsed: Duration,
    /// Tasks whose wait was satisfied and were resumed.
    pub resumed: usize,
    /// Tasks evicted during this pass (completed, failed, or abandoned).
    pub finished: usize,
}

pub struct Scheduler {
    /// Live tasks in registration order.
    tasks: IndexMap<TaskId, TaskRecord>,
    /// Reused per tick so starts/stops during resumption can't disturb
    /// the walk in progress.
    scratch: Vec<TaskId>,
    next_id: u64,
    clock: Box<dyn Clock>,
    last_tick: Instant,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: SchedulerConfig, clock: impl Clock + 'static) -> Self {
        let last_tick = clock.now();
        Self {
            tasks: IndexMap::with_capacity(config.initial_capacity),
            scratch: Vec::with_capacity(config.initial_capacity),
            next_id: 1,
            clock: Box::new(clock),
            last_tick,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ── Start ──────────────────────────────────────────────────────

    /// Register `routine` for `owner` and run it up to its first
    /// suspension point before returning.
    pub fn start<R: Routine>(
        &mut self,
        owner: impl Into<OwnerRef>,
        routine: R,
    ) -> Result<TaskHandle, StartError> {
        self.start_boxed(owner, Box::new(routine))
    }

    pub fn start_boxed(
        &mut self,
        owner: impl Into<OwnerRef>,
        routine: Box<dyn Routine>,
    ) -> Result<TaskHandle, StartError> {
        let label = routine
            .label()
            .map(str::to_string)
            .or_else(|| derive_label(routine.origin().name()));
        self.spawn(owner.into(), routine, label)
    }

    /// Start the zero-argument routine registered under `name` on the
    /// owner. The task is labelled `name`.
    pub fn start_named(
        &mut self,
        owner: impl Into<OwnerRef>,
        name: &str,
    ) -> Result<TaskHandle, StartError> {
        self.start_resolved(owner.into(), name, None)
    }

    /// Start the one-argument routine registered under `name`.
    pub fn start_named_with<A: Any>(
        &mut self,
        owner: impl Into<OwnerRef>,
        name: &str,
        arg: A,
    ) -> Result<TaskHandle, StartError> {
        self.start_resolved(owner.into(), name, Some(Box::new(arg)))
    }

    fn start_resolved(
        &mut self,
        owner: OwnerRef,
        name: &str,
        arg: Option<Box<dyn Any>>,
    ) -> Result<TaskHandle, StartError> {
        let Some(inner) = owner.upgrade() else {
            return Err(logged(StartError::OwnerReleased {
                owner: owner.id(),
                origin: name.to_string(),
            }));
        };

        // Borrow ends here; the factory may touch the owner again.
        let factory = inner.routines().borrow().factory(inner.name(), name);
        let routine = factory.and_then(|make| make(inner.name(), arg));
        drop(inner);

        let routine = routine.map_err(logged)?;
        self.spawn(owner, routine, Some(name.to_string()))
    }

    fn spawn(
        &mut self,
        owner: OwnerRef,
        routine: Box<dyn Routine>,
        label: Option<String>,
    ) -> Result<TaskHandle, StartError> {
        let origin = routine.origin();
        if !owner.is_alive() {
            return Err(logged(StartError::OwnerReleased {
                owner: owner.id(),
                origin: origin.name().to_string(),
            }));
        }

        let id = TaskId(self.next_id);
        self.next_id += 1;
        let handle = TaskHandle::new(id, origin, label);
        debug!(
            "start {} <{}> for {}",
            id,
            handle.display_name(),
            owner.describe()
        );

        self.tasks
            .insert(id, TaskRecord::new(routine, owner, handle.clone()));
        self.step(id);
        Ok(handle)
    }

    // ── Stop ───────────────────────────────────────────────────────

    /// Stop exactly this task. No-op (returns false) if it already
    /// finished or belongs to another scheduler.
    pub fn stop(&mut self, handle: &TaskHandle) -> bool {
        match self.tasks.get(&handle.id()) {
            Some(record) if record.handle == *handle => {}
            _ => return false,
        }
        self.stop_where(|record| record.handle == *handle) == 1
    }

    /// Stop every task of `owner` running the same computation as
    /// `routine`, matched by type rather than instance: any value of the
    /// same routine type stops all of them.
    pub fn stop_like<R: Routine>(&mut self, owner: impl Into<OwnerRef>, routine: &R) -> usize {
        self.stop_origin(owner, routine.origin())
    }

    pub fn stop_origin(&mut self, owner: impl Into<OwnerRef>, origin: Origin) -> usize {
        let owner = owner.into();
        self.stop_where(|record| record.owner == owner && record.handle.origin() == origin)
    }

    /// Stop every task of `owner` labelled `name`.
    pub fn stop_named(&mut self, owner: impl Into<OwnerRef>, name: &str) -> usize {
        let owner = owner.into();
        self.stop_where(|record| record.owner == owner && record.handle.label() == Some(name))
    }

    /// Stop every task of `owner`.
    pub fn stop_all(&mut self, owner: impl Into<OwnerRef>) -> usize {
        let owner = owner.into();
        self.stop_where(|record| record.owner == owner)
    }

    /// Stop every task of every owner.
    pub fn shutdown(&mut self) -> usize {
        self.stop_where(|_| true)
    }

    fn stop_where(&mut self, mut pred: impl FnMut(&TaskRecord) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, record| {
            if !pred(record) {
                return true;
            }
            record.handle.settle(TaskState::Stopped);
            debug!(
                "stop {} <{}>",
                record.handle.id(),
                record.handle.display_name()
            );
            false
        });
        before - self.tasks.len()
    }

    // ── Tick ───────────────────────────────────────────────────────

    /// Host tick entry point. Measures elapsed time since the previous
    /// tick (or construction) and runs one pass.
    pub fn on_tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.advance(elapsed)
    }

    /// One pass with a host-measured delta.
    pub fn advance(&mut self, elapsed: Duration) -> TickReport {
        let elapsed = self.config.clamp_delta(elapsed);
        let mut report = TickReport {
            elapsed,
            ..TickReport::default()
        };
        if self.tasks.is_empty() {
            return report;
        }

        let mut snapshot = mem::take(&mut self.scratch);
        snapshot.clear();
        snapshot.extend(self.tasks.keys().copied());

        for &id in snapshot.iter().rev() {
            // Gone: stopped earlier in this pass.
            let Some(record) = self.tasks.get_mut(&id) else {
                continue;
            };
            // Its own step is on the stack (re-entrant tick).
            if record.is_resuming() {
                continue;
            }
            if !record.owner.is_alive() {
                self.finalize(id, TaskState::Abandoned);
                report.finished += 1;
                continue;
            }
            let ready = record
                .wait
                .as_mut()
                .map_or(true, |wait| wait.is_done(elapsed));
            if !ready {
                continue;
            }
            report.resumed += 1;
            if self.step(id) {
                report.finished += 1;
            }
        }

        snapshot.clear();
        self.scratch = snapshot;
        trace!(
            "tick {:?}: resumed {}, finished {}, live {}",
            elapsed,
            report.resumed,
            report.finished,
            self.tasks.len()
        );
        report
    }

    /// Resume one task to its next suspension point and derive its new
    /// wait. Returns true if the task left the live set.
    fn step(&mut self, id: TaskId) -> bool {
        let Some(record) = self.tasks.get_mut(&id) else {
            return false;
        };
        if !record.owner.is_alive() {
            self.finalize(id, TaskState::Abandoned);
            return true;
        }
        let Some(mut routine) = record.routine.take() else {
            return false;
        };
        let owner = record.owner.clone();
        let handle = record.handle.clone();

        let outcome = {
            let mut cx = Context::new(self, owner, handle.clone());
            panic::catch_unwind(AssertUnwindSafe(|| routine.resume(&mut cx)))
        };

        let step = match outcome {
            Ok(step) => step,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    "{} <{}> panicked: {}",
                    id,
                    handle.display_name(),
                    message
                );
                // Settle before any rethrow so the record never stays
                // stuck mid-resume.
                self.tasks.shift_remove(&id);
                handle.fail(message);
                drop(routine);
                if !self.config.catch_panics {
                    panic::resume_unwind(payload);
                }
                return true;
            }
        };

        let Some(record) = self.tasks.get_mut(&id) else {
            // Stopped from inside its own step.
            return true;
        };
        match step {
            Step::Done => {
                self.finalize(id, TaskState::Completed);
                true
            }
            Step::Yield(value) => {
                if !record.owner.is_alive() {
                    self.finalize(id, TaskState::Abandoned);
                    return true;
                }
                let wait = Wait::from_yield(value, handle.display_name()).unwrap_or_else(|err| {
                    error!("{}", err);
                    Wait::Immediate
                });
                trace!("{} waits on {:?}", id, wait);
                record.wait = Some(wait);
                record.routine = Some(routine);
                false
            }
        }
    }

    /// Evict a record and settle its handle.
    fn finalize(&mut self, id: TaskId, state: TaskState) {
        if let Some(record) = self.tasks.shift_remove(&id) {
            record.handle.settle(state);
            debug!("{} {} <{}>", state, id, record.handle.display_name());
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, handle: &TaskHandle) -> bool {
        self.tasks
            .get(&handle.id())
            .is_some_and(|record| record.handle == *handle)
    }

    pub fn count_for(&self, owner: impl Into<OwnerRef>) -> usize {
        let owner = owner.into();
        self.tasks.values().filter(|r| r.owner == owner).count()
    }

    /// Live task handles in registration order.
    pub fn handles(&self) -> Vec<TaskHandle> {
        self.tasks.values().map(|r| r.handle.clone()).collect()
    }

    pub fn snapshot(&self) -> Vec<TaskInfo> {
        self.tasks.values().map(TaskRecord::info).collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("live", &self.tasks.len())
            .field("next_id", &self.next_id)
            .field("config", &self.config)
            .finish()
    }
}

fn logged(err: StartError) -> StartError {
    error!("{}", err);
    err
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
