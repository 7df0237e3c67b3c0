// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resumable computations.
//!
//! A routine is an explicit state machine: each `resume` runs it to the
//! next suspension point and reports what it is waiting on, or that it
//! is done. The scheduler owns the routine; the routine gets a `Context`
//! for the duration of one step.

use std::any::{type_name, TypeId};
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::awaitable::Yield;
use crate::owner::OwnerRef;
use crate::scheduler::Scheduler;
use crate::task::TaskHandle;

/// Outcome of one resumption.
pub enum Step {
    /// Suspended; resume once this is satisfied.
    Yield(Yield),
    /// No further work.
    Done,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Yield(y) => f.debug_tuple("Yield").field(y).finish(),
            Step::Done => f.write_str("Done"),
        }
    }
}

/// Declared origin of a routine: the type implementing it.
///
/// Compared by type identity; the name is for logs and snapshots.
#[derive(Debug, Clone, Copy)]
pub struct Origin {
    id: TypeId,
    name: &'static str,
}

impl Origin {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Origin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Origin {}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A cooperatively scheduled unit of work.
pub trait Routine: 'static {
    /// Run until the next suspension point.
    fn resume(&mut self, cx: &mut Context<'_>) -> Step;

    /// Declared origin. Two routines with the same origin are "the same
    /// computation" for `Scheduler::stop_like`.
    fn origin(&self) -> Origin {
        Origin::of::<Self>()
    }

    /// Logical name for `Scheduler::stop_named`.
    fn label(&self) -> Option<&str> {
        None
    }
}

impl Routine for Box<dyn Routine> {
    fn resume(&mut self, cx: &mut Context<'_>) -> Step {
        (**self).resume(cx)
    }

    fn origin(&self) -> Origin {
        (**self).origin()
    }

    fn label(&self) -> Option<&str> {
        (**self).label()
    }
}

/// Derive a label from a plain type path: `demo::CountTwice` → `CountTwice`.
/// Generic and closure types have no usable name.
pub(crate) fn derive_label(origin: &str) -> Option<String> {
    if origin.contains('<') || origin.contains('{') {
        return None;
    }
    origin.rsplit("::").next().map(str::to_string)
}

/// Per-step access to the scheduler, the running task, and its owner.
///
/// Derefs to `Scheduler`, so a routine can start a nested task and
/// yield its handle, or stop other tasks.
pub struct Context<'a> {
    scheduler: &'a mut Scheduler,
    owner: OwnerRef,
    task: TaskHandle,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, owner: OwnerRef, task: TaskHandle) -> Self {
        Self {
            scheduler,
            owner,
            task,
        }
    }

    /// Owner of the running task.
    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// Handle of the running task.
    pub fn handle(&self) -> &TaskHandle {
        &self.task
    }
}

impl Deref for Context<'_> {
    type Target = Scheduler;

    fn deref(&self) -> &Scheduler {
        self.scheduler
    }
}

impl DerefMut for Context<'_> {
    fn deref_mut(&mut self) -> &mut Scheduler {
        self.scheduler
    }
}

/// Closure-backed routine. Every closure literal is its own origin.
pub struct FnRoutine<F> {
    f: F,
    label: Option<String>,
}

impl<F> Routine for FnRoutine<F>
where
    F: FnMut(&mut Context<'_>) -> Step + 'static,
{
    fn resume(&mut self, cx: &mut Context<'_>) -> Step {
        (self.f)(cx)
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Wrap a step closure as a routine.
pub fn from_fn<F>(f: F) -> FnRoutine<F>
where
    F: FnMut(&mut Context<'_>) -> Step + 'static,
{
    FnRoutine { f, label: None }
}

/// Wrap a step closure as a routine with a label.
pub fn named<F>(label: impl Into<String>, f: F) -> FnRoutine<F>
where
    F: FnMut(&mut Context<'_>) -> Step + 'static,
{
    FnRoutine {
        f,
        label: Some(label.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountTwice;

    impl Routine for CountTwice {
        fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
            Step::Done
        }
    }

    #[test]
    fn plain_type_labels() {
        assert_eq!(
            derive_label(CountTwice.origin().name()).as_deref(),
            Some("CountTwice")
        );
    }

    #[test]
    fn closures_have_distinct_origins_and_no_derived_label() {
        let a = from_fn(|_| Step::Done);
        let b = from_fn(|_| Step::Done);
        assert_ne!(a.origin(), b.origin());
        assert_eq!(a.origin(), a.origin());
        assert_eq!(derive_label(a.origin().name()), None);
    }

    #[test]
    fn boxed_routine_keeps_inner_origin() {
        let boxed: Box<dyn Routine> = Box::new(named("Example", |_| Step::Done));
        assert_eq!(boxed.label(), Some("Example"));
        assert!(Routine::origin(&boxed).name().contains("FnRoutine"));
    }
}
