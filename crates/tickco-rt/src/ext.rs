// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Owner-side conveniences.
//!
//! `owner.start_coroutine(&mut sched, routine)` reads better at call
//! sites than going through the scheduler with the owner as argument.
//! Start failures are logged by the scheduler, so these return `Option`.

use std::any::Any;

use crate::owner::{Owner, OwnerRef};
use crate::routine::{Origin, Routine};
use crate::scheduler::Scheduler;
use crate::task::TaskHandle;

pub trait Coroutines {
    /// Identity tasks started through this value belong to.
    fn coroutine_owner(&self) -> OwnerRef;

    fn start_coroutine<R: Routine>(&self, sched: &mut Scheduler, routine: R) -> Option<TaskHandle> {
        sched.start(self.coroutine_owner(), routine).ok()
    }

    fn start_coroutine_named(&self, sched: &mut Scheduler, name: &str) -> Option<TaskHandle> {
        sched.start_named(self.coroutine_owner(), name).ok()
    }

    fn start_coroutine_with<A: Any>(
        &self,
        sched: &mut Scheduler,
        name: &str,
        arg: A,
    ) -> Option<TaskHandle> {
        sched
            .start_named_with(self.coroutine_owner(), name, arg)
            .ok()
    }

    fn stop_coroutine(&self, sched: &mut Scheduler, handle: &TaskHandle) -> bool {
        sched.stop(handle)
    }

    fn stop_coroutine_like<R: Routine>(&self, sched: &mut Scheduler, routine: &R) -> usize {
        sched.stop_like(self.coroutine_owner(), routine)
    }

    fn stop_coroutine_origin(&self, sched: &mut Scheduler, origin: Origin) -> usize {
        sched.stop_origin(self.coroutine_owner(), origin)
    }

    fn stop_coroutine_named(&self, sched: &mut Scheduler, name: &str) -> usize {
        sched.stop_named(self.coroutine_owner(), name)
    }

    fn stop_all_coroutines(&self, sched: &mut Scheduler) -> usize {
        sched.stop_all(self.coroutine_owner())
    }
}

impl Coroutines for Owner {
    fn coroutine_owner(&self) -> OwnerRef {
        self.downgrade()
    }
}

impl Coroutines for OwnerRef {
    fn coroutine_owner(&self) -> OwnerRef {
        self.clone()
    }
}
