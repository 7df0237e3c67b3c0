// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tick-driven cooperative coroutine scheduler.
//!
//! Host code registers pausable routines on behalf of an owner. Each
//! external tick, the scheduler measures elapsed time, asks every live
//! task whether its current wait is satisfied, and resumes the ones
//! that are. Single-threaded: a routine runs uninterrupted from one
//! suspension point to the next.
//!
//! Components:
//! - `awaitable`: yielded values and the wait adapters built from them
//! - `task`: task identity, lifecycle state, handles
//! - `routine`: the resumable computation contract + resume context
//! - `scheduler`: live-task set, tick pass, start/stop operations
//! - `owner`: owner identity with liveness, per-owner registry
//! - `registry`: name → routine factory resolution
//! - `ext`: per-owner start/stop conveniences
//! - `driver`: blocking tick loop for hosts without their own
//! - `clock`: wall-clock source (system or manual)
//! - `config`: scheduler tuning

pub mod awaitable;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod ext;
pub mod owner;
pub mod registry;
pub mod routine;
pub mod scheduler;
pub mod task;

pub use awaitable::{AsyncOp, KeepWaiting, Signal, Wait, WaitUntil, WaitWhile, Yield};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use driver::{drive, DriveOptions, DriveOutcome};
pub use error::{StartError, UnsupportedYield};
pub use ext::Coroutines;
pub use owner::{Owner, OwnerId, OwnerRef};
pub use registry::RoutineRegistry;
pub use routine::{from_fn, named, Context, FnRoutine, Origin, Routine, Step};
pub use scheduler::{Scheduler, TickReport};
pub use task::{TaskHandle, TaskId, TaskInfo, TaskState};
