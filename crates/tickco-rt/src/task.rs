// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Task records and handles.
//!
//! The scheduler owns one `TaskRecord` per live task. Callers and wait
//! adapters get a `TaskHandle`, which shares only the task's identity
//! and lifecycle state, never the routine itself.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::awaitable::Wait;
use crate::owner::{OwnerId, OwnerRef};
use crate::routine::{Origin, Routine};

/// Scheduler-unique task id, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task{}", self.0)
    }
}

/// Task lifecycle. Leaves `Running` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskState {
    /// Registered; suspended or being resumed.
    Running,
    /// Routine returned `Step::Done`.
    Completed,
    /// Removed by a stop operation.
    Stopped,
    /// Owner was dropped.
    Abandoned,
    /// Routine panicked while resuming.
    Failed,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        self != TaskState::Running
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Stopped => "stopped",
            TaskState::Abandoned => "abandoned",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

struct TaskShared {
    id: TaskId,
    origin: Origin,
    label: Option<String>,
    state: Cell<TaskState>,
    failure: RefCell<Option<String>>,
}

/// Externally visible reference to a task. Cheap to clone; does not
/// keep the task alive or scheduled.
#[derive(Clone)]
pub struct TaskHandle {
    shared: Rc<TaskShared>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, origin: Origin, label: Option<String>) -> Self {
        Self {
            shared: Rc::new(TaskShared {
                id,
                origin,
                label,
                state: Cell::new(TaskState::Running),
                failure: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    pub fn origin(&self) -> Origin {
        self.shared.origin
    }

    pub fn label(&self) -> Option<&str> {
        self.shared.label.as_deref()
    }

    pub fn state(&self) -> TaskState {
        self.shared.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Panic message, for `Failed` tasks.
    pub fn failure(&self) -> Option<String> {
        self.shared.failure.borrow().clone()
    }

    /// Move out of `Running`. Returns false if already settled.
    pub(crate) fn settle(&self, state: TaskState) -> bool {
        if self.is_finished() {
            return false;
        }
        self.shared.state.set(state);
        true
    }

    pub(crate) fn fail(&self, message: String) -> bool {
        if !self.settle(TaskState::Failed) {
            return false;
        }
        *self.shared.failure.borrow_mut() = Some(message);
        true
    }

    /// Label if set, else the origin type name.
    pub(crate) fn display_name(&self) -> &str {
        self.label().unwrap_or_else(|| self.shared.origin.name())
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for TaskHandle {}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("state", &self.state())
            .finish()
    }
}

/// Scheduler-side state of one task.
pub(crate) struct TaskRecord {
    /// Taken out while the routine is being resumed.
    pub routine: Option<Box<dyn Routine>>,
    pub owner: OwnerRef,
    /// `None` only between registration and the first step.
    pub wait: Option<Wait>,
    pub handle: TaskHandle,
}

impl TaskRecord {
    pub fn new(routine: Box<dyn Routine>, owner: OwnerRef, handle: TaskHandle) -> Self {
        Self {
            routine: Some(routine),
            owner,
            wait: None,
            handle,
        }
    }

    pub fn is_resuming(&self) -> bool {
        self.routine.is_none()
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.handle.id(),
            owner: self.owner.id(),
            owner_name: self.owner.describe(),
            label: self.handle.label().map(str::to_string),
            origin: self.handle.origin().name(),
            wait: self.wait.as_ref().map_or("none", Wait::kind),
            state: self.handle.state(),
        }
    }
}

/// Point-in-time view of a live task, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TaskInfo {
    pub id: TaskId,
    pub owner: OwnerId,
    pub owner_name: String,
    pub label: Option<String>,
    pub origin: &'static str,
    pub wait: &'static str,
    pub state: TaskState,
}
