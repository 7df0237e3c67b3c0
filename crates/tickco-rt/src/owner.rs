// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Owner identity.
//!
//! Tasks never hold their owner alive. They keep an `OwnerRef`, which
//! compares by id and can be asked whether the owner still exists, so a
//! task whose owner is dropped is quietly abandoned on the next tick.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::registry::RoutineRegistry;
use crate::routine::Routine;

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique owner identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        OwnerId(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct OwnerInner {
    name: String,
    routines: RefCell<RoutineRegistry>,
}

/// The entity on whose behalf tasks run. Dropping it ends its tasks.
pub struct Owner {
    id: OwnerId,
    inner: Rc<OwnerInner>,
}

impl Owner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OwnerId::next(),
            inner: Rc::new(OwnerInner {
                name: name.into(),
                routines: RefCell::new(RoutineRegistry::new()),
            }),
        }
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Non-owning reference for tasks and routines to hold.
    pub fn downgrade(&self) -> OwnerRef {
        OwnerRef {
            id: self.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register a zero-argument routine factory under `name`.
    pub fn register<R, F>(&self, name: impl Into<String>, factory: F)
    where
        R: Routine,
        F: Fn() -> R + 'static,
    {
        self.inner.routines.borrow_mut().register(name, factory);
    }

    /// Register a one-argument routine factory under `name`.
    pub fn register_with<A, R, F>(&self, name: impl Into<String>, factory: F)
    where
        A: Any,
        R: Routine,
        F: Fn(A) -> R + 'static,
    {
        self.inner
            .routines
            .borrow_mut()
            .register_with(name, factory);
    }

    pub fn has_routine(&self, name: &str) -> bool {
        self.inner.routines.borrow().contains(name)
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Weak owner identity. Stays comparable after the owner is gone.
#[derive(Clone)]
pub struct OwnerRef {
    id: OwnerId,
    inner: Weak<OwnerInner>,
}

impl OwnerRef {
    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Owner name while it is alive, else its id.
    pub fn describe(&self) -> String {
        match self.inner.upgrade() {
            Some(inner) => inner.name.clone(),
            None => format!("<released {}>", self.id),
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<OwnerInner>> {
        self.inner.upgrade()
    }
}

impl OwnerInner {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn routines(&self) -> &RefCell<RoutineRegistry> {
        &self.routines
    }
}

impl PartialEq for OwnerRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OwnerRef {}

impl Hash for OwnerRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl From<&Owner> for OwnerRef {
    fn from(owner: &Owner) -> Self {
        owner.downgrade()
    }
}

impl From<&OwnerRef> for OwnerRef {
    fn from(owner: &OwnerRef) -> Self {
        owner.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Owner::new("a");
        let b = Owner::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn ref_outlives_owner_and_stays_comparable() {
        let owner = Owner::new("window");
        let r1 = owner.downgrade();
        let r2 = OwnerRef::from(&owner);
        assert!(r1.is_alive());
        assert_eq!(r1.describe(), "window");

        drop(owner);
        assert!(!r1.is_alive());
        assert_eq!(r1, r2);
        assert!(r1.describe().starts_with("<released"));
    }

    #[test]
    fn different_owners_never_compare_equal() {
        let a = Owner::new("same");
        let b = Owner::new("same");
        assert_ne!(a.downgrade(), b.downgrade());
    }
}
