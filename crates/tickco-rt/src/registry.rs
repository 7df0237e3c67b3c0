// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name → routine factory table.
//!
//! Each owner fills its own table; `Scheduler::start_named` looks names
//! up here. Factories take zero or one argument, the argument travels
//! as `Box<dyn Any>` and is downcast to the registered type.

use std::any::{type_name, Any};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::StartError;
use crate::routine::Routine;

/// Called with the owner's name (for errors) and the optional argument.
pub(crate) type Factory =
    Rc<dyn Fn(&str, Option<Box<dyn Any>>) -> Result<Box<dyn Routine>, StartError>>;

struct Entry {
    arity: usize,
    make: Factory,
}

/// Routine factories keyed by name, in registration order.
#[derive(Default)]
pub struct RoutineRegistry {
    entries: IndexMap<String, Entry>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zero-argument factory. Replaces any previous entry.
    pub fn register<R, F>(&mut self, name: impl Into<String>, factory: F)
    where
        R: Routine,
        F: Fn() -> R + 'static,
    {
        let name = name.into();
        let label = name.clone();
        let make: Factory = Rc::new(move |owner: &str, arg: Option<Box<dyn Any>>| match arg {
            None => Ok(Box::new(factory()) as Box<dyn Routine>),
            Some(_) => Err(StartError::ArityMismatch {
                owner: owner.to_string(),
                name: label.clone(),
                expected: 0,
                given: 1,
            }),
        });
        self.entries.insert(name, Entry { arity: 0, make });
    }

    /// Register a one-argument factory. Replaces any previous entry.
    pub fn register_with<A, R, F>(&mut self, name: impl Into<String>, factory: F)
    where
        A: Any,
        R: Routine,
        F: Fn(A) -> R + 'static,
    {
        let name = name.into();
        let label = name.clone();
        let make: Factory = Rc::new(move |owner: &str, arg: Option<Box<dyn Any>>| match arg {
            None => Err(StartError::ArityMismatch {
                owner: owner.to_string(),
                name: label.clone(),
                expected: 1,
                given: 0,
            }),
            Some(value) => match value.downcast::<A>() {
                Ok(value) => Ok(Box::new(factory(*value)) as Box<dyn Routine>),
                Err(_) => Err(StartError::ArgumentType {
                    owner: owner.to_string(),
                    name: label.clone(),
                    expected: type_name::<A>(),
                }),
            },
        });
        self.entries.insert(name, Entry { arity: 1, make });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.entries.get(name).map(|e| e.arity)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the factory out so callers can drop the table borrow
    /// before invoking it. `owner` is only used in the error.
    pub(crate) fn factory(&self, owner: &str, name: &str) -> Result<Factory, StartError> {
        self.entries
            .get(name)
            .map(|e| e.make.clone())
            .ok_or_else(|| StartError::UnknownRoutine {
                owner: owner.to_string(),
                name: name.to_string(),
            })
    }

    /// Build a routine by name. `owner` is only used in errors.
    pub fn resolve(
        &self,
        owner: &str,
        name: &str,
        arg: Option<Box<dyn Any>>,
    ) -> Result<Box<dyn Routine>, StartError> {
        let make = self.factory(owner, name)?;
        make(owner, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{from_fn, Step};

    fn registry() -> RoutineRegistry {
        let mut reg = RoutineRegistry::new();
        reg.register("Idle", || from_fn(|_| Step::Done));
        reg.register_with("Repeat", |times: u32| {
            let mut left = times;
            from_fn(move |_| {
                if left == 0 {
                    return Step::Done;
                }
                left -= 1;
                Step::Yield(crate::awaitable::Yield::Next)
            })
        });
        reg
    }

    #[test]
    fn resolves_zero_and_one_argument_factories() {
        let reg = registry();
        assert!(reg.resolve("w", "Idle", None).is_ok());
        assert!(reg.resolve("w", "Repeat", Some(Box::new(3u32))).is_ok());
        assert_eq!(reg.arity("Repeat"), Some(1));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Idle", "Repeat"]);
    }

    #[test]
    fn unknown_name() {
        let reg = registry();
        match reg.resolve("w", "Missing", None) {
            Err(StartError::UnknownRoutine { owner, name }) => {
                assert_eq!(owner, "w");
                assert_eq!(name, "Missing");
            }
            other => panic!("expected UnknownRoutine, got {:?}", other.err()),
        }
    }

    #[test]
    fn arity_mismatch_both_ways() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("w", "Idle", Some(Box::new(1u32))).err(),
            Some(StartError::ArityMismatch { expected: 0, given: 1, .. })
        ));
        assert!(matches!(
            reg.resolve("w", "Repeat", None).err(),
            Some(StartError::ArityMismatch { expected: 1, given: 0, .. })
        ));
    }

    #[test]
    fn wrong_argument_type() {
        let reg = registry();
        match reg.resolve("w", "Repeat", Some(Box::new("three"))).err() {
            Some(StartError::ArgumentType { owner, expected, .. }) => {
                assert_eq!(owner, "w");
                assert_eq!(expected, "u32");
            }
            other => panic!("expected ArgumentType, got {:?}", other),
        }
    }
}
