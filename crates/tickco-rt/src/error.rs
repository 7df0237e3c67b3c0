// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scheduler errors.
//!
//! None of these stop the scheduler. Start failures abort the one start
//! call; an unsupported yield degrades that task's wait to immediate.

use thiserror::Error;

use crate::owner::OwnerId;

/// Why a start request produced no task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    /// The owner was dropped before the routine could be registered.
    #[error("owner {owner} was released, routine `{origin}` not started")]
    OwnerReleased { owner: OwnerId, origin: String },

    /// No factory registered under this name.
    #[error("routine `{name}` couldn't be started on `{owner}`, no such routine is registered")]
    UnknownRoutine { owner: String, name: String },

    /// Factory exists but takes a different number of arguments.
    #[error("routine `{name}` on `{owner}` takes {expected} argument(s), {given} given")]
    ArityMismatch {
        owner: String,
        name: String,
        expected: usize,
        given: usize,
    },

    /// One-argument factory was handed a value of the wrong type.
    #[error("routine `{name}` on `{owner}` expects an argument of type `{expected}`")]
    ArgumentType {
        owner: String,
        name: String,
        expected: &'static str,
    },
}

/// A routine yielded something no wait adapter understands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("<{label}> yielded an unknown or unsupported type! ({type_name})")]
pub struct UnsupportedYield {
    pub label: String,
    pub type_name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_routine_names_owner_and_routine() {
        let err = StartError::UnknownRoutine {
            owner: "window".to_string(),
            name: "Example".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("window"));
        assert!(msg.contains("Example"));
    }

    #[test]
    fn call_shape_errors_name_owner() {
        let arity = StartError::ArityMismatch {
            owner: "window".to_string(),
            name: "Repeat".to_string(),
            expected: 1,
            given: 0,
        };
        assert_eq!(
            arity.to_string(),
            "routine `Repeat` on `window` takes 1 argument(s), 0 given"
        );
        let ty = StartError::ArgumentType {
            owner: "window".to_string(),
            name: "Repeat".to_string(),
            expected: "u32",
        };
        assert!(ty.to_string().contains("on `window`"));
    }

    #[test]
    fn unsupported_yield_mentions_type() {
        let err = UnsupportedYield {
            label: "Example".to_string(),
            type_name: "u32",
        };
        assert_eq!(
            err.to_string(),
            "<Example> yielded an unknown or unsupported type! (u32)"
        );
    }
}
