// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Suspension points.
//!
//! A routine yields a `Yield`; the scheduler turns it into a `Wait`, the
//! single adapter it polls each tick until the task may resume.
//!
//! | yielded                     | wait                       |
//! |-----------------------------|----------------------------|
//! | `Next`                      | `Immediate`                |
//! | `Seconds(d)`                | `Timer { remaining: d }`   |
//! | `Instruction(k)`            | `Predicate(k)`             |
//! | `Fetch(op)`, `Operation(op)`| `External(op)`             |
//! | `FixedUpdate`, `EndOfFrame` | `Immediate`                |
//! | `Task(h)`                   | `Task(h)`                  |
//! | `Other { .. }`              | error, caller falls back   |

use std::any::{type_name, Any};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::saturating_secs;
use crate::error::UnsupportedYield;
use crate::task::TaskHandle;

/// A custom wait condition, polled every tick.
pub trait KeepWaiting {
    /// `true` while the routine must stay suspended.
    fn keep_waiting(&mut self) -> bool;
}

/// Suspend until the predicate returns `true`.
pub struct WaitUntil<F>(pub F);

impl<F: FnMut() -> bool> KeepWaiting for WaitUntil<F> {
    fn keep_waiting(&mut self) -> bool {
        !(self.0)()
    }
}

/// Suspend while the predicate returns `true`.
pub struct WaitWhile<F>(pub F);

impl<F: FnMut() -> bool> KeepWaiting for WaitWhile<F> {
    fn keep_waiting(&mut self) -> bool {
        (self.0)()
    }
}

/// An operation completed by someone else (network fetch, loader, ...).
pub trait AsyncOp {
    fn is_done(&self) -> bool;
}

/// Cloneable one-shot completion flag.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    done: Rc<Cell<bool>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self) {
        self.done.set(true);
    }

    pub fn is_complete(&self) -> bool {
        self.done.get()
    }
}

impl AsyncOp for Signal {
    fn is_done(&self) -> bool {
        self.is_complete()
    }
}

/// What a routine hands back at a suspension point.
pub enum Yield {
    /// Resume on the next tick.
    Next,
    /// Resume once this much time has elapsed.
    Seconds(Duration),
    /// Resume once `keep_waiting` turns false.
    Instruction(Box<dyn KeepWaiting>),
    /// Resume once a fetch reports done.
    Fetch(Rc<dyn AsyncOp>),
    /// No fixed-step distinction outside of play mode; same as `Next`.
    FixedUpdate,
    /// No end-of-frame distinction outside of play mode; same as `Next`.
    EndOfFrame,
    /// Resume once an async operation reports done.
    Operation(Rc<dyn AsyncOp>),
    /// Resume once another task has finished.
    Task(TaskHandle),
    /// Anything else. Not understood by the scheduler.
    Other {
        type_name: &'static str,
        value: Box<dyn Any>,
    },
}

impl Yield {
    /// Timer in seconds. Negative or NaN durations clamp to zero; ones too
    /// long to represent saturate to `Duration::MAX`.
    pub fn seconds(secs: f64) -> Self {
        Yield::Seconds(saturating_secs(secs))
    }

    pub fn until<F: FnMut() -> bool + 'static>(pred: F) -> Self {
        Yield::Instruction(Box::new(WaitUntil(pred)))
    }

    pub fn while_<F: FnMut() -> bool + 'static>(pred: F) -> Self {
        Yield::Instruction(Box::new(WaitWhile(pred)))
    }

    pub fn instruction<K: KeepWaiting + 'static>(k: K) -> Self {
        Yield::Instruction(Box::new(k))
    }

    pub fn fetch<O: AsyncOp + 'static>(op: O) -> Self {
        Yield::Fetch(Rc::new(op))
    }

    pub fn operation<O: AsyncOp + 'static>(op: O) -> Self {
        Yield::Operation(Rc::new(op))
    }

    pub fn other<T: Any>(value: T) -> Self {
        Yield::Other {
            type_name: type_name::<T>(),
            value: Box::new(value),
        }
    }
}

impl From<TaskHandle> for Yield {
    fn from(handle: TaskHandle) -> Self {
        Yield::Task(handle)
    }
}

impl From<Duration> for Yield {
    fn from(d: Duration) -> Self {
        Yield::Seconds(d)
    }
}

impl fmt::Debug for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Yield::Next => f.write_str("Next"),
            Yield::Seconds(d) => f.debug_tuple("Seconds").field(d).finish(),
            Yield::Instruction(_) => f.write_str("Instruction(..)"),
            Yield::Fetch(_) => f.write_str("Fetch(..)"),
            Yield::FixedUpdate => f.write_str("FixedUpdate"),
            Yield::EndOfFrame => f.write_str("EndOfFrame"),
            Yield::Operation(_) => f.write_str("Operation(..)"),
            Yield::Task(h) => f.debug_tuple("Task").field(&h.id()).finish(),
            Yield::Other { type_name, .. } => write!(f, "Other({})", type_name),
        }
    }
}

/// The active suspend condition of a task. Exactly one per task.
pub enum Wait {
    Immediate,
    Timer { remaining: Duration },
    Predicate(Box<dyn KeepWaiting>),
    External(Rc<dyn AsyncOp>),
    /// Non-owning: the nested task lives in the scheduler.
    Task(TaskHandle),
}

impl Wait {
    /// Build the adapter for a yielded value. `label` names the yielding
    /// routine in the error.
    pub fn from_yield(value: Yield, label: &str) -> Result<Wait, UnsupportedYield> {
        let wait = match value {
            Yield::Next | Yield::FixedUpdate | Yield::EndOfFrame => Wait::Immediate,
            Yield::Seconds(remaining) => Wait::Timer { remaining },
            Yield::Instruction(k) => Wait::Predicate(k),
            Yield::Fetch(op) | Yield::Operation(op) => Wait::External(op),
            Yield::Task(handle) => Wait::Task(handle),
            Yield::Other { type_name, .. } => {
                return Err(UnsupportedYield {
                    label: label.to_string(),
                    type_name,
                })
            }
        };
        Ok(wait)
    }

    /// Whether the task may resume, given the time since the last tick.
    /// Timers count down as a side effect.
    pub fn is_done(&mut self, elapsed: Duration) -> bool {
        match self {
            Wait::Immediate => true,
            Wait::Timer { remaining } => {
                *remaining = remaining.saturating_sub(elapsed);
                remaining.is_zero()
            }
            Wait::Predicate(k) => !k.keep_waiting(),
            Wait::External(op) => op.is_done(),
            Wait::Task(handle) => handle.is_finished(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Wait::Immediate => "immediate",
            Wait::Timer { .. } => "timer",
            Wait::Predicate(_) => "predicate",
            Wait::External(_) => "external",
            Wait::Task(_) => "task",
        }
    }
}

impl fmt::Debug for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wait::Timer { remaining } => f
                .debug_struct("Timer")
                .field("remaining", remaining)
                .finish(),
            Wait::Task(h) => f.debug_tuple("Task").field(&h.id()).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait(y: Yield) -> Wait {
        Wait::from_yield(y, "test").unwrap()
    }

    #[test]
    fn timer_independent_of_chunking() {
        let mut chunked = wait(Yield::seconds(2.0));
        for _ in 0..3 {
            assert!(!chunked.is_done(Duration::from_millis(500)));
        }
        assert!(chunked.is_done(Duration::from_millis(500)));

        let mut single = wait(Yield::seconds(2.0));
        assert!(single.is_done(Duration::from_millis(2100)));
    }

    #[test]
    fn timer_just_short_stays_pending() {
        let mut w = wait(Yield::Seconds(Duration::from_secs(1)));
        assert!(!w.is_done(Duration::from_millis(999)));
        assert!(w.is_done(Duration::from_millis(1)));
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        let mut w = wait(Yield::seconds(-3.0));
        assert!(w.is_done(Duration::ZERO));
        let mut nan = wait(Yield::seconds(f64::NAN));
        assert!(nan.is_done(Duration::ZERO));
    }

    #[test]
    fn huge_seconds_never_fire() {
        for secs in [1e20, f64::INFINITY] {
            let mut w = wait(Yield::seconds(secs));
            assert!(!w.is_done(Duration::ZERO));
            assert!(!w.is_done(Duration::from_secs(86_400 * 365)));
        }
    }

    #[test]
    fn decimal_timer_fires_on_exact_total() {
        let mut w = wait(Yield::seconds(0.1));
        for _ in 0..9 {
            assert!(!w.is_done(Duration::from_millis(10)));
        }
        assert!(w.is_done(Duration::from_millis(10)));
    }

    #[test]
    fn frame_markers_collapse_to_immediate() {
        assert_eq!(wait(Yield::FixedUpdate).kind(), "immediate");
        assert_eq!(wait(Yield::EndOfFrame).kind(), "immediate");
        assert_eq!(wait(Yield::Next).kind(), "immediate");
    }

    #[test]
    fn until_and_while_are_negations() {
        let flag = Rc::new(Cell::new(false));

        let f = flag.clone();
        let mut until = wait(Yield::until(move || f.get()));
        let f = flag.clone();
        let mut whilst = wait(Yield::while_(move || f.get()));

        assert!(!until.is_done(Duration::ZERO));
        assert!(whilst.is_done(Duration::ZERO));
        flag.set(true);
        assert!(until.is_done(Duration::ZERO));
        assert!(!whilst.is_done(Duration::ZERO));
    }

    #[test]
    fn external_follows_signal() {
        let signal = Signal::new();
        let mut w = wait(Yield::fetch(signal.clone()));
        assert_eq!(w.kind(), "external");
        assert!(!w.is_done(Duration::from_secs(60)));
        signal.complete();
        assert!(w.is_done(Duration::ZERO));
    }

    #[test]
    fn unknown_value_is_rejected_with_type() {
        let err = Wait::from_yield(Yield::other(7u64), "Example").unwrap_err();
        assert_eq!(err.type_name, "u64");
        assert_eq!(err.label, "Example");
    }
}
