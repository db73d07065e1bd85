//! The `{promise, resolve, reject}` adapter used by conformance harnesses.

use crate::promise::{Promise, SettleFn};
use crate::scheduler::SchedulerRef;
use core_types::{JsObject, Value};

/// A promise together with its captured settle capabilities.
///
/// Built purely through the public constructor, the same way a test harness
/// adapter captures `resolve` and `reject` from an executor.
///
/// # Examples
///
/// ```
/// use promise_runtime::{Deferred, EventLoop, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let deferred = Deferred::new(&event_loop.scheduler());
///
/// deferred.resolve.call(Value::from("done"));
/// assert_eq!(deferred.promise.state(), PromiseState::Fulfilled(Value::from("done")));
/// ```
#[derive(Debug, Clone)]
pub struct Deferred {
    /// The pending promise
    pub promise: Promise,
    /// Fulfills `promise`
    pub resolve: SettleFn,
    /// Rejects `promise`
    pub reject: SettleFn,
}

impl Deferred {
    /// Creates a pending promise and captures its capabilities.
    pub fn new(scheduler: &SchedulerRef) -> Self {
        let mut captured = None;
        let promise = Promise::new(scheduler, |resolve, reject| {
            captured = Some((resolve, reject));
            Ok(())
        });
        let (resolve, reject) = captured.unwrap_or_else(|| promise.capabilities());
        Self {
            promise,
            resolve,
            reject,
        }
    }

    /// Returns the adapter as a script object with `promise`, `resolve` and
    /// `reject` properties.
    pub fn to_object(&self) -> JsObject {
        JsObject::new()
            .with_property("promise", self.promise.clone().into_value())
            .with_property("resolve", self.resolve.to_function())
            .with_property("reject", self.reject.to_function())
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Object(deferred.to_object())
    }
}
