//! Static constructors and aggregate operators.
//!
//! Everything here is built from `Promise::new`, `then` and the resolution
//! procedure. Every input goes through [`Promise::resolve`] first, so plain
//! values, foreign thenables and promises are handled the same way.

use crate::promise::{Handler, Promise, SettleFn};
use crate::resolution::{self, Resolution};
use crate::scheduler::SchedulerRef;
use crate::task_queue::Task;
use core_types::{JsObject, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The outcome of one input to [`Promise::all_settled`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettledOutcome {
    /// The input fulfilled with this value
    Fulfilled(Value),
    /// The input rejected with this reason
    Rejected(Value),
}

impl SettledOutcome {
    /// Converts the outcome into a `{status, value}` or `{status, reason}`
    /// record.
    pub fn into_value(self) -> Value {
        let record = match self {
            SettledOutcome::Fulfilled(value) => JsObject::new()
                .with_property("status", "fulfilled")
                .with_property("value", value),
            SettledOutcome::Rejected(reason) => JsObject::new()
                .with_property("status", "rejected")
                .with_property("reason", reason),
        };
        Value::Object(record)
    }
}

/// Index-aligned slots filled in as inputs settle.
struct Collector {
    slots: RefCell<Vec<Value>>,
    remaining: Cell<usize>,
}

impl Collector {
    fn new(len: usize) -> Rc<Self> {
        Rc::new(Self {
            slots: RefCell::new(vec![Value::Undefined; len]),
            remaining: Cell::new(len),
        })
    }

    /// Stores `value` at `index`; returns the full list once every slot is in.
    fn store(&self, index: usize, value: Value) -> Option<Value> {
        self.slots.borrow_mut()[index] = value;
        let remaining = self.remaining.get() - 1;
        self.remaining.set(remaining);
        if remaining == 0 {
            Some(Value::Array(self.slots.borrow().clone()))
        } else {
            None
        }
    }
}

/// A handler that forwards its argument to a settle capability.
fn forward(settle: &SettleFn) -> Handler {
    let settle = settle.clone();
    Handler::new(move |value| {
        settle.call(value);
        Ok(Value::Undefined)
    })
}

impl Promise {
    /// Returns a promise for `value`.
    ///
    /// A promise of this runtime is returned unchanged. A thenable is
    /// followed on a scheduled task; its `then` is read exactly once, here,
    /// and a throwing read rejects the result at once. Any other value
    /// fulfills immediately.
    pub fn resolve(scheduler: &SchedulerRef, value: impl Into<Value>) -> Promise {
        let value = value.into();
        match resolution::classify(value) {
            Ok(Resolution::Promise(promise)) => promise,
            Ok(Resolution::Value(value)) => Promise::new(scheduler, |resolve, _| {
                resolve.call(value);
                Ok(())
            }),
            Ok(Resolution::Thenable { object, then }) => {
                let promise = Promise::pending(scheduler);
                let target = promise.clone();
                scheduler.defer(Task::new(move || {
                    if let Some(next) = resolution::call_then(&target, object, &then) {
                        resolution::resolve_promise(&target, next);
                    }
                    Ok(())
                }));
                promise
            }
            Err(reason) => Promise::reject(scheduler, reason),
        }
    }

    /// Returns a promise already rejected with `reason`.
    pub fn reject(scheduler: &SchedulerRef, reason: impl Into<Value>) -> Promise {
        let reason = reason.into();
        Promise::new(scheduler, |_, reject| {
            reject.call(reason);
            Ok(())
        })
    }

    /// Waits for every input to fulfill.
    ///
    /// Fulfills with the values in input order, or rejects with the first
    /// rejection reason. An empty input fulfills at once with `[]`.
    pub fn all<I>(scheduler: &SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        Promise::new(scheduler, |resolve, reject| {
            if items.is_empty() {
                resolve.call(Value::Array(Vec::new()));
                return Ok(());
            }
            let collector = Collector::new(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let collector = collector.clone();
                let resolve = resolve.clone();
                let on_fulfilled = Handler::new(move |value| {
                    if let Some(values) = collector.store(index, value) {
                        resolve.call(values);
                    }
                    Ok(Value::Undefined)
                });
                Promise::resolve(scheduler, item).then(Some(on_fulfilled), Some(forward(&reject)));
            }
            Ok(())
        })
    }

    /// Settles like whichever input settles first.
    ///
    /// An empty input never settles.
    pub fn race<I>(scheduler: &SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Promise::new(scheduler, |resolve, reject| {
            for item in items {
                Promise::resolve(scheduler, item).then(Some(forward(&resolve)), Some(forward(&reject)));
            }
            Ok(())
        })
    }

    /// Fulfills with the first input to fulfill.
    ///
    /// If every input rejects, rejects with the reasons in input order. An
    /// empty input rejects at once with `[]`.
    pub fn any<I>(scheduler: &SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        Promise::new(scheduler, |resolve, reject| {
            if items.is_empty() {
                reject.call(Value::Array(Vec::new()));
                return Ok(());
            }
            let collector = Collector::new(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let collector = collector.clone();
                let reject = reject.clone();
                let on_rejected = Handler::new(move |reason| {
                    if let Some(reasons) = collector.store(index, reason) {
                        reject.call(reasons);
                    }
                    Ok(Value::Undefined)
                });
                Promise::resolve(scheduler, item).then(Some(forward(&resolve)), Some(on_rejected));
            }
            Ok(())
        })
    }

    /// Waits for every input to settle and never rejects.
    ///
    /// Fulfills with one [`SettledOutcome`] record per input, in input order.
    pub fn all_settled<I>(scheduler: &SchedulerRef, items: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        Promise::new(scheduler, |resolve, _| {
            if items.is_empty() {
                resolve.call(Value::Array(Vec::new()));
                return Ok(());
            }
            let collector = Collector::new(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let record = {
                    let collector = collector.clone();
                    let resolve = resolve.clone();
                    move |outcome: SettledOutcome| {
                        if let Some(records) = collector.store(index, outcome.into_value()) {
                            resolve.call(records);
                        }
                    }
                };
                let record = Rc::new(record);
                let on_fulfilled = {
                    let record = record.clone();
                    Handler::new(move |value| {
                        record(SettledOutcome::Fulfilled(value));
                        Ok(Value::Undefined)
                    })
                };
                let on_rejected = Handler::new(move |reason| {
                    record(SettledOutcome::Rejected(reason));
                    Ok(Value::Undefined)
                });
                Promise::resolve(scheduler, item).then(Some(on_fulfilled), Some(on_rejected));
            }
            Ok(())
        })
    }
}
