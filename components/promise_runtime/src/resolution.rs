//! The thenable resolution procedure.
//!
//! Given a target promise and a resolution value `x`, decide what the target
//! settles to:
//!
//! 1. `x` is the target itself: reject with a chaining-cycle `TypeError`.
//! 2. `x` is not an object or function: fulfill with `x`.
//! 3. Otherwise read `x.then`. A throwing read rejects; a non-callable
//!    `then` fulfills with `x`; a callable `then` is invoked with `this = x`
//!    and a fresh pair of resolve/reject capabilities.
//!
//! The capabilities of one invocation share a single guard: only the first
//! call of either has any effect, and an error thrown by `then` after that
//! call is ignored.
//!
//! The procedure runs as a loop. When a `then` calls its resolve capability
//! synchronously, the new value is handed back to the loop instead of being
//! resolved recursively, so long chains of synchronous thenables do not grow
//! the stack.

use crate::promise::{chaining_cycle_error, Handler, Promise};
use core_types::{JsObject, JsResult, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// How a resolution value should be treated.
pub(crate) enum Resolution {
    /// A plain value, or an object without a callable `then`
    Value(Value),
    /// A promise from this runtime
    Promise(Promise),
    /// A foreign thenable: the object and the `then` function read from it
    Thenable { object: Value, then: JsObject },
}

/// Classifies `x`, reading its `then` member at most once.
pub(crate) fn classify(x: Value) -> JsResult<Resolution> {
    if let Some(promise) = Promise::from_value(&x) {
        return Ok(Resolution::Promise(promise));
    }
    let then = match &x {
        Value::Object(object) => object.get("then")?,
        _ => Value::Undefined,
    };
    match then {
        Value::Object(then) if then.is_callable() => Ok(Resolution::Thenable { object: x, then }),
        _ => Ok(Resolution::Value(x)),
    }
}

/// Resolves `target` with `x`.
pub(crate) fn resolve_promise(target: &Promise, x: Value) {
    let mut next = Some(x);
    while let Some(x) = next.take() {
        next = resolve_step(target, x);
    }
}

/// One pass of the procedure. Returns the value to continue with when a
/// thenable resolved synchronously.
fn resolve_step(target: &Promise, x: Value) -> Option<Value> {
    match classify(x) {
        Err(reason) => {
            target.settle_rejected(reason);
            None
        }
        Ok(Resolution::Value(value)) => {
            target.settle_fulfilled(value);
            None
        }
        Ok(Resolution::Promise(promise)) => {
            adopt(target, &promise);
            None
        }
        Ok(Resolution::Thenable { object, then }) => call_then(target, object, &then),
    }
}

/// Follows another promise of this runtime.
fn adopt(target: &Promise, source: &Promise) {
    if source.ptr_eq(target) {
        debug!(promise = target.id(), "chaining cycle detected");
        target.settle_rejected(chaining_cycle_error());
        return;
    }
    let attempt = Attempt::new(target);
    let on_fulfilled = {
        let attempt = attempt.clone();
        Handler::new(move |value| {
            attempt.resolve(value);
            Ok(Value::Undefined)
        })
    };
    let on_rejected = Handler::new(move |reason| {
        attempt.reject(reason);
        Ok(Value::Undefined)
    });
    // The derived promise only carries `undefined`; nothing observes it.
    let _ = source.then(Some(on_fulfilled), Some(on_rejected));
}

/// Invokes a foreign `then` with guarded capabilities.
///
/// This is also the forwarding step used by `Promise::resolve` for thenables,
/// whose `then` has already been read.
pub(crate) fn call_then(target: &Promise, object: Value, then: &JsObject) -> Option<Value> {
    let attempt = Attempt::new(target);
    attempt.inner.in_call.set(true);
    let result = then.call(
        &object,
        vec![
            Value::Object(attempt.resolve_function()),
            Value::Object(attempt.reject_function()),
        ],
    );
    attempt.inner.in_call.set(false);

    if let Err(reason) = result {
        if attempt.inner.fired.replace(true) {
            debug!(promise = target.id(), "ignoring error thrown after thenable settled");
        } else {
            target.settle_rejected(reason);
            return None;
        }
    }
    attempt.inner.deferred.take()
}

/// State shared by the two capabilities of one resolution attempt.
#[derive(Clone)]
struct Attempt {
    inner: Rc<AttemptState>,
}

struct AttemptState {
    target: Promise,
    fired: Cell<bool>,
    in_call: Cell<bool>,
    deferred: RefCell<Option<Value>>,
}

impl Attempt {
    fn new(target: &Promise) -> Self {
        Self {
            inner: Rc::new(AttemptState {
                target: target.clone(),
                fired: Cell::new(false),
                in_call: Cell::new(false),
                deferred: RefCell::new(None),
            }),
        }
    }

    fn resolve(&self, value: Value) {
        let state = &self.inner;
        if state.fired.replace(true) {
            return;
        }
        if state.in_call.get() {
            // Still inside `then`: let the caller's loop pick it up.
            *state.deferred.borrow_mut() = Some(value);
        } else {
            resolve_promise(&state.target, value);
        }
    }

    fn reject(&self, reason: Value) {
        if self.inner.fired.replace(true) {
            return;
        }
        self.inner.target.settle_rejected(reason);
    }

    fn resolve_function(&self) -> JsObject {
        let attempt = self.clone();
        JsObject::function(move |_this, args| {
            attempt.resolve(args.into_iter().next().unwrap_or(Value::Undefined));
            Ok(Value::Undefined)
        })
    }

    fn reject_function(&self) -> JsObject {
        let attempt = self.clone();
        JsObject::function(move |_this, args| {
            attempt.reject(args.into_iter().next().unwrap_or(Value::Undefined));
            Ok(Value::Undefined)
        })
    }
}
