//! Promise implementation following the Promise/A+ specification.
//!
//! This module holds the state machine for a single promise: construction
//! from an executor, the one-shot settle transition, the reaction queues and
//! `then` with its derived operators `catch` and `finally`.

use crate::resolution;
use crate::scheduler::SchedulerRef;
use crate::task_queue::Task;
use core_types::{JsError, JsObject, JsResult, Value};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state. The
/// outcome lives inside the variant, so a fulfilled promise cannot also carry
/// a reason.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been fulfilled with a value.
    Fulfilled(Value),
    /// The promise has been rejected with a reason.
    Rejected(Value),
}

impl PromiseState {
    /// Returns true if the promise has not settled yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, PromiseState::Pending)
    }
}

/// Which way a promise settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleKind {
    /// Fulfill with a value
    Fulfill,
    /// Reject with a reason
    Reject,
}

/// A callback registered through `then`.
///
/// It receives the fulfillment value or rejection reason. Returning `Err`
/// rejects the derived promise with the thrown value; returning `Ok` resolves
/// it through the thenable resolution procedure.
pub struct Handler {
    callback: Box<dyn FnOnce(Value) -> JsResult<Value>>,
}

impl Handler {
    /// Creates a handler from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> JsResult<Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Wraps a script value as a handler.
    ///
    /// Non-callable values yield `None`: `then` ignores handlers that are not
    /// functions. Callable values are invoked with `this = undefined`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let function = value.as_object().filter(|o| o.is_callable())?.clone();
        Some(Self::new(move |arg| function.call(&Value::Undefined, vec![arg])))
    }

    /// Calls the handler.
    pub fn call(self, arg: Value) -> JsResult<Value> {
        (self.callback)(arg)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler {{ ... }}")
    }
}

/// A handler waiting on a pending promise, and the promise it resolves.
struct Reaction {
    handler: Option<Handler>,
    derived: Promise,
}

pub(crate) struct PromiseCell {
    id: u64,
    scheduler: SchedulerRef,
    state: RefCell<PromiseState>,
    fulfill_reactions: RefCell<Vec<Reaction>>,
    reject_reactions: RefCell<Vec<Reaction>>,
}

/// A Promise.
///
/// Promises represent the eventual completion (or failure) of an
/// asynchronous operation and its resulting value. The handle is cheap to
/// clone; all clones share one state.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Handler, Promise, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let scheduler = event_loop.scheduler();
///
/// let promise = Promise::new(&scheduler, |resolve, _reject| {
///     resolve.call(Value::Smi(20));
///     Ok(())
/// });
/// let doubled = promise.then(
///     Some(Handler::new(|v| match v {
///         Value::Smi(n) => Ok(Value::Smi(n * 2)),
///         other => Ok(other),
///     })),
///     None,
/// );
///
/// assert!(doubled.is_pending());
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.state(), PromiseState::Fulfilled(Value::Smi(40)));
/// ```
#[derive(Clone)]
pub struct Promise {
    cell: Rc<PromiseCell>,
}

/// One of the two settle capabilities handed to an executor.
///
/// Calls after the promise has settled are ignored.
#[derive(Clone)]
pub struct SettleFn {
    promise: Promise,
    kind: SettleKind,
}

impl SettleFn {
    /// Settles the promise with `value`, unless it has already settled.
    pub fn call(&self, value: Value) {
        match self.kind {
            SettleKind::Fulfill => self.promise.settle_fulfilled(value),
            SettleKind::Reject => self.promise.settle_rejected(value),
        }
    }

    /// Which way this capability settles.
    pub fn kind(&self) -> SettleKind {
        self.kind
    }

    /// Exposes the capability as a script function taking one argument.
    pub fn to_function(&self) -> JsObject {
        let settle = self.clone();
        JsObject::function(move |_this, args| {
            settle.call(args.into_iter().next().unwrap_or(Value::Undefined));
            Ok(Value::Undefined)
        })
    }
}

impl fmt::Debug for SettleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettleFn")
            .field("promise", &self.promise.id())
            .field("kind", &self.kind)
            .finish()
    }
}

impl Promise {
    /// Creates a promise and runs `executor` synchronously, exactly once.
    ///
    /// The executor receives the fulfill and reject capabilities. If it
    /// returns `Err`, the thrown value becomes the rejection reason (unless
    /// the executor already settled the promise).
    pub fn new<F>(scheduler: &SchedulerRef, executor: F) -> Promise
    where
        F: FnOnce(SettleFn, SettleFn) -> JsResult<()>,
    {
        let promise = Promise::pending(scheduler);
        let (resolve, reject) = promise.capabilities();
        if let Err(reason) = executor(resolve, reject) {
            promise.settle_rejected(reason);
        }
        promise
    }

    /// Creates a pending promise with no executor.
    pub(crate) fn pending(scheduler: &SchedulerRef) -> Promise {
        let id = NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed);
        trace!(promise = id, "created");
        Promise {
            cell: Rc::new(PromiseCell {
                id,
                scheduler: scheduler.clone(),
                state: RefCell::new(PromiseState::Pending),
                fulfill_reactions: RefCell::new(Vec::new()),
                reject_reactions: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the fulfill and reject capabilities for this promise.
    pub(crate) fn capabilities(&self) -> (SettleFn, SettleFn) {
        (
            SettleFn {
                promise: self.clone(),
                kind: SettleKind::Fulfill,
            },
            SettleFn {
                promise: self.clone(),
                kind: SettleKind::Reject,
            },
        )
    }

    /// Process-unique identifier, used in log output.
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> PromiseState {
        self.cell.state.borrow().clone()
    }

    /// Returns true if the promise has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.cell.state.borrow().is_pending()
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// The scheduler this promise defers its reactions to.
    pub fn scheduler(&self) -> &SchedulerRef {
        &self.cell.scheduler
    }

    /// Wraps the promise as a script value.
    ///
    /// The value keeps the promise's identity: converting it back with
    /// [`Promise::from_value`] yields the same promise.
    pub fn into_value(self) -> Value {
        let host: Rc<dyn Any> = self.cell;
        Value::NativeObject(host)
    }

    /// Recovers a promise from a script value, if it holds one.
    pub fn from_value(value: &Value) -> Option<Promise> {
        match value {
            Value::NativeObject(host) => host
                .clone()
                .downcast::<PromiseCell>()
                .ok()
                .map(|cell| Promise { cell }),
            _ => None,
        }
    }

    pub(crate) fn settle_fulfilled(&self, value: Value) {
        self.settle(SettleKind::Fulfill, value);
    }

    pub(crate) fn settle_rejected(&self, reason: Value) {
        self.settle(SettleKind::Reject, reason);
    }

    /// The single transition out of `Pending`. First call wins.
    fn settle(&self, kind: SettleKind, value: Value) {
        {
            let mut state = self.cell.state.borrow_mut();
            if !state.is_pending() {
                trace!(promise = self.id(), ?kind, "settle ignored, already settled");
                return;
            }
            *state = match kind {
                SettleKind::Fulfill => PromiseState::Fulfilled(value.clone()),
                SettleKind::Reject => PromiseState::Rejected(value.clone()),
            };
        }
        trace!(promise = self.id(), ?kind, "settled");

        let fulfill = self.cell.fulfill_reactions.take();
        let reject = self.cell.reject_reactions.take();
        let reactions = match kind {
            SettleKind::Fulfill => fulfill,
            SettleKind::Reject => reject,
        };
        for reaction in reactions {
            schedule_handler(
                self.scheduler(),
                kind,
                reaction.handler,
                value.clone(),
                reaction.derived,
            );
        }
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new promise resolved from whichever handler runs. A missing
    /// fulfillment handler passes the value through; a missing rejection
    /// handler passes the reason through. Handlers always run from the
    /// scheduler, never inside this call, even when the promise has already
    /// settled.
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Promise {
        let derived = Promise::pending(self.scheduler());

        let settled = {
            let state = self.cell.state.borrow();
            match &*state {
                PromiseState::Pending => None,
                PromiseState::Fulfilled(value) => Some((SettleKind::Fulfill, value.clone())),
                PromiseState::Rejected(reason) => Some((SettleKind::Reject, reason.clone())),
            }
        };

        match settled {
            None => {
                self.cell.fulfill_reactions.borrow_mut().push(Reaction {
                    handler: on_fulfilled,
                    derived: derived.clone(),
                });
                self.cell.reject_reactions.borrow_mut().push(Reaction {
                    handler: on_rejected,
                    derived: derived.clone(),
                });
            }
            Some((SettleKind::Fulfill, value)) => {
                schedule_handler(self.scheduler(), SettleKind::Fulfill, on_fulfilled, value, derived.clone())
            }
            Some((SettleKind::Reject, reason)) => {
                schedule_handler(self.scheduler(), SettleKind::Reject, on_rejected, reason, derived.clone())
            }
        }

        derived
    }

    /// Adds a rejection handler. Same as `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Handler) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// Runs `on_settle` once this promise settles either way.
    ///
    /// The original value or reason passes through unchanged unless
    /// `on_settle` throws or returns something that rejects; that outcome
    /// then replaces it. A returned thenable is waited on before passing
    /// the original outcome through.
    pub fn finally<F>(&self, on_settle: F) -> Promise
    where
        F: FnOnce() -> JsResult<Value> + 'static,
    {
        let callback = Rc::new(RefCell::new(Some(on_settle)));
        let run = move || -> JsResult<Value> {
            match callback.borrow_mut().take() {
                Some(f) => f(),
                None => Ok(Value::Undefined),
            }
        };
        let run = Rc::new(run);

        let scheduler = self.scheduler().clone();
        let on_fulfilled = {
            let run = run.clone();
            let scheduler = scheduler.clone();
            Handler::new(move |value| {
                let settled = Promise::resolve(&scheduler, run()?);
                Ok(settled
                    .then(Some(Handler::new(move |_| Ok(value))), None)
                    .into_value())
            })
        };
        let on_rejected = Handler::new(move |reason| {
            let settled = Promise::resolve(&scheduler, run()?);
            Ok(settled
                .then(Some(Handler::new(move |_| Err(reason))), None)
                .into_value())
        });

        self.then(Some(on_fulfilled), Some(on_rejected))
    }
}

/// Defers one handler invocation and routes its outcome into `derived`.
fn schedule_handler(
    scheduler: &SchedulerRef,
    kind: SettleKind,
    handler: Option<Handler>,
    argument: Value,
    derived: Promise,
) {
    trace!(promise = derived.id(), ?kind, "reaction scheduled");
    scheduler.defer(Task::new(move || {
        let outcome = match (handler, kind) {
            (Some(handler), _) => handler.call(argument),
            (None, SettleKind::Fulfill) => Ok(argument),
            (None, SettleKind::Reject) => Err(argument),
        };
        match outcome {
            Ok(x) => resolution::resolve_promise(&derived, x),
            Err(reason) => derived.settle_rejected(reason),
        }
        Ok(())
    }));
}

impl PromiseCell {
    /// Empties both reaction queues and returns the promises they would
    /// have resolved.
    fn take_derived(&self) -> Vec<Promise> {
        let fulfill = self.fulfill_reactions.take();
        let reject = self.reject_reactions.take();
        fulfill
            .into_iter()
            .chain(reject)
            .map(|reaction| reaction.derived)
            .collect()
    }
}

impl Drop for PromiseCell {
    // An abandoned `then` chain is a linked list of cells. Release it level by
    // level so dropping the head does not recurse once per link.
    fn drop(&mut self) {
        let mut orphans = self.take_derived();
        while let Some(promise) = orphans.pop() {
            if Rc::strong_count(&promise.cell) == 1 {
                orphans.extend(promise.cell.take_derived());
            }
        }
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.id())
            .field("state", &*self.cell.state.borrow())
            .finish()
    }
}

/// The error a promise is rejected with when it is resolved to itself.
pub fn chaining_cycle_error() -> Value {
    JsError::type_error("Chaining cycle detected for promise").into_value()
}
