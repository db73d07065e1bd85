//! Unit tests for Promise

use super::init_tracing;
use core_types::{ErrorKind, JsError, Value};
use promise_runtime::{Deferred, EventLoop, Handler, Promise, PromiseState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn record(log: &Rc<RefCell<Vec<Value>>>) -> Handler {
    let log = log.clone();
    Handler::new(move |v| {
        log.borrow_mut().push(v.clone());
        Ok(v)
    })
}

#[test]
fn new_promise_is_pending() {
    let el = EventLoop::new();
    let promise = Promise::new(&el.scheduler(), |_, _| Ok(()));
    assert!(matches!(promise.state(), PromiseState::Pending));
}

#[test]
fn resolve_changes_state_to_fulfilled() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    d.resolve.call(Value::Smi(42));
    assert_eq!(d.promise.state(), PromiseState::Fulfilled(Value::Smi(42)));
}

#[test]
fn reject_changes_state_to_rejected() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    d.reject.call(JsError::type_error("test").into());
    assert!(matches!(d.promise.state(), PromiseState::Rejected(_)));
}

#[test]
fn cannot_resolve_already_fulfilled_promise() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    d.resolve.call(Value::Smi(42));
    d.resolve.call(Value::Smi(100)); // Should be ignored
    assert_eq!(d.promise.state(), PromiseState::Fulfilled(Value::Smi(42)));
}

#[test]
fn cannot_resolve_already_rejected_promise() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    d.reject.call(Value::from("no"));
    d.resolve.call(Value::Smi(42)); // Should be ignored
    assert_eq!(d.promise.state(), PromiseState::Rejected(Value::from("no")));
}

#[test]
fn executor_resolving_with_a_promise_stores_it_as_is() {
    let el = EventLoop::new();
    let s = el.scheduler();
    let inner = Promise::resolve(&s, 1).into_value();
    let i = inner.clone();
    let outer = Promise::new(&s, move |resolve, _| {
        resolve.call(i);
        Ok(())
    });
    assert_eq!(outer.state(), PromiseState::Fulfilled(inner));
}

#[test]
fn then_returns_new_promise() {
    let el = EventLoop::new();
    let promise = Promise::resolve(&el.scheduler(), 1);
    let chained = promise.then(None, None);
    assert!(!chained.ptr_eq(&promise));
    assert!(chained.is_pending());
}

#[test]
fn scenario_resolve_42_then_identity() {
    init_tracing();
    let el = EventLoop::new();
    let p = Promise::resolve(&el.scheduler(), 42).then(Some(Handler::new(Ok)), None);
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::Smi(42)));
}

#[test]
fn handlers_fire_in_registration_order() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    let log = Rc::new(RefCell::new(vec![]));

    for i in 0..3 {
        let log = log.clone();
        d.promise.then(
            Some(Handler::new(move |_| {
                log.borrow_mut().push(Value::Smi(i));
                Ok(Value::Undefined)
            })),
            None,
        );
    }
    d.resolve.call(Value::Undefined);
    el.run_until_done().unwrap();

    assert_eq!(*log.borrow(), vec![Value::Smi(0), Value::Smi(1), Value::Smi(2)]);
}

#[test]
fn then_on_settled_promise_never_runs_synchronously() {
    let el = EventLoop::new();
    let p = Promise::resolve(&el.scheduler(), 1);
    let called = Rc::new(Cell::new(false));
    let c = called.clone();
    p.then(
        Some(Handler::new(move |v| {
            c.set(true);
            Ok(v)
        })),
        None,
    );
    assert!(!called.get());
    el.run_until_done().unwrap();
    assert!(called.get());
}

#[test]
fn rejection_skips_fulfillment_handlers_until_caught() {
    let el = EventLoop::new();
    let log = Rc::new(RefCell::new(vec![]));
    let p = Promise::reject(&el.scheduler(), "bad")
        .then(Some(record(&log)), None)
        .then(Some(record(&log)), None)
        .catch(Handler::new(|reason| Ok(Value::from(format!("caught {}", reason)))));
    el.run_until_done().unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::from("caught bad")));
}

#[test]
fn returning_a_promise_from_a_handler_adopts_it() {
    let el = EventLoop::new();
    let s = el.scheduler();
    let later = Deferred::new(&s);
    let l = later.promise.clone();
    let p = Promise::resolve(&s, 1).then(Some(Handler::new(move |_| Ok(l.into_value()))), None);

    el.run_until_done().unwrap();
    assert!(p.is_pending());

    later.resolve.call(Value::from("adopted"));
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::from("adopted")));
}

#[test]
fn returning_the_derived_promise_is_a_cycle() {
    let el = EventLoop::new();
    let slot: Rc<RefCell<Option<Promise>>> = Rc::new(RefCell::new(None));
    let s = slot.clone();
    let derived = Promise::resolve(&el.scheduler(), 1).then(
        Some(Handler::new(move |_| {
            Ok(s.borrow().clone().map(Promise::into_value).unwrap_or(Value::Undefined))
        })),
        None,
    );
    *slot.borrow_mut() = Some(derived.clone());

    el.run_until_done().unwrap();
    match derived.state() {
        PromiseState::Rejected(Value::Error(e)) => {
            assert_eq!(e.kind, ErrorKind::TypeError);
            assert!(e.message.contains("Chaining cycle"));
        }
        other => panic!("expected a cycle TypeError, got {:?}", other),
    }
}

#[test]
fn finally_passes_value_through() {
    let el = EventLoop::new();
    let ran = Rc::new(Cell::new(false));
    let r = ran.clone();
    let p = Promise::resolve(&el.scheduler(), "finally").finally(move || {
        r.set(true);
        Ok(Value::from("ignored"))
    });
    el.run_until_done().unwrap();
    assert!(ran.get());
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::from("finally")));
}

#[test]
fn finally_passes_reason_through() {
    let el = EventLoop::new();
    let p = Promise::reject(&el.scheduler(), "error finally").finally(|| Ok(Value::Undefined));
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Rejected(Value::from("error finally")));
}

#[test]
fn finally_throwing_replaces_outcome() {
    let el = EventLoop::new();
    let p = Promise::resolve(&el.scheduler(), 1).finally(|| Err(Value::from("replaced")));
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Rejected(Value::from("replaced")));
}

#[test]
fn finally_throwing_replaces_rejection_reason() {
    let el = EventLoop::new();
    let ran = Rc::new(Cell::new(false));
    let r = ran.clone();
    let p = Promise::reject(&el.scheduler(), "original").finally(move || {
        r.set(true);
        Err(Value::from("cleanup failed"))
    });
    el.run_until_done().unwrap();
    assert!(ran.get());
    assert_eq!(p.state(), PromiseState::Rejected(Value::from("cleanup failed")));
}

#[test]
fn finally_returning_rejected_promise_replaces_outcome() {
    let el = EventLoop::new();
    let s = el.scheduler();
    let inner = s.clone();
    let p = Promise::resolve(&s, 1)
        .finally(move || Ok(Promise::reject(&inner, "from finally").into_value()));
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Rejected(Value::from("from finally")));
}

#[test]
fn finally_waits_for_returned_promise() {
    let el = EventLoop::new();
    let s = el.scheduler();
    let gate = Deferred::new(&s);
    let g = gate.promise.clone();
    let p = Promise::resolve(&s, "original").finally(move || Ok(g.into_value()));

    el.run_until_done().unwrap();
    assert!(p.is_pending());

    gate.resolve.call(Value::from("gate value"));
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::from("original")));
}

#[test]
fn handler_from_script_function() {
    let el = EventLoop::new();
    let double = Value::Object(core_types::JsObject::function(|_, args| match args.first() {
        Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
        _ => Ok(Value::Undefined),
    }));
    let p = Promise::resolve(&el.scheduler(), 21).then(Handler::from_value(&double), None);
    el.run_until_done().unwrap();
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::Smi(42)));
}

#[test]
fn dropping_a_long_pending_chain() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    let mut tail = d.promise.clone();
    for _ in 0..50_000 {
        tail = tail.then(Some(Handler::new(Ok)), None);
    }
    drop(tail);
    drop(d);
    assert!(el.is_idle());
}

#[test]
fn long_chain_settles_after_partial_drop() {
    let el = EventLoop::new();
    let d = Deferred::new(&el.scheduler());
    let mut tail = d.promise.clone();
    for _ in 0..1_000 {
        tail = tail.then(Some(Handler::new(Ok)), None);
    }
    d.resolve.call(Value::from("end"));
    drop(d);
    el.run_until_done().unwrap();
    assert_eq!(tail.state(), PromiseState::Fulfilled(Value::from("end")));
}
