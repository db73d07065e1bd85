//! End-to-end usage scenarios
//!
//! Chains and combinators driven by timers on the virtual clock, checked
//! through their JSON view the way a script would print them.

use core_types::{JsError, Value};
use integration_tests::{call_arg, thenable, Harness};
use promise_runtime::{EventLoop, EventLoopConfig, Handler, Promise, PromiseState, ReactionQueue};
use std::sync::Once;
use std::time::Duration;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A promise fulfilled by a timer.
fn later(h: &Harness, value: impl Into<Value>, delay_ms: u64) -> Promise {
    let d = h.deferred();
    let resolve = d.resolve.clone();
    let value = value.into();
    h.after(delay_ms, move || resolve.call(value));
    d.promise
}

fn json(state: PromiseState) -> serde_json::Value {
    match state {
        PromiseState::Fulfilled(v) => serde_json::json!({ "fulfilled": v }),
        PromiseState::Rejected(r) => serde_json::json!({ "rejected": r }),
        PromiseState::Pending => serde_json::json!("pending"),
    }
}

#[test]
fn chained_transformations() {
    init_tracing();
    let h = Harness::new();
    let p = later(&h, 1, 10)
        .then(
            Some(Handler::new(|v| match v {
                Value::Smi(n) => Ok(Value::Smi(n + 1)),
                other => Ok(other),
            })),
            None,
        )
        .then(
            Some(Handler::new(|v| Err(JsError::type_error(format!("too big: {}", v)).into()))),
            None,
        )
        .catch(Handler::new(|reason| Ok(Value::from(reason.to_string()))));
    h.run().unwrap();

    assert_eq!(
        p.state(),
        PromiseState::Fulfilled(Value::from("TypeError: too big: 2"))
    );
}

#[test]
fn all_waits_for_the_slowest_input() {
    let h = Harness::new();
    let s = h.scheduler().clone();
    let p = Promise::all(
        &s,
        vec![
            later(&h, "a", 30).into_value(),
            Value::from("b"),
            later(&h, "c", 10).into_value(),
        ],
    );

    h.event_loop.advance_by(Duration::from_millis(20)).unwrap();
    assert!(p.is_pending());

    h.run().unwrap();
    assert_eq!(json(p.state()), serde_json::json!({ "fulfilled": ["a", "b", "c"] }));
    assert_eq!(h.event_loop.now(), Duration::from_millis(30));
}

#[test]
fn all_accepts_thenables_and_empty_input() {
    let h = Harness::new();
    let s = h.scheduler().clone();
    let foreign = thenable(|_, args| call_arg(&args, 0, Value::Smi(9)));
    let p = Promise::all(&s, vec![foreign, Value::Smi(1)]);
    let empty = Promise::all(&s, Vec::<Value>::new());
    h.run().unwrap();

    assert_eq!(json(p.state()), serde_json::json!({ "fulfilled": [9, 1] }));
    assert_eq!(empty.state(), PromiseState::Fulfilled(Value::Array(vec![])));
}

#[test]
fn race_settles_with_the_earliest_timer() {
    let h = Harness::new();
    let s = h.scheduler().clone();
    let p = Promise::race(
        &s,
        vec![later(&h, "slow", 50).into_value(), later(&h, "fast", 5).into_value()],
    );
    let never = Promise::race(&s, Vec::<Value>::new());
    h.run().unwrap();

    assert_eq!(p.state(), PromiseState::Fulfilled(Value::from("fast")));
    assert!(never.is_pending());
}

#[test]
fn any_and_all_settled_on_empty_input() {
    let h = Harness::new();
    let s = h.scheduler().clone();
    let any = Promise::any(&s, Vec::<Value>::new());
    let settled = Promise::all_settled(&s, Vec::<Value>::new());
    h.run().unwrap();

    assert_eq!(any.state(), PromiseState::Rejected(Value::Array(vec![])));
    assert_eq!(settled.state(), PromiseState::Fulfilled(Value::Array(vec![])));
}

#[test]
fn all_settled_mixes_outcomes() {
    let h = Harness::new();
    let s = h.scheduler().clone();
    let p = Promise::all_settled(
        &s,
        vec![
            later(&h, 1, 20).into_value(),
            h.rejected(JsError::type_error("bad")).into_value(),
        ],
    );
    h.run().unwrap();

    assert_eq!(
        json(p.state()),
        serde_json::json!({ "fulfilled": [
            { "status": "fulfilled", "value": 1 },
            { "status": "rejected", "reason": { "name": "TypeError", "message": "bad" } },
        ] })
    );
}

#[test]
fn finally_runs_cleanup_on_both_paths() {
    let h = Harness::new();
    let cleaned = std::rc::Rc::new(std::cell::Cell::new(0));
    let c1 = cleaned.clone();
    let c2 = cleaned.clone();
    let ok = later(&h, "ok", 5).finally(move || {
        c1.set(c1.get() + 1);
        Ok(Value::Undefined)
    });
    let failed = h.rejected("failed").finally(move || {
        c2.set(c2.get() + 1);
        Ok(Value::Undefined)
    });
    h.run().unwrap();

    assert_eq!(cleaned.get(), 2);
    assert_eq!(ok.state(), PromiseState::Fulfilled(Value::from("ok")));
    assert_eq!(failed.state(), PromiseState::Rejected(Value::from("failed")));
}

#[test]
fn microtask_configuration_gives_the_same_results() {
    let event_loop = EventLoop::with_config(
        EventLoopConfig::default().with_reaction_queue(ReactionQueue::Microtask),
    );
    let s = event_loop.scheduler();
    let p = Promise::all(
        &s,
        vec![
            Promise::resolve(&s, 1).into_value(),
            Promise::resolve(&s, 2)
                .then(Some(Handler::new(|_| Ok(Value::Smi(20)))), None)
                .into_value(),
        ],
    );
    event_loop.run_until_done().unwrap();
    assert_eq!(json(p.state()), serde_json::json!({ "fulfilled": [1, 20] }));
}
