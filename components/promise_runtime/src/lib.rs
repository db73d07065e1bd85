//! Promise/A+ promises on an injected scheduler.
//!
//! This crate provides a single-threaded promise implementation and the
//! event loop that drives it:
//! - Promise state machine with `then`, `catch` and `finally`
//! - The thenable resolution procedure, robust against hostile thenables
//! - `resolve`, `reject`, `all`, `race`, `any` and `all_settled`
//! - Event loop with task, microtask and timer queues on a virtual clock
//!
//! # Overview
//!
//! - [`Promise`] - Promise/A+ compliant promise
//! - [`Scheduler`] - The "run later, in order" capability promises need
//! - [`EventLoop`] - A [`Scheduler`] with timers, for hosts and tests
//! - [`Deferred`] - `{promise, resolve, reject}` harness adapter
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use promise_runtime::{EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(())));
//! event_loop.run_until_done().unwrap();
//! ```
//!
//! ## Promise Usage
//!
//! ```
//! use promise_runtime::{EventLoop, Handler, Promise, PromiseState};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! let scheduler = event_loop.scheduler();
//!
//! let all = Promise::all(&scheduler, vec![
//!     Promise::resolve(&scheduler, 3).into_value(),
//!     Value::Smi(42),
//! ]);
//! let joined = all.then(Some(Handler::new(|v| Ok(Value::from(v.to_string())))), None);
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(joined.state(), PromiseState::Fulfilled(Value::from("3,42")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod deferred;
pub mod error;
pub mod event_loop;
pub mod promise;
mod resolution;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use combinators::SettledOutcome;
pub use deferred::Deferred;
pub use error::{RuntimeError, RuntimeResult};
pub use event_loop::{EventLoop, EventLoopConfig, ReactionQueue};
pub use promise::{chaining_cycle_error, Handler, Promise, PromiseState, SettleFn, SettleKind};
pub use scheduler::{Scheduler, SchedulerRef};
pub use task_queue::{Task, TaskQueue, TimerQueue};
