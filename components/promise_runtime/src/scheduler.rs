//! The deferred-callback capability promises are built on.

use crate::task_queue::Task;
use std::rc::Rc;

/// Runs tasks later, preserving the order in which they were deferred.
///
/// This is the only environment capability the promise core needs. A
/// deferred task must not run before the call that deferred it returns.
pub trait Scheduler {
    /// Queues `task` to run after the current synchronous work.
    fn defer(&self, task: Task);
}

/// Shared handle to a scheduler, held by every promise it serves.
pub type SchedulerRef = Rc<dyn Scheduler>;
