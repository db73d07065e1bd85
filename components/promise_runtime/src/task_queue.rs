//! Task, microtask and timer queue management.
//!
//! This module provides the queues used by the event loop. Tasks and
//! microtasks run in FIFO order; timers are ordered by deadline on the
//! loop's virtual clock, with insertion order breaking ties.

use core_types::JsResult;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

/// A unit of deferred work.
///
/// Promise reactions, `setTimeout` callbacks and forwarding jobs are all
/// tasks. A task that throws aborts the current event loop run.
pub struct Task {
    callback: Box<dyn FnOnce() -> JsResult<()>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    ///
    /// # Returns
    ///
    /// The result of the task execution; `Err` carries the thrown value.
    pub fn run(self) -> JsResult<()> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A FIFO queue of tasks.
///
/// The event loop keeps one for macrotasks and one for microtasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug)]
struct Timer {
    deadline: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // Reversed so the max-heap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Timers waiting for the virtual clock to reach their deadline.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    /// Creates a new empty TimerQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to become runnable at `deadline`.
    pub fn schedule(&mut self, deadline: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Timer {
            deadline,
            seq,
            task,
        });
    }

    /// Returns the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|t| t.deadline)
    }

    /// Removes every timer due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<Task> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|t| t.deadline <= now) {
            if let Some(timer) = self.heap.pop() {
                due.push(timer.task);
            }
        }
        due
    }

    /// Returns true if no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of pending timers.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
