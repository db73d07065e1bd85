//! Event loop implementation.
//!
//! This module provides a single-threaded event loop that coordinates task,
//! microtask and timer execution on a virtual clock. It implements
//! [`Scheduler`], so promises can be driven by it directly.

use crate::error::{RuntimeError, RuntimeResult};
use crate::scheduler::{Scheduler, SchedulerRef};
use crate::task_queue::{Task, TaskQueue, TimerQueue};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// Which queue deferred promise reactions are placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionQueue {
    /// The macrotask queue, interleaved with other tasks in FIFO order
    #[default]
    Task,
    /// The microtask queue, drained after every task
    Microtask,
}

/// Event loop configuration.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoopConfig, ReactionQueue};
///
/// let config = EventLoopConfig::default()
///     .with_reaction_queue(ReactionQueue::Microtask)
///     .with_task_limit(10_000);
/// assert_eq!(config.task_limit, Some(10_000));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLoopConfig {
    /// Queue used by [`Scheduler::defer`]
    pub reaction_queue: ReactionQueue,
    /// Maximum number of tasks one `run_until_done` may execute
    pub task_limit: Option<usize>,
}

impl EventLoopConfig {
    /// Selects the queue promise reactions are deferred onto
    pub fn with_reaction_queue(mut self, queue: ReactionQueue) -> Self {
        self.reaction_queue = queue;
        self
    }

    /// Caps the number of tasks a single run may execute
    pub fn with_task_limit(mut self, limit: usize) -> Self {
        self.task_limit = Some(limit);
        self
    }
}

/// The event loop.
///
/// Each turn of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks in the microtask queue
/// 3. When both queues are empty, advances the virtual clock to the next
///    timer deadline and moves every timer due at that instant onto the
///    task queue
///
/// The loop is shared behind an `Rc` and uses interior mutability, so
/// running tasks may enqueue more work on the same loop.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Task};
/// use std::time::Duration;
///
/// let event_loop = EventLoop::new();
/// event_loop.set_timeout(Duration::from_millis(100), Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert_eq!(event_loop.now(), Duration::from_millis(100));
/// ```
#[derive(Debug, Default)]
pub struct EventLoop {
    config: EventLoopConfig,
    task_queue: RefCell<TaskQueue>,
    microtask_queue: RefCell<TaskQueue>,
    timers: RefCell<TimerQueue>,
    now: Cell<Duration>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and default configuration.
    pub fn new() -> Rc<Self> {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            ..Self::default()
        })
    }

    /// Returns this loop as a promise scheduler handle.
    pub fn scheduler(self: &Rc<Self>) -> SchedulerRef {
        self.clone()
    }

    /// Returns the loop's configuration.
    pub fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.task_queue.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    ///
    /// The microtask will be executed after the current task completes.
    pub fn enqueue_microtask(&self, microtask: Task) {
        self.microtask_queue.borrow_mut().enqueue(microtask);
    }

    /// Schedules `task` to run once the virtual clock has advanced by `delay`.
    pub fn set_timeout(&self, delay: Duration, task: Task) {
        let deadline = self.now.get() + delay;
        self.timers.borrow_mut().schedule(deadline, task);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtask_queue.borrow().is_empty()
    }

    /// Returns the number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Returns true if there is no queued work and no pending timer.
    pub fn is_idle(&self) -> bool {
        self.is_task_queue_empty() && self.is_microtask_queue_empty() && self.pending_timers() == 0
    }

    /// Runs the event loop until all tasks, microtasks and timers are processed.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Uncaught`] if a task throws, or
    /// [`RuntimeError::TaskLimitExceeded`] if the configured limit is hit.
    pub fn run_until_done(&self) -> RuntimeResult<()> {
        let mut executed = 0usize;
        loop {
            let ran = self.turn(&mut executed)?;
            if ran == 0 && !self.advance_clock() {
                return Ok(());
            }
        }
    }

    /// Runs ready work without advancing the clock.
    ///
    /// Stops when both queues are empty; timers that are not yet due stay
    /// pending.
    pub fn run_until_stalled(&self) -> RuntimeResult<()> {
        let mut executed = 0usize;
        while self.turn(&mut executed)? > 0 {}
        Ok(())
    }

    /// Advances the virtual clock by `delay`, running everything that becomes
    /// ready on the way.
    pub fn advance_by(&self, delay: Duration) -> RuntimeResult<()> {
        let target = self.now.get() + delay;
        self.run_until_stalled()?;
        loop {
            match self.timers.borrow().next_deadline() {
                Some(deadline) if deadline <= target => {}
                _ => break,
            }
            self.advance_clock();
            self.run_until_stalled()?;
        }
        self.now.set(target);
        Ok(())
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    ///
    /// Returns `true` if any work was performed.
    pub fn process_one_cycle(&self) -> RuntimeResult<bool> {
        let mut executed = 0usize;
        Ok(self.turn(&mut executed)? > 0)
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are processed before this
    /// method returns.
    pub fn run_all_microtasks(&self) -> RuntimeResult<()> {
        let mut executed = 0usize;
        self.drain_microtasks(&mut executed)
    }

    fn turn(&self, executed: &mut usize) -> RuntimeResult<usize> {
        let before = *executed;
        // The borrow must end before the task runs: tasks enqueue more work.
        let task = self.task_queue.borrow_mut().dequeue();
        if let Some(task) = task {
            self.execute(task, executed)?;
        }
        self.drain_microtasks(executed)?;
        Ok(*executed - before)
    }

    fn drain_microtasks(&self, executed: &mut usize) -> RuntimeResult<()> {
        loop {
            let microtask = self.microtask_queue.borrow_mut().dequeue();
            match microtask {
                Some(microtask) => self.execute(microtask, executed)?,
                None => return Ok(()),
            }
        }
    }

    fn execute(&self, task: Task, executed: &mut usize) -> RuntimeResult<()> {
        if let Some(limit) = self.config.task_limit {
            if *executed >= limit {
                warn!(limit, "event loop task limit exceeded");
                return Err(RuntimeError::TaskLimitExceeded { limit });
            }
        }
        *executed += 1;
        task.run().map_err(RuntimeError::Uncaught)
    }

    /// Jumps the clock to the next timer deadline and releases due timers.
    fn advance_clock(&self) -> bool {
        let mut timers = self.timers.borrow_mut();
        let Some(deadline) = timers.next_deadline() else {
            return false;
        };
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
        let due = timers.take_due(self.now.get());
        drop(timers);

        debug!(now_ms = self.now.get().as_millis() as u64, count = due.len(), "timers fired");
        let mut queue = self.task_queue.borrow_mut();
        for task in due {
            queue.enqueue(task);
        }
        true
    }
}

impl Scheduler for EventLoop {
    fn defer(&self, task: Task) {
        match self.config.reaction_queue {
            ReactionQueue::Task => self.enqueue_task(task),
            ReactionQueue::Microtask => self.enqueue_microtask(task),
        }
    }
}
