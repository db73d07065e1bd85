//! Host-level errors raised by the event loop.
//!
//! Script-level failures never surface here: they travel as rejection
//! reasons. These errors describe a run that could not complete.

use core_types::Value;
use thiserror::Error;

/// An event loop run that did not finish cleanly.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A task threw and nothing caught it
    #[error("uncaught exception in task: {0}")]
    Uncaught(Value),

    /// The run executed more tasks than the configured limit allows
    #[error("task limit of {limit} exceeded")]
    TaskLimitExceeded {
        /// The configured limit
        limit: usize,
    },
}

/// Result type for event loop operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;
