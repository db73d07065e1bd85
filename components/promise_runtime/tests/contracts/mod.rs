//! Contract tests for promise_runtime
