//! Core JavaScript value types and error handling.
//!
//! This crate provides the value model shared by the promise runtime:
//! primitive values, objects and functions with getter-aware property
//! access, and the error types thrown between them.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsObject`] - Shared objects and native functions
//! - [`JsError`] - JavaScript error objects
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`JsResult`] - Result whose error side is the thrown value
//!
//! # Examples
//!
//! ```
//! use core_types::{JsError, JsObject, Value};
//!
//! // Create JavaScript values
//! let num = Value::Smi(42);
//! assert_eq!(num.to_string(), "42");
//! assert_eq!(num.type_of(), "number");
//!
//! // An object whose `then` getter throws
//! let hostile = JsObject::new();
//! hostile.define_getter(
//!     "then",
//!     JsObject::function(|_, _| Err(JsError::type_error("no").into())),
//! );
//! assert!(hostile.get("then").is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod object;
mod value;

pub use error::{ErrorKind, JsError, JsResult};
pub use object::{JsObject, NativeFn, Property};
pub use value::Value;
