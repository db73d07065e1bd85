//! JavaScript value representation.
//!
//! This module provides the core `Value` enum that represents every value a
//! promise can be fulfilled with, rejected with, or resolved to.

use crate::{JsError, JsObject};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Represents any JavaScript value.
///
/// Primitive values are stored inline. Objects, functions and host objects
/// are reference types: cloning a `Value` shares them and equality compares
/// identity.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert_eq!(undefined.type_of(), "undefined");
/// assert_eq!(number.to_string(), "42");
/// assert_eq!(float.type_of(), "number");
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(std::string::String),
    /// Ordered list of values, compared element-wise
    Array(Vec<Value>),
    /// An error object
    Error(JsError),
    /// Script-visible object or function
    Object(JsObject),
    /// Host object (promises, etc.), compared by identity
    NativeObject(Rc<dyn Any>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
            Value::NativeObject(_) => write!(f, "NativeObject(...)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::NativeObject(a), Value::NativeObject(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns the JavaScript typeof result for this value.
    ///
    /// ```
    /// use core_types::{JsObject, Value};
    ///
    /// assert_eq!(Value::Null.type_of(), "object");
    /// assert_eq!(Value::Object(JsObject::function(|_, _| Ok(Value::Undefined))).type_of(), "function");
    /// ```
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // JavaScript quirk
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Object(o) if o.is_callable() => "function",
            Value::Array(_) | Value::Error(_) | Value::Object(_) | Value::NativeObject(_) => {
                "object"
            }
        }
    }

    /// Returns true for objects and functions (anything that may carry
    /// properties). `null` is not an object here.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Error(_) | Value::Object(_) | Value::NativeObject(_)
        )
    }

    /// Returns true if the value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Object(o) if o.is_callable())
    }

    /// Returns the object handle if this is a script object or function.
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Implementation of Display trait for JavaScript string conversion.
///
/// This follows JavaScript's `String()` conversion rules:
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Array(vec![Value::Smi(1), Value::Smi(2)]).to_string(), "1,2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    // null and undefined elements print as empty
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Error(e) => write!(f, "{}", e),
            Value::Object(o) if o.is_callable() => write!(f, "function () {{ [native code] }}"),
            Value::Object(_) | Value::NativeObject(_) => write!(f, "[object Object]"),
        }
    }
}

/// JSON view of a value, in the manner of `JSON.stringify`.
///
/// `undefined` and functions serialize as `null`, errors as
/// `{"name": ..., "message": ...}`, and objects as their data properties.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Smi(n) => serializer.serialize_i32(*n),
            Value::Double(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Double(_) => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Error(e) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", &e.kind.to_string())?;
                map.serialize_entry("message", &e.message)?;
                map.end()
            }
            Value::Object(o) if o.is_callable() => serializer.serialize_none(),
            Value::Object(o) => {
                let properties = o.data_properties();
                let mut map = serializer.serialize_map(Some(properties.len()))?;
                for (key, value) in &properties {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::NativeObject(_) => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<JsError> for Value {
    fn from(e: JsError) -> Self {
        Value::Error(e)
    }
}

impl From<JsObject> for Value {
    fn from(o: JsObject) -> Self {
        Value::Object(o)
    }
}
