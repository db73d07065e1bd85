//! Script-visible objects and functions.
//!
//! A [`JsObject`] is a shared property bag. Giving it a native call behaviour
//! turns it into a function, so a function can carry properties too (a
//! function with a `then` member is a valid thenable).

use crate::{JsError, JsResult, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Signature of a native function body: `(this, args) -> result`.
pub type NativeFn = dyn Fn(&Value, Vec<Value>) -> JsResult<Value>;

/// A property slot on an object.
#[derive(Clone)]
pub enum Property {
    /// A plain data property
    Data(Value),
    /// An accessor property; the getter runs on every read
    Getter(JsObject),
}

struct ObjectData {
    properties: RefCell<Vec<(String, Property)>>,
    call: Option<Box<NativeFn>>,
}

/// A reference to a JavaScript object.
///
/// Cloning the handle shares the object; equality is identity.
///
/// # Examples
///
/// ```
/// use core_types::{JsObject, Value};
///
/// let add = JsObject::function(|_this, args| {
///     let sum = args.iter().map(|v| match v {
///         Value::Smi(n) => *n,
///         _ => 0,
///     }).sum();
///     Ok(Value::Smi(sum))
/// });
///
/// let result = add.call(&Value::Undefined, vec![Value::Smi(2), Value::Smi(3)]);
/// assert_eq!(result, Ok(Value::Smi(5)));
/// ```
#[derive(Clone)]
pub struct JsObject {
    inner: Rc<ObjectData>,
}

impl JsObject {
    /// Creates an empty plain object.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectData {
                properties: RefCell::new(Vec::new()),
                call: None,
            }),
        }
    }

    /// Creates a callable object backed by a native closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value, Vec<Value>) -> JsResult<Value> + 'static,
    {
        Self {
            inner: Rc::new(ObjectData {
                properties: RefCell::new(Vec::new()),
                call: Some(Box::new(f)),
            }),
        }
    }

    /// Builder form of [`JsObject::set`].
    pub fn with_property(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Defines or overwrites a data property.
    pub fn set(&self, key: &str, value: Value) {
        self.define(key, Property::Data(value));
    }

    /// Defines an accessor property whose getter runs on every read.
    pub fn define_getter(&self, key: &str, getter: JsObject) {
        self.define(key, Property::Getter(getter));
    }

    fn define(&self, key: &str, property: Property) {
        let mut properties = self.inner.properties.borrow_mut();
        match properties.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = property,
            None => properties.push((key.to_string(), property)),
        }
    }

    /// Reads a property.
    ///
    /// Missing properties read as `undefined`. Getters are invoked with
    /// `this` bound to the object, and whatever they throw is propagated.
    pub fn get(&self, key: &str) -> JsResult<Value> {
        // Clone the slot out so a getter may mutate this object.
        let property = self
            .inner
            .properties
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.clone());

        match property {
            None => Ok(Value::Undefined),
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Getter(getter)) => {
                getter.call(&Value::Object(self.clone()), Vec::new())
            }
        }
    }

    /// Returns the data properties in definition order. Accessors are skipped.
    pub fn data_properties(&self) -> Vec<(String, Value)> {
        self.inner
            .properties
            .borrow()
            .iter()
            .filter_map(|(k, p)| match p {
                Property::Data(v) => Some((k.clone(), v.clone())),
                Property::Getter(_) => None,
            })
            .collect()
    }

    /// Returns true if the object has call behaviour.
    pub fn is_callable(&self) -> bool {
        self.inner.call.is_some()
    }

    /// Calls the object as a function.
    ///
    /// Calling a non-callable object throws a `TypeError`.
    pub fn call(&self, this: &Value, args: Vec<Value>) -> JsResult<Value> {
        match &self.inner.call {
            Some(f) => f(this, args),
            None => Err(JsError::type_error("object is not a function").into()),
        }
    }

    /// Returns true if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &JsObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_callable() {
            return write!(f, "Function {{ ... }}");
        }
        let keys: Vec<String> = self
            .inner
            .properties
            .borrow()
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        f.debug_struct("JsObject").field("keys", &keys).finish()
    }
}
