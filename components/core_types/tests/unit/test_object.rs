//! Unit tests for JsObject

use core_types::{JsError, JsObject, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn function_receives_this_and_args() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let f = JsObject::function(move |this, args| {
        s.borrow_mut().push(this.clone());
        s.borrow_mut().extend(args);
        Ok(Value::Undefined)
    });

    f.call(&Value::Smi(1), vec![Value::Smi(2), Value::Smi(3)])
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]
    );
}

#[test]
fn function_can_carry_properties() {
    let f = JsObject::function(|_, _| Ok(Value::Undefined)).with_property("then", 5);
    assert!(f.is_callable());
    assert_eq!(f.get("then"), Ok(Value::Smi(5)));
}

#[test]
fn getter_may_redefine_its_own_property() {
    let obj = JsObject::new();
    obj.define_getter(
        "once",
        JsObject::function(|this, _| {
            if let Value::Object(o) = this {
                o.set("once", Value::from("replaced"));
            }
            Ok(Value::from("first"))
        }),
    );

    assert_eq!(obj.get("once"), Ok(Value::from("first")));
    assert_eq!(obj.get("once"), Ok(Value::from("replaced")));
}

#[test]
fn thrown_errors_surface_from_call() {
    let f = JsObject::function(|_, _| Err(JsError::error("thrown").into()));
    assert_eq!(
        f.call(&Value::Undefined, vec![]),
        Err(Value::Error(JsError::error("thrown")))
    );
}

#[test]
fn data_properties_skip_getters() {
    let obj = JsObject::new().with_property("a", 1);
    obj.define_getter("b", JsObject::function(|_, _| Ok(Value::Null)));
    let props = obj.data_properties();
    assert_eq!(props, vec![("a".to_string(), Value::Smi(1))]);
}
