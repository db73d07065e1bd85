//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, JsResult, Value};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_clone() {
        let kind1 = ErrorKind::TypeError;
        let kind2 = kind1.clone();
        assert!(matches!(kind2, ErrorKind::TypeError));
    }

    #[test]
    fn test_error_kind_equality() {
        assert_eq!(ErrorKind::TypeError, ErrorKind::TypeError);
        assert_ne!(ErrorKind::Error, ErrorKind::TypeError);
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(JsError::error("m").kind, ErrorKind::Error);
        assert_eq!(JsError::type_error("m").kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let error = JsError::type_error("undefined is not a function");
        assert_eq!(error.to_string(), "TypeError: undefined is not a function");
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&JsError::error("x"));
    }
}

#[cfg(test)]
mod js_result_tests {
    use super::*;

    fn fails() -> JsResult<Value> {
        Err(JsError::type_error("nope").into())
    }

    fn throws_plain_value() -> JsResult<Value> {
        Err(Value::Smi(7))
    }

    #[test]
    fn test_error_converts_into_thrown_value() {
        assert_eq!(fails(), Err(Value::Error(JsError::type_error("nope"))));
    }

    #[test]
    fn test_any_value_can_be_thrown() {
        assert_eq!(throws_plain_value(), Err(Value::Smi(7)));
    }
}
