use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionBody;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{get, has_property, JsObject, JsObjectType, ObjectType};
use crate::runner::ds::operations::lex_env::resolve_binding;
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Nested arrays deeper than this stringify as empty, which also stops self-containing arrays.
const MAX_TO_STRING_NESTING: usize = 32;

/// The `typeof` classification of a value. `null` reports `"object"`.
pub fn type_of(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

/// `typeof name`: an identifier bound nowhere (neither in `scope` nor on `global`) is
/// `"undefined"` rather than an error.
pub fn type_of_binding(
    scope: &JsLexEnvironmentType,
    global: &JsObjectType,
    name: &str,
    max_depth: usize,
) -> Result<&'static str, JErrorType> {
    if let Some(v) = resolve_binding(scope, name) {
        return Ok(type_of(&v));
    }
    if has_property(global, name, max_depth)? {
        let v = get(global, name, max_depth)?;
        Ok(type_of(&v))
    } else {
        Ok(TYPE_STR_UNDEFINED)
    }
}

/// `ToBoolean`. A number is false only when it is zero, so `NaN` counts as true.
pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !n.is_zero(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

pub fn to_string(v: &JsValue) -> String {
    to_string_nested(v, 0)
}

fn to_string_nested(v: &JsValue, nesting: usize) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.to_string(),
        JsValue::Number(n) => n.to_string(),
        JsValue::Object(o) => object_to_string(o, nesting),
    }
}

fn object_to_string(o: &JsObjectType, nesting: usize) -> String {
    let o = o.borrow();
    let s = match &*o {
        ObjectType::Array(a) => {
            if nesting >= MAX_TO_STRING_NESTING {
                return String::new();
            }
            a.elements()
                .map(|e| match e {
                    Some(v) if !v.is_nullish() => to_string_nested(v, nesting + 1),
                    _ => String::new(),
                })
                .collect::<Vec<String>>()
                .join(",")
        }
        ObjectType::Function(f) => match f.body() {
            FunctionBody::Native(_) => format!("function {}() {{ [native code] }}", f.name()),
            FunctionBody::Compiled { executable, .. } => format!(
                "function {}({}) {{ ... }}",
                f.name(),
                executable.params.join(", ")
            ),
        },
        ObjectType::Ordinary(obj) => format!("[object {}]", obj.class_name()),
    };
    s
}

/// Property keys are canonical strings; numbers and strings naming the same key agree.
pub fn to_property_key(v: &JsValue) -> String {
    to_string(v)
}

pub fn to_number(v: &JsValue) -> JsNumberType {
    match v {
        JsValue::Undefined => JsNumberType::NaN,
        JsValue::Null => JsNumberType::Integer(0),
        JsValue::Boolean(b) => JsNumberType::Integer(if *b { 1 } else { 0 }),
        JsValue::String(s) => string_to_number(s),
        JsValue::Number(n) => *n,
        // No [[DefaultValue]] support, so objects have no numeric value.
        JsValue::Object(_) => JsNumberType::NaN,
    }
}

pub fn to_f64(v: &JsValue) -> f64 {
    to_number(v).as_f64()
}

fn string_to_number(s: &str) -> JsNumberType {
    let t = s.trim();
    if t.is_empty() {
        return JsNumberType::Integer(0);
    }
    if t.starts_with("0x") || t.starts_with("0X") {
        return match i64::from_str_radix(&t[2..], 16) {
            Ok(i) => JsNumberType::Integer(i),
            Err(_) => JsNumberType::NaN,
        };
    }
    match t {
        "Infinity" | "+Infinity" => return JsNumberType::PositiveInfinity,
        "-Infinity" => return JsNumberType::NegativeInfinity,
        _ => {}
    }
    // Rust also accepts "inf" and "nan", which are not numeric literals here.
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-')
    {
        return JsNumberType::NaN;
    }
    match t.parse::<f64>() {
        Ok(f) => JsNumberType::from_f64(f),
        Err(_) => JsNumberType::NaN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_number() {
        assert_eq!(to_number(&JsValue::str(" 42 ")), JsNumberType::Integer(42));
        assert_eq!(to_number(&JsValue::str("")), JsNumberType::Integer(0));
        assert_eq!(to_number(&JsValue::str("0x1f")), JsNumberType::Integer(31));
        assert_eq!(to_number(&JsValue::str("1.5")), JsNumberType::Float(1.5));
        assert_eq!(to_number(&JsValue::str("inf")), JsNumberType::NaN);
        assert_eq!(to_number(&JsValue::str("12px")), JsNumberType::NaN);
        assert_eq!(
            to_number(&JsValue::str("-Infinity")),
            JsNumberType::NegativeInfinity
        );
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(to_string(&JsValue::int(7)), "7");
        assert_eq!(to_string(&JsValue::from_f64(0.5)), "0.5");
        assert_eq!(to_string(&JsValue::from_f64(2.0)), "2");
        assert_eq!(to_string(&JsValue::from_f64(-0.0)), "0");
        assert_eq!(to_string(&JsValue::from_f64(f64::NAN)), "NaN");
        assert_eq!(to_string(&JsValue::from_f64(f64::NEG_INFINITY)), "-Infinity");
    }
}
