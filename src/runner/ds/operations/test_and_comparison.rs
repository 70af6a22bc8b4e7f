use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{get, JsObjectType};
use crate::runner::ds::operations::type_conversion::{to_f64, to_number};
use crate::runner::ds::value::{JsNumberType, JsValue};
use std::rc::Rc;

fn same_number(a: &JsNumberType, b: &JsNumberType) -> bool {
    match (a, b) {
        (JsNumberType::NaN, _) | (_, JsNumberType::NaN) => false,
        (JsNumberType::Integer(x), JsNumberType::Integer(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

/// `===`
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => same_number(x, y),
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `==`
pub fn loose_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Null) | (JsValue::Null, JsValue::Undefined) => true,
        (JsValue::Number(x), JsValue::String(_)) => same_number(x, &to_number(b)),
        (JsValue::String(_), JsValue::Number(y)) => same_number(&to_number(a), y),
        (JsValue::Boolean(_), _) => loose_equals(&JsValue::Number(to_number(a)), b),
        (_, JsValue::Boolean(_)) => loose_equals(a, &JsValue::Number(to_number(b))),
        _ => strict_equals(a, b),
    }
}

/// Relational comparison shared by `<`, `<=`, `>` and `>=`. `None` means "undefined"
/// (some operand was NaN), which makes every relational operator false.
pub fn compare_values(a: &JsValue, b: &JsValue) -> Option<std::cmp::Ordering> {
    if let (JsValue::String(x), JsValue::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    to_f64(a).partial_cmp(&to_f64(b))
}

/// `object instanceof F`: whether `F.prototype` appears in the prototype chain of `object`.
pub fn instance_of(
    value: &JsValue,
    constructor: &JsObjectType,
    max_depth: usize,
) -> Result<bool, JErrorType> {
    let object = match value {
        JsValue::Object(o) => o,
        _ => return Ok(false),
    };
    let target = match get(constructor, "prototype", max_depth)? {
        JsValue::Object(p) => p,
        _ => {
            return Err(JErrorType::TypeError(
                "Function has non-object prototype in instanceof check".to_string(),
            ))
        }
    };
    let mut current = object.borrow().as_js_object().get_prototype_of();
    let mut depth = 0;
    while let Some(p) = current {
        if Rc::ptr_eq(&p, &target) {
            return Ok(true);
        }
        depth += 1;
        if depth > max_depth {
            return Err(JErrorType::InternalError(format!(
                "Prototype chain longer than {} links",
                max_depth
            )));
        }
        current = p.borrow().as_js_object().get_prototype_of();
    }
    Ok(false)
}
