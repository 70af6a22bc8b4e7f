use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::type_conversion::{to_string, TYPE_STR_NULL, TYPE_STR_UNDEFINED};

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(JsNumberType),
    Object(JsObjectType),
}

impl JsValue {
    pub fn int(i: i64) -> Self {
        JsValue::Number(JsNumberType::Integer(i))
    }

    pub fn from_f64(f: f64) -> Self {
        JsValue::Number(JsNumberType::from_f64(f))
    }

    pub fn str(s: &str) -> Self {
        JsValue::String(s.to_string())
    }

    pub fn is_nullish(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => true,
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            _ => write!(f, "{}", to_string(self)),
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(o) => match o.try_borrow() {
                Ok(o) => write!(f, "JsValue::Object({})", o.as_js_object().class_name()),
                Err(_) => write!(f, "JsValue::Object(...)"),
            },
        }
    }
}

/// Structural equality for primitives, identity for objects. `NaN` equals `NaN` here;
/// script-level `===` lives in `test_and_comparison::strict_equals`.
impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsNumberType {
    Integer(i64),
    Float(f64),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
}

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl JsNumberType {
    /// Folds an `f64` back into the split representation. Integral values become `Integer`,
    /// except `-0` which stays a float so the sign survives.
    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() {
            JsNumberType::NaN
        } else if f.is_infinite() {
            if f > 0.0 {
                JsNumberType::PositiveInfinity
            } else {
                JsNumberType::NegativeInfinity
            }
        } else if f.fract() == 0.0
            && f.abs() <= MAX_SAFE_INTEGER
            && !(f == 0.0 && f.is_sign_negative())
        {
            JsNumberType::Integer(f as i64)
        } else {
            JsNumberType::Float(f)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            JsNumberType::Integer(i) => *i as f64,
            JsNumberType::Float(f) => *f,
            JsNumberType::NaN => f64::NAN,
            JsNumberType::PositiveInfinity => f64::INFINITY,
            JsNumberType::NegativeInfinity => f64::NEG_INFINITY,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            JsNumberType::Integer(i) => *i == 0,
            JsNumberType::Float(f) => *f == 0.0,
            _ => false,
        }
    }
}

impl Display for JsNumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsNumberType::Integer(i) => write!(f, "{}", i),
            JsNumberType::Float(nf) => {
                if *nf == 0.0 {
                    write!(f, "0")
                } else {
                    write!(f, "{}", nf)
                }
            }
            JsNumberType::NaN => write!(f, "NaN"),
            JsNumberType::PositiveInfinity => write!(f, "Infinity"),
            JsNumberType::NegativeInfinity => write!(f, "-Infinity"),
        }
    }
}
