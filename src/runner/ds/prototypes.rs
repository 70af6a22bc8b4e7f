//! The three prototype objects every environment shares: `ObjectPrototype`,
//! `FunctionPrototype` and `ArrayPrototype`.
//!
//! The method tables are static. The objects themselves hold `Rc`s, so they are built once
//! per thread and handed out by reference; the engine never crosses threads.

use crate::runner::context::EvalContext;
use crate::runner::ds::array_object::parse_array_index;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_native_function, NativeFn};
use crate::runner::ds::object::{
    has_own_property, new_object, put, wrap_object, JsObjectType, ObjectType, OrdinaryObject,
    CLASS_ARRAY, CLASS_FUNCTION,
};
use crate::runner::ds::operations::dispatch::call_with;
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;

lazy_static! {
    static ref OBJECT_PROTOTYPE_METHODS: Vec<(&'static str, NativeFn)> = vec![
        ("hasOwnProperty", object_has_own_property as NativeFn),
        ("toString", object_to_string as NativeFn),
    ];
    static ref FUNCTION_PROTOTYPE_METHODS: Vec<(&'static str, NativeFn)> =
        vec![("call", function_call as NativeFn)];
    static ref ARRAY_PROTOTYPE_METHODS: Vec<(&'static str, NativeFn)> = vec![];
}

thread_local! {
    static SHARED_PROTOTYPES: SharedPrototypes = SharedPrototypes::build();
}

#[derive(Clone)]
pub struct SharedPrototypes {
    pub object_prototype: JsObjectType,
    pub function_prototype: JsObjectType,
    pub array_prototype: JsObjectType,
}

impl SharedPrototypes {
    fn build() -> Self {
        let object_prototype = new_object(None);
        let function_prototype = wrap_object(ObjectType::Ordinary(OrdinaryObject::new(
            CLASS_FUNCTION,
            Some(object_prototype.clone()),
        )));
        let array_prototype = wrap_object(ObjectType::Ordinary(OrdinaryObject::new(
            CLASS_ARRAY,
            Some(object_prototype.clone()),
        )));
        let prototypes = SharedPrototypes {
            object_prototype,
            function_prototype,
            array_prototype,
        };
        install_methods(&prototypes, &prototypes.object_prototype, &OBJECT_PROTOTYPE_METHODS);
        install_methods(
            &prototypes,
            &prototypes.function_prototype,
            &FUNCTION_PROTOTYPE_METHODS,
        );
        install_methods(&prototypes, &prototypes.array_prototype, &ARRAY_PROTOTYPE_METHODS);
        prototypes
    }
}

fn install_methods(
    prototypes: &SharedPrototypes,
    target: &JsObjectType,
    methods: &[(&'static str, NativeFn)],
) {
    for (name, native) in methods {
        let f = new_native_function(name, *native, prototypes);
        // Writes to fresh objects cannot fail.
        let _ = put(target, name, JsValue::Object(f), false);
    }
}

/// The prototypes of the current thread. Every call returns handles to the same objects.
pub fn shared_prototypes() -> SharedPrototypes {
    SHARED_PROTOTYPES.with(|p| p.clone())
}

fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_property_key(args.first().unwrap_or(&JsValue::Undefined));
    let found = match &this {
        JsValue::Object(o) => has_own_property(o, &key),
        JsValue::String(s) => {
            key == "length"
                || match parse_array_index(&key) {
                    Some(i) => i < s.chars().count(),
                    None => false,
                }
        }
        _ => false,
    };
    Ok(JsValue::Boolean(found))
}

fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::String(_) => "String",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::Object(o) => o.borrow().as_js_object().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

fn function_call(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call_with(ctx, &this, this_arg, args.collect())
}
