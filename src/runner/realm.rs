//! Global object bootstrap.
//!
//! Every [`Environment`](crate::runner::api::Environment) owns one global object ("window").
//! It is a plain object that inherits from the shared `ObjectPrototype` and carries the
//! default global bindings.

use log::debug;

use crate::runner::context::EvalContext;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_native_function, NativeFn};
use crate::runner::ds::object::{
    clone_object, literal_put, new_object, same_object, wrap_object, JsObjectType, ObjectType,
    OrdinaryObject, CLASS_GLOBAL,
};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::prototypes::SharedPrototypes;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::jit::eval_in_scope;

pub const GLOBAL_SELF_BINDING: &str = "window";
pub const EVAL_BINDING: &str = "eval";
pub const OBJECT_BINDING: &str = "Object";

lazy_static! {
    static ref GLOBAL_FUNCTIONS: Vec<(&'static str, NativeFn)> = vec![
        (EVAL_BINDING, global_eval as NativeFn),
        ("p", global_print as NativeFn),
    ];
}

/// Builds a global object with all default bindings installed.
pub fn create_global_object(prototypes: &SharedPrototypes) -> JsObjectType {
    let global = wrap_object(ObjectType::Ordinary(OrdinaryObject::new(
        CLASS_GLOBAL,
        Some(prototypes.object_prototype.clone()),
    )));

    for (name, native) in GLOBAL_FUNCTIONS.iter() {
        let f = new_native_function(name, *native, prototypes);
        literal_put(global.clone(), name, JsValue::Object(f));
    }

    let object_ctor = create_object_constructor(prototypes);
    let global = literal_put(global, OBJECT_BINDING, JsValue::Object(object_ctor));
    let global = literal_put(global, "undefined", JsValue::Undefined);
    let global = literal_put(global, "NaN", JsValue::Number(JsNumberType::NaN));
    let global = literal_put(
        global,
        "Infinity",
        JsValue::Number(JsNumberType::PositiveInfinity),
    );
    let self_ref = JsValue::Object(global.clone());
    let global = literal_put(global, GLOBAL_SELF_BINDING, self_ref);

    debug!("global object created with {} binding(s)", GLOBAL_FUNCTIONS.len() + 5);
    global
}

/// `Object` gets its own `prototype`: a copy of the shared `ObjectPrototype` methods that
/// itself inherits from `ObjectPrototype`. Extending `Object.prototype` from script only
/// touches this copy, so other environments never see it.
fn create_object_constructor(prototypes: &SharedPrototypes) -> JsObjectType {
    let ctor = new_native_function(OBJECT_BINDING, object_constructor, prototypes);
    let local_prototype = clone_object(
        &prototypes.object_prototype,
        Some(prototypes.object_prototype.clone()),
    );
    literal_put(ctor, "prototype", JsValue::Object(local_prototype))
}

/// `eval(source)` runs `source` in the caller's scope with the caller's `this`. Anything
/// other than a string is handed back untouched.
fn global_eval(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match args.into_iter().next() {
        Some(JsValue::String(source)) => {
            let scope = ctx.scope.clone();
            let receiver = ctx.this_value.clone();
            eval_in_scope(ctx, &source, scope, receiver)
        }
        Some(other) => Ok(other),
        None => Ok(JsValue::Undefined),
    }
}

/// `Object(value)`: objects pass through, anything else yields a fresh object inheriting
/// from this environment's `Object.prototype`. Under `new`, the receiver is already that
/// object.
fn object_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let Some(JsValue::Object(o)) = args.first() {
        return Ok(JsValue::Object(o.clone()));
    }
    let global = ctx.global_this.clone();
    let prototype = match ctx.get(&global, OBJECT_BINDING)? {
        JsValue::Object(ctor) => match ctx.get(&ctor, "prototype")? {
            JsValue::Object(p) => p,
            _ => ctx.prototypes.object_prototype.clone(),
        },
        _ => ctx.prototypes.object_prototype.clone(),
    };
    if let JsValue::Object(receiver) = &this {
        let fresh = receiver
            .borrow()
            .as_js_object()
            .get_prototype_of()
            .map(|p| same_object(&p, &prototype))
            .unwrap_or(false);
        if fresh {
            return Ok(this);
        }
    }
    Ok(JsValue::Object(new_object(Some(prototype))))
}

/// Debug print: writes each argument on its own line and returns the first one.
fn global_print(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    for a in &args {
        println!("{}", to_string(a));
    }
    Ok(args.into_iter().next().unwrap_or(JsValue::Undefined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::get;
    use crate::runner::ds::prototypes::shared_prototypes;

    fn global() -> JsObjectType {
        create_global_object(&shared_prototypes())
    }

    #[test]
    fn window_refers_to_itself() {
        let g = global();
        match get(&g, GLOBAL_SELF_BINDING, 8).unwrap() {
            JsValue::Object(o) => assert!(same_object(&o, &g)),
            v => panic!("window is {:?}", v),
        }
    }

    #[test]
    fn object_prototype_is_a_copy_per_global() {
        let a = global();
        let b = global();
        let proto_of = |g: &JsObjectType| match get(g, OBJECT_BINDING, 8).unwrap() {
            JsValue::Object(ctor) => match get(&ctor, "prototype", 8).unwrap() {
                JsValue::Object(p) => p,
                v => panic!("prototype is {:?}", v),
            },
            v => panic!("Object is {:?}", v),
        };
        let pa = proto_of(&a);
        let pb = proto_of(&b);
        assert!(!same_object(&pa, &pb));
        assert!(!same_object(&pa, &shared_prototypes().object_prototype));
        match get(&pa, "hasOwnProperty", 8).unwrap() {
            JsValue::Object(_) => {}
            v => panic!("hasOwnProperty is {:?}", v),
        }
    }
}
