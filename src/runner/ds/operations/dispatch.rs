use log::warn;

use crate::runner::context::EvalContext;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::call_function_object;
use crate::runner::ds::object::{new_object, JsObjectType};
use crate::runner::ds::value::JsValue;

fn as_callable(callee: &JsValue) -> Option<&JsObjectType> {
    match callee {
        JsValue::Object(o) if o.borrow().is_callable() => Some(o),
        _ => None,
    }
}

/// Calls `callee` with an explicit receiver. Anything that is not a function object is a
/// type error naming the value.
pub fn call_with(
    ctx: &mut EvalContext,
    callee: &JsValue,
    receiver: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let function = match as_callable(callee) {
        Some(f) => f.clone(),
        None => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                callee
            )))
        }
    };
    if ctx.call_depth >= ctx.config.max_call_depth {
        warn!(
            "call depth limit of {} reached, aborting script",
            ctx.config.max_call_depth
        );
        return Err(JErrorType::StackOverflow(format!(
            "Maximum call depth of {} exceeded",
            ctx.config.max_call_depth
        )));
    }
    ctx.call_depth += 1;
    let result = call_function_object(ctx, &function, receiver, args);
    ctx.call_depth -= 1;
    result
}

/// Calls `callee` with the global object as receiver, the non-strict default for `this`.
pub fn call_default(
    ctx: &mut EvalContext,
    callee: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let receiver = JsValue::Object(ctx.global_this.clone());
    call_with(ctx, callee, receiver, args)
}

/// `new F(args)`: a fresh object inheriting from `F.prototype` is passed to `F` as receiver.
/// Whatever `F` returns is discarded; the result is always the new object.
pub fn with_constructor(
    ctx: &mut EvalContext,
    constructor: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let function = match as_callable(constructor) {
        Some(f) => f.clone(),
        None => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a constructor",
                constructor
            )))
        }
    };
    let prototype = match ctx.get(&function, "prototype")? {
        JsValue::Object(p) => p,
        _ => ctx.prototypes.object_prototype.clone(),
    };
    let instance = new_object(Some(prototype));
    call_with(ctx, constructor, JsValue::Object(instance.clone()), args)?;
    Ok(JsValue::Object(instance))
}
