use std::rc::Rc;

use log::trace;

use crate::runner::context::EvalContext;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{
    new_object, wrap_object, JsObject, JsObjectType, ObjectBase, ObjectType, CLASS_FUNCTION,
};
use crate::runner::ds::operations::lex_env::new_declarative_environment;
use crate::runner::ds::prototypes::SharedPrototypes;
use crate::runner::ds::value::JsValue;
use crate::runner::jit::Executable;

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

#[derive(Clone)]
pub enum FunctionBody {
    /// Host routine, called directly.
    Native(NativeFn),
    /// Script function: compiled code plus the scope captured where it was created.
    Compiled {
        executable: Rc<Executable>,
        scope: JsLexEnvironmentType,
    },
}

pub struct FunctionObject {
    base: ObjectBase,
    name: String,
    body: FunctionBody,
}

impl FunctionObject {
    pub fn new(name: &str, body: FunctionBody, prototype: Option<JsObjectType>) -> Self {
        FunctionObject {
            base: ObjectBase::new(CLASS_FUNCTION, prototype),
            name: name.to_string(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }
}

impl JsObject for FunctionObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

/// Creates a function object whose method lookups go through `FunctionPrototype` and whose
/// `prototype` property is a fresh object, ready to serve as the prototype of `new` instances.
pub fn new_function_object(
    name: &str,
    body: FunctionBody,
    prototypes: &SharedPrototypes,
) -> JsObjectType {
    let mut f = FunctionObject::new(name, body, Some(prototypes.function_prototype.clone()));
    f.put_own(
        "prototype",
        JsValue::Object(new_object(Some(prototypes.object_prototype.clone()))),
    );
    wrap_object(ObjectType::Function(f))
}

pub fn new_native_function(
    name: &str,
    native: NativeFn,
    prototypes: &SharedPrototypes,
) -> JsObjectType {
    new_function_object(name, FunctionBody::Native(native), prototypes)
}

/// Runs `function` with an explicit receiver.
///
/// Natives get `(receiver, args)` as is. Compiled functions run in a new scope chained to
/// their closure scope, with the parameters bound there; errors come back unchanged.
pub fn call_function_object(
    ctx: &mut EvalContext,
    function: &JsObjectType,
    receiver: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (name, body) = match function.borrow().as_function() {
        Some(f) => (f.name().to_string(), f.body().clone()),
        None => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                JsValue::Object(function.clone())
            )))
        }
    };
    trace!("call {} with {} argument(s)", name, args.len());
    match body {
        FunctionBody::Native(native) => native(ctx, receiver, args),
        FunctionBody::Compiled { executable, scope } => {
            let local = new_declarative_environment(Some(scope));
            executable.invoke(ctx, receiver, args, local)
        }
    }
}
