//! State handed to everything that runs script code or native functions.

use crate::runner::config::RunnerConfig;
use crate::runner::ds::array_object::new_array;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_native_function, NativeFn};
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{get, new_object, JsObjectType};
use crate::runner::ds::prototypes::SharedPrototypes;
use crate::runner::ds::value::JsValue;

pub struct EvalContext {
    /// The global object ("window") of the owning environment.
    pub global_this: JsObjectType,
    pub prototypes: SharedPrototypes,
    pub config: RunnerConfig,
    /// Number of calls currently on the host stack.
    pub call_depth: usize,
    /// Scope of the code that made the current native call. `eval` runs in it.
    pub scope: JsLexEnvironmentType,
    /// Receiver of the code that made the current native call.
    pub this_value: JsValue,
}

impl EvalContext {
    pub fn new(
        global_this: JsObjectType,
        prototypes: SharedPrototypes,
        config: RunnerConfig,
        scope: JsLexEnvironmentType,
    ) -> Self {
        EvalContext {
            this_value: JsValue::Object(global_this.clone()),
            global_this,
            prototypes,
            config,
            call_depth: 0,
            scope,
        }
    }

    pub fn chain_limit(&self) -> usize {
        self.config.max_prototype_chain_depth
    }

    pub fn get(&self, object: &JsObjectType, key: &str) -> Result<JsValue, JErrorType> {
        get(object, key, self.chain_limit())
    }

    pub fn new_object(&self) -> JsObjectType {
        new_object(Some(self.prototypes.object_prototype.clone()))
    }

    pub fn new_array(&self, elements: Vec<JsValue>) -> JsObjectType {
        new_array(elements, Some(self.prototypes.array_prototype.clone()))
    }

    pub fn new_native_function(&self, name: &str, native: NativeFn) -> JsObjectType {
        new_native_function(name, native, &self.prototypes)
    }
}
