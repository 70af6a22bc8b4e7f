//! Host-facing entry points.
//!
//! An [`Environment`] owns one global object and the scope top-level code runs in. Scripts
//! reach it in two ways:
//!
//! - [`Environment::eval`] compiles and runs source right away in an existing scope, so the
//!   code can read and change the variables it finds there.
//! - [`Environment::evaluate`] compiles source once and keeps it in a single slot. The
//!   returned [`ScriptHandle`] runs whatever currently sits in that slot, each time in a
//!   fresh top-level scope. Evaluating again replaces the slot.
//!
//! ```
//! use viminous::Environment;
//! use viminous::runner::ds::value::JsValue;
//!
//! let mut env = Environment::new();
//! let handle = env.evaluate("40 + 2").unwrap();
//! assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(42));
//! ```

use std::fmt;
use std::rc::Rc;

use log::debug;
use uuid::Uuid;

use crate::runner::config::RunnerConfig;
use crate::runner::context::EvalContext;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{get, JsObjectType};
use crate::runner::ds::operations::dispatch::call_with;
use crate::runner::ds::operations::lex_env::{new_declarative_environment, resolve_binding};
use crate::runner::ds::prototypes::shared_prototypes;
use crate::runner::ds::value::JsValue;
use crate::runner::jit::{compile_source, eval_in_scope, Executable};
use crate::runner::realm::create_global_object;

pub struct Environment {
    id: Uuid,
    ctx: EvalContext,
    global_scope: JsLexEnvironmentType,
    /// The script most recently compiled by `evaluate`.
    last_compiled_script: Option<Rc<Executable>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        let prototypes = shared_prototypes();
        let global = create_global_object(&prototypes);
        let global_scope = new_declarative_environment(None);
        let ctx = EvalContext::new(global, prototypes, config, global_scope.clone());
        let id = Uuid::new_v4();
        debug!("environment {} created", id);
        Environment {
            id,
            ctx,
            global_scope,
            last_compiled_script: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The "window" object of this environment.
    pub fn global_object(&self) -> &JsObjectType {
        &self.ctx.global_this
    }

    /// Scope that [`eval`](Environment::eval) runs top-level code in.
    pub fn global_scope(&self) -> &JsLexEnvironmentType {
        &self.global_scope
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.ctx.config
    }

    /// A new scope nested in the global scope, for running code with its own locals.
    pub fn new_scope(&self) -> JsLexEnvironmentType {
        new_declarative_environment(Some(self.global_scope.clone()))
    }

    /// Runs `source` in the global scope and returns its completion value.
    pub fn eval(&mut self, source: &str) -> Result<JsValue, JErrorType> {
        let scope = self.global_scope.clone();
        self.eval_in_scope(source, &scope)
    }

    /// Runs `source` in `scope`. Variables already bound there can be read and changed, and
    /// new `var`s are added to it.
    pub fn eval_in_scope(
        &mut self,
        source: &str,
        scope: &JsLexEnvironmentType,
    ) -> Result<JsValue, JErrorType> {
        let receiver = self.enter(scope);
        eval_in_scope(&mut self.ctx, source, scope.clone(), receiver)
    }

    /// Compiles `source` into the environment's script slot, replacing what was there.
    pub fn evaluate(&mut self, source: &str) -> Result<ScriptHandle, JErrorType> {
        let executable = compile_source(source, &self.ctx.global_this)?;
        if self.last_compiled_script.is_some() {
            debug!("environment {} replaces its compiled script", self.id);
        }
        self.last_compiled_script = Some(Rc::new(executable));
        Ok(ScriptHandle {
            environment_id: self.id,
        })
    }

    /// Runs the script in the slot in a fresh top-level scope.
    pub fn run_last_script(&mut self) -> Result<JsValue, JErrorType> {
        let executable = match &self.last_compiled_script {
            Some(e) => e.clone(),
            None => {
                return Err(JErrorType::InternalError(
                    "No script has been evaluated in this environment".to_string(),
                ))
            }
        };
        let scope = new_declarative_environment(None);
        let receiver = self.enter(&scope);
        executable.invoke(&mut self.ctx, receiver, vec![], scope)
    }

    /// Calls a script or native function from the host with an explicit receiver.
    pub fn call_function(
        &mut self,
        callee: &JsValue,
        receiver: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        let scope = self.global_scope.clone();
        self.enter(&scope);
        call_with(&mut self.ctx, callee, receiver, args)
    }

    /// Reads a top-level name the way script code would: global scope first, then the
    /// global object.
    pub fn lookup(&self, name: &str) -> Result<JsValue, JErrorType> {
        match resolve_binding(&self.global_scope, name) {
            Some(v) => Ok(v),
            None => get(&self.ctx.global_this, name, self.ctx.chain_limit()),
        }
    }

    /// Host entry resets the caller state natives observe. Returns the global receiver.
    fn enter(&mut self, scope: &JsLexEnvironmentType) -> JsValue {
        let receiver = JsValue::Object(self.ctx.global_this.clone());
        self.ctx.scope = scope.clone();
        self.ctx.this_value = receiver.clone();
        receiver
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("has_compiled_script", &self.last_compiled_script.is_some())
            .finish()
    }
}

/// Runs the script currently held by the environment that issued it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptHandle {
    environment_id: Uuid,
}

impl ScriptHandle {
    pub fn environment_id(&self) -> Uuid {
        self.environment_id
    }

    pub fn invoke(&self, env: &mut Environment) -> Result<JsValue, JErrorType> {
        if env.id != self.environment_id {
            return Err(JErrorType::InternalError(format!(
                "Script handle of environment {} used with environment {}",
                self.environment_id, env.id
            )));
        }
        env.run_last_script()
    }
}
