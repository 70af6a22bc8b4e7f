//! Compilation module for the JavaScript engine.
//!
//! Source text is turned into an [`Executable`] once and can then be invoked any number of
//! times against a scope. The pipeline is:
//!
//! ```text
//! JavaScript source → Parser → AST → Compiler → Bytecode → VM → Result
//! ```
//!
//! Function literals are compiled eagerly along with their enclosing script, so every
//! closure created at run time shares the `Executable` of its literal.

pub mod bytecode;
pub mod compiler;
pub mod vm;

use std::fmt;

use log::debug;

use crate::parser::ast::ProgramData;
use crate::parser::JsParser;
use crate::runner::context::EvalContext;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::lex_env::initialize_binding;
use crate::runner::ds::value::JsValue;

use self::bytecode::Chunk;
use self::compiler::Compiler;
use self::vm::Vm;

/// Name given to the executable of a whole script.
pub const SCRIPT_NAME: &str = "__script__";
/// Source label attached to everything compiled from text.
pub const SOURCE_LABEL: &str = "(javascript)";

const MAX_SOURCE_IN_ERROR: usize = 80;

/// Compiled, reusable form of a script or function body.
pub struct Executable {
    pub name: String,
    pub source_label: &'static str,
    /// Formal parameter names, bound positionally on invocation.
    pub params: Vec<String>,
    pub chunk: Chunk,
    /// Global object that free names fall back to.
    pub global: JsObjectType,
    /// Named function expressions see their own name inside their body.
    pub binds_own_name: bool,
}

impl Executable {
    /// Runs the code in `scope` with `receiver` as `this`.
    ///
    /// Parameters are bound in `scope` before the first instruction; missing arguments are
    /// `undefined` and extra ones are ignored.
    pub fn invoke(
        &self,
        ctx: &mut EvalContext,
        receiver: JsValue,
        args: Vec<JsValue>,
        scope: JsLexEnvironmentType,
    ) -> Result<JsValue, JErrorType> {
        let mut args = args.into_iter();
        for p in &self.params {
            initialize_binding(&scope, p, args.next().unwrap_or(JsValue::Undefined));
        }
        let mut vm = Vm::new(self, scope, receiver);
        vm.run(ctx)
    }

    pub fn instruction_count(&self) -> usize {
        self.chunk.code.len()
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.name)
            .field("source_label", &self.source_label)
            .field("params", &self.params)
            .field("instructions", &self.chunk.code.len())
            .finish()
    }
}

/// Compile an AST program into an executable script.
///
/// # Examples
///
/// ```
/// use viminous::parser::JsParser;
/// use viminous::runner::jit;
/// use viminous::Environment;
///
/// let env = Environment::new();
/// let ast = JsParser::parse_to_ast_from_str("var x = 5 + 3;").unwrap();
/// let executable = jit::compile(&ast, env.global_object()).unwrap();
/// assert_eq!(executable.name, "__script__");
/// ```
pub fn compile(program: &ProgramData, global: &JsObjectType) -> Result<Executable, JErrorType> {
    Compiler::new(global).compile_program(program)
}

/// Parse and compile source text.
///
/// Parse failures become a `SyntaxError` quoting the offending source.
pub fn compile_source(source: &str, global: &JsObjectType) -> Result<Executable, JErrorType> {
    let program = JsParser::parse_to_ast_from_str(source).map_err(|e| {
        let quoted: String = source.chars().take(MAX_SOURCE_IN_ERROR).collect();
        let ellipsis = if quoted.len() < source.len() { "..." } else { "" };
        JErrorType::SyntaxError(format!("{} in \"{}{}\"", e, quoted, ellipsis))
    })?;
    let executable = compile(&program, global)?;
    debug!(
        "compiled {} {} into {} instruction(s)",
        executable.name,
        executable.source_label,
        executable.instruction_count()
    );
    Ok(executable)
}

/// Compiles `source` and runs it right away in `scope`, with `receiver` as `this`.
/// `var` declarations and assignments land in `scope` itself.
pub fn eval_in_scope(
    ctx: &mut EvalContext,
    source: &str,
    scope: JsLexEnvironmentType,
    receiver: JsValue,
) -> Result<JsValue, JErrorType> {
    let executable = compile_source(source, &ctx.global_this)?;
    executable.invoke(ctx, receiver, vec![], scope)
}
