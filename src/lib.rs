//! # viminous - embeddable JavaScript execution core
//!
//! A small JavaScript engine meant to live inside a host process:
//! - PEG parser producing an ESTree-like AST
//! - Single-pass compiler to stack bytecode and a VM to run it
//! - Prototype-based object model with shared `Object`/`Function`/`Array` prototypes
//! - Two script entry points: caller-scoped `eval` and cached, re-runnable `evaluate`
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use viminous::parser::JsParser;
//!
//! let code = "var x = 5 + 3;";
//! let ast = JsParser::parse_to_ast_from_str(code).unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running code with `eval`
//!
//! `eval` runs in a scope that outlives the call, so later code sees earlier variables:
//!
//! ```
//! use viminous::Environment;
//! use viminous::runner::ds::value::JsValue;
//!
//! let mut env = Environment::new();
//! env.eval("var a = 20;").unwrap();
//! assert_eq!(env.eval("a + 22").unwrap(), JsValue::int(42));
//! ```
//!
//! ### Compiling once with `evaluate`
//!
//! ```
//! use viminous::Environment;
//! use viminous::runner::ds::value::JsValue;
//!
//! let mut env = Environment::new();
//! let handle = env.evaluate("function sq(n) { return n * n; } sq(7)").unwrap();
//! assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(49));
//! // Each invocation gets a fresh top-level scope.
//! assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(49));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - Runtime
//!   - **[`runner::ds`]** - Data structures (values, objects, scopes) and operations on them
//!   - **[`runner::jit`]** - Bytecode compiler and VM
//!   - **[`runner::api`]** - `Environment` and `ScriptHandle`
//!
//! The library logs through the [`log`](https://docs.rs/log) facade and installs no logger.

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;

pub use runner::api::{Environment, ScriptHandle};
pub use runner::config::RunnerConfig;
pub use runner::ds::error::JErrorType;
