//! Runtime: object model, compiler and VM, global environment and the host API.
//!
//! - **[`ds`]** - values, objects, scopes, shared prototypes and the operations on them
//! - **[`jit`]** - bytecode compiler and stack VM behind [`jit::Executable`]
//! - **[`realm`]** - global object bootstrap
//! - **[`api`]** - [`api::Environment`] with its `eval`/`evaluate` entry points

pub mod api;
pub mod config;
pub mod context;
pub mod ds;
pub mod jit;
pub mod realm;
