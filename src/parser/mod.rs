mod api;
pub mod ast;
pub mod static_semantics;
mod util;

pub use api::{JsParser, ParseError};
