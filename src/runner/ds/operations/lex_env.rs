use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::value::JsValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub fn new_declarative_environment(outer_lex: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: HashMap::new(),
        outer: outer_lex,
    }))
}

/// Finds the nearest scope in the chain that binds `name`.
pub fn get_identifier_reference(
    lex: &JsLexEnvironmentType,
    name: &str,
) -> Option<JsLexEnvironmentType> {
    let mut current = Some(lex.clone());
    while let Some(env) = current {
        if env.borrow().has_binding(name) {
            return Some(env);
        }
        current = env.borrow().outer.clone();
    }
    None
}

pub fn resolve_binding(lex: &JsLexEnvironmentType, name: &str) -> Option<JsValue> {
    let env = get_identifier_reference(lex, name)?;
    let value = env.borrow().get_binding_value(name);
    value
}

/// Overwrites the nearest existing binding of `name`. Returns `false` when nothing binds it.
pub fn assign_binding(lex: &JsLexEnvironmentType, name: &str, value: JsValue) -> bool {
    match get_identifier_reference(lex, name) {
        Some(env) => {
            env.borrow_mut().set_mutable_binding(name, value);
            true
        }
        None => false,
    }
}

/// `var` semantics: creates `name` as `undefined` in this very scope unless it is already
/// bound here, in which case the existing value is kept.
pub fn declare_var_binding(lex: &JsLexEnvironmentType, name: &str) {
    let mut env = lex.borrow_mut();
    if !env.has_binding(name) {
        env.set_mutable_binding(name, JsValue::Undefined);
    }
}

/// Binds `name` in this very scope, replacing whatever was there.
pub fn initialize_binding(lex: &JsLexEnvironmentType, name: &str, value: JsValue) {
    lex.borrow_mut().set_mutable_binding(name, value);
}
