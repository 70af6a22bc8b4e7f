use crate::runner::ds::value::JsValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type JsLexEnvironmentType = Rc<RefCell<LexEnvironment>>;

/// One link of a scope chain: the bindings declared at this level plus the enclosing scope.
pub struct LexEnvironment {
    pub inner: HashMap<String, JsValue>,
    pub outer: Option<JsLexEnvironmentType>,
}

impl LexEnvironment {
    pub fn has_binding(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn get_binding_value(&self, name: &str) -> Option<JsValue> {
        self.inner.get(name).cloned()
    }

    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) {
        match self.inner.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.inner.insert(name.to_string(), value);
            }
        }
    }
}
