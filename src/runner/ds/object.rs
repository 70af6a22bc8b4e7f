use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::{JsNumberType, JsValue};
use indexmap::IndexMap;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub const CLASS_OBJECT: &str = "Object";
pub const CLASS_ARRAY: &str = "Array";
pub const CLASS_FUNCTION: &str = "Function";
pub const CLASS_GLOBAL: &str = "Window";

pub enum ObjectType {
    Ordinary(OrdinaryObject),
    Function(FunctionObject),
    Array(ArrayObject),
}

impl ObjectType {
    pub fn is_callable(&self) -> bool {
        match self {
            ObjectType::Function(_) => true,
            _ => false,
        }
    }

    pub fn as_js_object(&self) -> &dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_js_object_mut(&mut self) -> &mut dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match self {
            ObjectType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayObject> {
        match self {
            ObjectType::Array(a) => Some(a),
            _ => None,
        }
    }
}

pub struct ObjectBase {
    properties: IndexMap<String, JsValue>,
    is_extensible: bool,
    prototype: Option<JsObjectType>,
    class: &'static str,
}

impl ObjectBase {
    pub fn new(class: &'static str, prototype: Option<JsObjectType>) -> Self {
        ObjectBase {
            properties: IndexMap::new(),
            is_extensible: true,
            prototype,
            class,
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&JsValue> {
        self.properties.get(key)
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn set_property(&mut self, key: &str, value: JsValue) {
        match self.properties.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.properties.insert(key.to_string(), value);
            }
        }
    }

    pub fn remove_property(&mut self, key: &str) -> bool {
        self.properties.shift_remove(key).is_some()
    }

    pub fn property_keys(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }
}

/// Own-property storage shared by every object variant.
///
/// Anything that walks the prototype chain lives in the free functions of this module,
/// since the walk has to hop between `RefCell`s.
pub trait JsObject {
    fn get_object_base(&self) -> &ObjectBase;

    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn class_name(&self) -> &'static str {
        self.get_object_base().class
    }

    fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.get_object_base().prototype.clone()
    }

    fn is_extensible(&self) -> bool {
        self.get_object_base().is_extensible
    }

    fn get_own_property(&self, key: &str) -> Option<JsValue> {
        self.get_object_base().get_property(key).cloned()
    }

    fn has_own_property(&self, key: &str) -> bool {
        self.get_object_base().contains_property(key)
    }

    fn put_own(&mut self, key: &str, value: JsValue) {
        self.get_object_base_mut().set_property(key, value)
    }

    fn delete_own(&mut self, key: &str) -> bool {
        self.get_object_base_mut().remove_property(key)
    }

    fn own_property_keys(&self) -> Vec<String> {
        self.get_object_base().property_keys().cloned().collect()
    }
}

pub struct OrdinaryObject {
    base: ObjectBase,
}

impl OrdinaryObject {
    pub fn new(class: &'static str, prototype: Option<JsObjectType>) -> Self {
        OrdinaryObject {
            base: ObjectBase::new(class, prototype),
        }
    }
}

impl JsObject for OrdinaryObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

pub fn wrap_object(o: ObjectType) -> JsObjectType {
    Rc::new(RefCell::new(o))
}

/// Allocates a plain `Object`-class object with the given prototype.
pub fn new_object(prototype: Option<JsObjectType>) -> JsObjectType {
    wrap_object(ObjectType::Ordinary(OrdinaryObject::new(
        CLASS_OBJECT,
        prototype,
    )))
}

/// Copies the own properties of `source` into a new object inheriting from `prototype`.
///
/// The copy shares property values (so native methods stay the same function objects) but
/// has its own table, so additions to one are not seen by the other.
pub fn clone_object(source: &JsObjectType, prototype: Option<JsObjectType>) -> JsObjectType {
    let o = source.borrow();
    let src = o.as_js_object();
    let mut copy = OrdinaryObject::new(src.class_name(), prototype);
    for key in src.own_property_keys() {
        if let Some(v) = src.get_own_property(&key) {
            copy.put_own(&key, v);
        }
    }
    wrap_object(ObjectType::Ordinary(copy))
}

pub fn same_object(a: &JsObjectType, b: &JsObjectType) -> bool {
    Rc::ptr_eq(a, b)
}

/// Visits `object` and then each prototype in turn until `visit` yields a result.
///
/// More than `max_depth` hops is reported as an internal error.
pub fn walk_prototype_chain<T, F>(
    object: &JsObjectType,
    max_depth: usize,
    mut visit: F,
) -> Result<Option<T>, JErrorType>
where
    F: FnMut(&dyn JsObject) -> Option<T>,
{
    let mut current = object.clone();
    let mut depth = 0;
    loop {
        let next = {
            let o = current.borrow();
            let js = o.as_js_object();
            if let Some(found) = visit(js) {
                return Ok(Some(found));
            }
            js.get_prototype_of()
        };
        match next {
            None => return Ok(None),
            Some(p) => {
                depth += 1;
                if depth > max_depth {
                    warn!("prototype chain exceeded {} links, aborting lookup", max_depth);
                    return Err(JErrorType::InternalError(format!(
                        "Prototype chain longer than {} links",
                        max_depth
                    )));
                }
                current = p;
            }
        }
    }
}

/// Own value for `key`, else the first value found up the prototype chain, else `undefined`.
pub fn get(object: &JsObjectType, key: &str, max_depth: usize) -> Result<JsValue, JErrorType> {
    Ok(walk_prototype_chain(object, max_depth, |o| o.get_own_property(key))?
        .unwrap_or(JsValue::Undefined))
}

/// Like [`get`] but the key is coerced with `ToString` first. Arrays serve in-bounds integer
/// indexes straight from their element storage.
pub fn get_index(
    object: &JsObjectType,
    index: &JsValue,
    max_depth: usize,
) -> Result<JsValue, JErrorType> {
    if let JsValue::Number(JsNumberType::Integer(i)) = index {
        if let Some(a) = object.borrow().as_array() {
            if *i >= 0 {
                if let Some(v) = a.element(*i as usize) {
                    return Ok(v.clone());
                }
            }
        }
    }
    get(object, &to_property_key(index), max_depth)
}

pub fn has_property(object: &JsObjectType, key: &str, max_depth: usize) -> Result<bool, JErrorType> {
    Ok(walk_prototype_chain(object, max_depth, |o| {
        if o.has_own_property(key) {
            Some(())
        } else {
            None
        }
    })?
    .is_some())
}

pub fn has_own_property(object: &JsObjectType, key: &str) -> bool {
    object.borrow().as_js_object().has_own_property(key)
}

/// Objects in this engine cannot be sealed, so every write is allowed.
pub fn can_put(object: &JsObjectType, _key: &str) -> bool {
    object.borrow().as_js_object().is_extensible()
}

/// Writes an own property. The prototype chain is never consulted, so an own value shadows
/// any inherited one.
pub fn put(
    object: &JsObjectType,
    key: &str,
    value: JsValue,
    throw_on_failure: bool,
) -> Result<(), JErrorType> {
    if !can_put(object, key) {
        return if throw_on_failure {
            Err(JErrorType::TypeError(format!(
                "Cannot add property {}, object is not extensible",
                key
            )))
        } else {
            Ok(())
        };
    }
    object.borrow_mut().as_js_object_mut().put_own(key, value);
    Ok(())
}

pub fn put_index(object: &JsObjectType, index: &JsValue, value: JsValue) -> Result<(), JErrorType> {
    put(object, &to_property_key(index), value, false)
}

/// `put` that hands the object back, for chaining while an object literal is built.
pub fn literal_put(object: JsObjectType, key: &str, value: JsValue) -> JsObjectType {
    object.borrow_mut().as_js_object_mut().put_own(key, value);
    object
}

/// Removes an own property. Inherited properties are left alone.
pub fn delete_property(object: &JsObjectType, key: &str) -> bool {
    object.borrow_mut().as_js_object_mut().delete_own(key);
    true
}

pub fn own_property_keys(object: &JsObjectType) -> Vec<String> {
    object.borrow().as_js_object().own_property_keys()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

/// Placeholder for `[[DefaultValue]]`: `valueOf`/`toString` are not consulted, the result
/// is always `undefined`.
pub fn default_value(_object: &JsObjectType, _hint: PreferredType) -> JsValue {
    JsValue::Undefined
}

pub fn get_prototype_of(object: &JsObjectType) -> Option<JsObjectType> {
    object.borrow().as_js_object().get_prototype_of()
}

/// Replaces the prototype of `object`. Refuses (returning `false`) when `prototype` already
/// has `object` somewhere in its own chain, since that would close a cycle.
pub fn set_prototype_of(
    object: &JsObjectType,
    prototype: Option<JsObjectType>,
    max_depth: usize,
) -> Result<bool, JErrorType> {
    if !object.borrow().as_js_object().is_extensible() {
        return Ok(false);
    }
    let mut current = prototype.clone();
    let mut depth = 0;
    while let Some(p) = current {
        if same_object(&p, object) {
            return Ok(false);
        }
        depth += 1;
        if depth > max_depth {
            warn!("prototype chain exceeded {} links, refusing to extend it", max_depth);
            return Err(JErrorType::InternalError(format!(
                "Prototype chain longer than {} links",
                max_depth
            )));
        }
        current = p.borrow().as_js_object().get_prototype_of();
    }
    object.borrow_mut().as_js_object_mut().get_object_base_mut().prototype = prototype;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: usize = 100;

    #[test]
    fn test_get_falls_back_to_prototype() {
        let proto = new_object(None);
        put(&proto, "x", JsValue::int(5), false).unwrap();
        let o = new_object(Some(proto));
        assert!(!has_own_property(&o, "x"));
        assert_eq!(get(&o, "x", DEPTH).unwrap(), JsValue::int(5));
        assert_eq!(get(&o, "y", DEPTH).unwrap(), JsValue::Undefined);
    }

    #[test]
    fn test_own_property_shadows_inherited() {
        let proto = new_object(None);
        put(&proto, "x", JsValue::int(5), false).unwrap();
        let o = new_object(Some(proto.clone()));
        put(&o, "x", JsValue::int(7), false).unwrap();
        assert_eq!(get(&o, "x", DEPTH).unwrap(), JsValue::int(7));
        assert_eq!(get(&proto, "x", DEPTH).unwrap(), JsValue::int(5));
    }

    #[test]
    fn test_delete_only_touches_own() {
        let proto = new_object(None);
        put(&proto, "x", JsValue::int(1), false).unwrap();
        let o = new_object(Some(proto));
        put(&o, "x", JsValue::int(2), false).unwrap();
        delete_property(&o, "x");
        assert_eq!(get(&o, "x", DEPTH).unwrap(), JsValue::int(1));
        delete_property(&o, "x");
        assert_eq!(get(&o, "x", DEPTH).unwrap(), JsValue::int(1));
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let o = literal_put(
            literal_put(literal_put(new_object(None), "b", JsValue::int(1)), "a", JsValue::int(2)),
            "c",
            JsValue::int(3),
        );
        assert_eq!(own_property_keys(&o), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_default_value_is_undefined() {
        let o = literal_put(new_object(None), "valueOf", JsValue::int(1));
        assert_eq!(default_value(&o, PreferredType::Number), JsValue::Undefined);
    }

    #[test]
    fn test_set_prototype_refuses_cycle() {
        let a = new_object(None);
        let b = new_object(Some(a.clone()));
        assert!(!set_prototype_of(&a, Some(b.clone()), DEPTH).unwrap());
        assert!(!set_prototype_of(&a, Some(a.clone()), DEPTH).unwrap());
        assert!(get_prototype_of(&a).is_none());
        let c = new_object(None);
        assert!(set_prototype_of(&a, Some(c), DEPTH).unwrap());
    }

    #[test]
    fn test_overlong_chain_is_internal_error() {
        let mut o = new_object(None);
        for _ in 0..10 {
            o = new_object(Some(o));
        }
        let err = get(&o, "missing", 5).unwrap_err();
        assert_eq!(err.kind(), crate::runner::ds::error::ErrorKind::Internal);
        assert_eq!(get(&o, "missing", 10).unwrap(), JsValue::Undefined);
    }
}
