use crate::runner::ds::object::{
    wrap_object, JsObject, JsObjectType, ObjectBase, ObjectType, CLASS_ARRAY,
};
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const ARRAY_LENGTH_PROP: &str = "length";

/// Writes further than this past the end are stored as plain properties instead of
/// padding the element vector.
const MAX_PADDING: usize = 1 << 16;

/// Element storage; `None` marks a hole left by `delete` or by writing past the end.
pub struct ArrayObject {
    base: ObjectBase,
    elements: Vec<Option<JsValue>>,
}

impl ArrayObject {
    pub fn new(elements: Vec<JsValue>, prototype: Option<JsObjectType>) -> Self {
        ArrayObject {
            base: ObjectBase::new(CLASS_ARRAY, prototype),
            elements: elements.into_iter().map(Some).collect(),
        }
    }

    /// The element at `idx`, or `None` for a hole or an index past the end.
    pub fn element(&self, idx: usize) -> Option<&JsValue> {
        self.elements.get(idx).and_then(|e| e.as_ref())
    }

    pub fn elements(&self) -> impl Iterator<Item = Option<&JsValue>> {
        self.elements.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn set_length(&mut self, value: &JsValue) {
        let new_len = match value {
            JsValue::Number(JsNumberType::Integer(i)) if *i >= 0 => *i as usize,
            _ => return,
        };
        if new_len <= self.elements.len() + MAX_PADDING {
            self.elements.resize(new_len, None);
        }
    }
}

pub fn new_array(elements: Vec<JsValue>, prototype: Option<JsObjectType>) -> JsObjectType {
    wrap_object(ObjectType::Array(ArrayObject::new(elements, prototype)))
}

/// Canonical array index: decimal digits without a leading zero (except `"0"` itself).
pub fn parse_array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<usize>().ok()
}

impl JsObject for ArrayObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_own_property(&self, key: &str) -> Option<JsValue> {
        if key == ARRAY_LENGTH_PROP {
            return Some(JsValue::int(self.elements.len() as i64));
        }
        if let Some(idx) = parse_array_index(key) {
            if idx < self.elements.len() {
                return self.element(idx).cloned();
            }
        }
        self.base.get_property(key).cloned()
    }

    fn has_own_property(&self, key: &str) -> bool {
        if key == ARRAY_LENGTH_PROP {
            return true;
        }
        match parse_array_index(key) {
            Some(idx) if idx < self.elements.len() => self.element(idx).is_some(),
            _ => self.base.contains_property(key),
        }
    }

    fn put_own(&mut self, key: &str, value: JsValue) {
        if key == ARRAY_LENGTH_PROP {
            self.set_length(&value);
            return;
        }
        if let Some(idx) = parse_array_index(key) {
            let len = self.elements.len();
            if idx < len {
                self.elements[idx] = Some(value);
                return;
            }
            if idx - len <= MAX_PADDING {
                self.elements.resize(idx, None);
                self.elements.push(Some(value));
                return;
            }
        }
        self.base.set_property(key, value);
    }

    fn delete_own(&mut self, key: &str) -> bool {
        if key == ARRAY_LENGTH_PROP {
            return false;
        }
        if let Some(idx) = parse_array_index(key) {
            if let Some(slot) = self.elements.get_mut(idx) {
                *slot = None;
                return true;
            }
        }
        self.base.remove_property(key)
    }

    fn own_property_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| i.to_string())
            .collect();
        keys.extend(self.base.property_keys().cloned());
        keys
    }
}
