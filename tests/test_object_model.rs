extern crate viminous;

use viminous::runner::ds::array_object::new_array;
use viminous::runner::ds::error::ErrorKind;
use viminous::runner::ds::object::{
    delete_property, get, get_index, has_own_property, has_property, literal_put, new_object,
    own_property_keys,
    put, same_object, set_prototype_of, JsObject, JsObjectType,
};
use viminous::runner::ds::operations::dispatch::with_constructor;
use viminous::runner::ds::prototypes::shared_prototypes;
use viminous::runner::ds::value::{JsNumberType, JsValue};
use viminous::Environment;

const DEPTH: usize = 10_000;

fn plain() -> JsObjectType {
    new_object(Some(shared_prototypes().object_prototype.clone()))
}

fn int(i: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(i))
}

#[test]
fn test_missing_key_is_undefined() {
    let o = plain();
    assert_eq!(get(&o, "nope", DEPTH).unwrap(), JsValue::Undefined);
}

#[test]
fn test_read_your_write_shadows_prototype() {
    let proto = plain();
    put(&proto, "k", int(1), false).unwrap();
    let o = new_object(Some(proto.clone()));
    assert_eq!(get(&o, "k", DEPTH).unwrap(), int(1));
    put(&o, "k", int(2), false).unwrap();
    assert_eq!(get(&o, "k", DEPTH).unwrap(), int(2));
    assert_eq!(get(&proto, "k", DEPTH).unwrap(), int(1));
}

#[test]
fn test_literal_put_chain() {
    let o = literal_put(literal_put(plain(), "a", int(1)), "b", int(2));
    assert_eq!(get(&o, "a", DEPTH).unwrap(), int(1));
    assert_eq!(get(&o, "b", DEPTH).unwrap(), int(2));
    assert_eq!(get(&o, "c", DEPTH).unwrap(), JsValue::Undefined);
    assert_eq!(own_property_keys(&o), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_has_property_follows_chain() {
    let proto = plain();
    put(&proto, "inherited", int(1), false).unwrap();
    let o = new_object(Some(proto));
    assert!(has_property(&o, "inherited", DEPTH).unwrap());
    assert!(has_property(&o, "hasOwnProperty", DEPTH).unwrap());
    assert!(!has_property(&o, "absent", DEPTH).unwrap());
}

#[test]
fn test_delete_only_touches_own_properties() {
    let proto = plain();
    put(&proto, "x", int(1), false).unwrap();
    let o = new_object(Some(proto));
    put(&o, "x", int(2), false).unwrap();
    delete_property(&o, "x");
    assert_eq!(get(&o, "x", DEPTH).unwrap(), int(1));
    delete_property(&o, "x");
    assert_eq!(get(&o, "x", DEPTH).unwrap(), int(1));
}

#[test]
fn test_get_index_on_arrays() {
    let a = new_array(
        vec![int(10), int(20)],
        Some(shared_prototypes().array_prototype.clone()),
    );
    assert_eq!(get_index(&a, &int(1), DEPTH).unwrap(), int(20));
    assert_eq!(get_index(&a, &JsValue::str("0"), DEPTH).unwrap(), int(10));
    assert_eq!(get_index(&a, &int(5), DEPTH).unwrap(), JsValue::Undefined);
    assert_eq!(get(&a, "length", DEPTH).unwrap(), int(2));
}

#[test]
fn test_deleted_array_slot_is_a_hole() {
    let proto = new_object(Some(shared_prototypes().array_prototype.clone()));
    put(&proto, "0", JsValue::str("inherited"), false).unwrap();
    let a = new_array(vec![int(1), int(2)], Some(proto));
    assert!(delete_property(&a, "0"));
    assert!(!has_own_property(&a, "0"));
    assert!(has_own_property(&a, "1"));
    assert_eq!(get(&a, "length", DEPTH).unwrap(), int(2));
    assert_eq!(get_index(&a, &int(0), DEPTH).unwrap(), JsValue::str("inherited"));
    assert_eq!(own_property_keys(&a), vec!["1".to_string()]);
    put(&a, "0", int(9), false).unwrap();
    assert!(has_own_property(&a, "0"));
    assert_eq!(get_index(&a, &int(0), DEPTH).unwrap(), int(9));
}

#[test]
fn test_numeric_and_string_keys_agree() {
    let o = plain();
    put(&o, "1", JsValue::str("one"), false).unwrap();
    assert_eq!(get_index(&o, &int(1), DEPTH).unwrap(), JsValue::str("one"));
}

#[test]
fn test_prototype_cycle_is_refused() {
    let a = plain();
    let b = new_object(Some(a.clone()));
    assert!(!set_prototype_of(&a, Some(b.clone()), DEPTH).unwrap());
    assert!(set_prototype_of(&b, None, DEPTH).unwrap());
}

#[test]
fn test_overlong_prototype_chain_is_internal_error() {
    let mut current = plain();
    for _ in 0..20 {
        current = new_object(Some(current));
    }
    let err = get(&current, "missing", 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_new_instance_reads_through_prototype() {
    let mut env = Environment::new();
    let o = env
        .eval("function F() {} F.prototype.x = 5; var o = new F(); o")
        .unwrap();
    let o = o.as_object().unwrap().clone();
    assert!(!o.borrow().as_js_object().has_own_property("x"));
    assert_eq!(get(&o, "x", DEPTH).unwrap(), int(5));
}

#[test]
fn test_with_constructor_directly() {
    let mut env = Environment::new();
    let f = env.eval("function F() { this.y = 1; } F.prototype.x = 5; F").unwrap();
    let mut ctx = viminous::runner::context::EvalContext::new(
        env.global_object().clone(),
        shared_prototypes(),
        env.config().clone(),
        env.global_scope().clone(),
    );
    let o = with_constructor(&mut ctx, &f, vec![]).unwrap();
    let o = o.as_object().unwrap().clone();
    assert_eq!(get(&o, "x", DEPTH).unwrap(), int(5));
    assert_eq!(get(&o, "y", DEPTH).unwrap(), int(1));
    let proto = o.borrow().as_js_object().get_prototype_of().unwrap();
    let f_proto = match get(f.as_object().unwrap(), "prototype", DEPTH).unwrap() {
        JsValue::Object(p) => p,
        other => panic!("prototype was {:?}", other),
    };
    assert!(same_object(&proto, &f_proto));
}
