extern crate viminous;

use viminous::runner::ds::error::ErrorKind;
use viminous::runner::ds::operations::lex_env::{initialize_binding, resolve_binding};
use viminous::runner::ds::operations::type_conversion::to_string;
use viminous::runner::ds::value::JsValue;
use viminous::{Environment, RunnerConfig};

fn eval_ok(env: &mut Environment, code: &str) -> JsValue {
    match env.eval(code) {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", code, e),
    }
}

#[test]
fn test_eval_simple_sum() {
    let mut env = Environment::new();
    assert_eq!(eval_ok(&mut env, "1+1"), JsValue::int(2));
}

#[test]
fn test_eval_reads_and_mutates_caller_scope() {
    let mut env = Environment::new();
    let scope = env.new_scope();
    initialize_binding(&scope, "a", JsValue::int(1));
    let r = env.eval_in_scope("a = a + 41; a", &scope).unwrap();
    assert_eq!(r, JsValue::int(42));
    assert_eq!(resolve_binding(&scope, "a"), Some(JsValue::int(42)));
    // Nothing leaked into the global scope.
    assert_eq!(env.lookup("a").unwrap(), JsValue::Undefined);
}

#[test]
fn test_eval_var_does_not_reset_existing_binding() {
    let mut env = Environment::new();
    let scope = env.new_scope();
    initialize_binding(&scope, "a", JsValue::int(7));
    let r = env.eval_in_scope("var a; a", &scope).unwrap();
    assert_eq!(r, JsValue::int(7));
}

#[test]
fn test_script_eval_sees_function_locals() {
    let mut env = Environment::new();
    let code = r#"
function f() {
    var local = 1;
    eval("local = local + 1; var added = 10;");
    return local + added;
}
f()
"#;
    assert_eq!(eval_ok(&mut env, code), JsValue::int(12));
    assert_eq!(env.lookup("added").unwrap(), JsValue::Undefined);
}

#[test]
fn test_eval_passes_non_strings_through() {
    let mut env = Environment::new();
    assert_eq!(eval_ok(&mut env, "eval(5)"), JsValue::int(5));
    assert_eq!(eval_ok(&mut env, "eval()"), JsValue::Undefined);
}

#[test]
fn test_eval_keeps_receiver() {
    let mut env = Environment::new();
    let code = "var o = { n: 9, f: function () { return eval('this.n'); } }; o.f()";
    assert_eq!(eval_ok(&mut env, code), JsValue::int(9));
}

#[test]
fn test_eval_syntax_error_surfaces() {
    let mut env = Environment::new();
    let err = env.eval("eval('var = ;')").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_evaluate_handle_replacement() {
    let mut env = Environment::new();
    let handle = env.evaluate("40+2").unwrap();
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(42));
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(42));

    let replacement = env.evaluate("1+1").unwrap();
    assert_eq!(replacement.invoke(&mut env).unwrap(), JsValue::int(2));
    // The earlier handle runs whatever the slot holds now.
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(2));
}

#[test]
fn test_evaluate_runs_in_fresh_scope() {
    let mut env = Environment::new();
    eval_ok(&mut env, "var shared = 'global scope';");
    let handle = env.evaluate("var counter; counter = (counter || 0) + 1; counter").unwrap();
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(1));
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(1));

    let handle = env.evaluate("typeof shared").unwrap();
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::str("undefined"));
}

#[test]
fn test_evaluate_sees_global_object() {
    let mut env = Environment::new();
    eval_ok(&mut env, "window.total = 5;");
    let handle = env.evaluate("total += 1; total").unwrap();
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(6));
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::int(7));
}

#[test]
fn test_failed_evaluate_keeps_previous_script() {
    let mut env = Environment::new();
    let handle = env.evaluate("'kept'").unwrap();
    assert!(env.evaluate("var = ;").is_err());
    assert_eq!(handle.invoke(&mut env).unwrap(), JsValue::str("kept"));
}

#[test]
fn test_handle_is_bound_to_its_environment() {
    let mut a = Environment::new();
    let mut b = Environment::new();
    let handle = a.evaluate("1").unwrap();
    b.evaluate("2").unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(handle.environment_id(), a.id());
    let err = handle.invoke(&mut b).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_run_without_script_is_internal_error() {
    let mut env = Environment::new();
    assert_eq!(env.run_last_script().unwrap_err().kind(), ErrorKind::Internal);
}

#[test]
fn test_global_bindings() {
    let mut env = Environment::new();
    assert_eq!(eval_ok(&mut env, "window === window.window"), JsValue::Boolean(true));
    assert_eq!(eval_ok(&mut env, "typeof Object"), JsValue::str("function"));
    assert_eq!(eval_ok(&mut env, "typeof undefined"), JsValue::str("undefined"));
    assert_eq!(to_string(&eval_ok(&mut env, "Infinity")), "Infinity");
    assert_eq!(eval_ok(&mut env, "p(3)"), JsValue::int(3));
}

#[test]
fn test_object_constructor() {
    let mut env = Environment::new();
    assert_eq!(
        eval_ok(&mut env, "var o = {}; Object(o) === o"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval_ok(&mut env, "Object.prototype.tag = 'local'; Object(1).tag"),
        JsValue::str("local")
    );
    assert_eq!(
        eval_ok(&mut env, "new Object() instanceof Object"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval_ok(&mut env, "Object().hasOwnProperty('tag')"),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_object_prototype_extensions_stay_in_their_environment() {
    let mut a = Environment::new();
    let mut b = Environment::new();
    eval_ok(&mut a, "Object.prototype.marker = 1;");
    assert_eq!(eval_ok(&mut a, "Object().marker"), JsValue::int(1));
    assert_eq!(eval_ok(&mut b, "Object().marker"), JsValue::Undefined);
    assert_eq!(eval_ok(&mut b, "({}).marker"), JsValue::Undefined);
}

#[test]
fn test_shared_prototypes_are_shared() {
    let mut a = Environment::new();
    let mut b = Environment::new();
    let fa = eval_ok(&mut a, "(function () {}).call");
    let fb = eval_ok(&mut b, "(function () {}).call");
    assert_eq!(fa, fb);
}

#[test]
fn test_runaway_recursion_is_stack_overflow() {
    let mut env = Environment::with_config(RunnerConfig::new().with_max_call_depth(32));
    let err = env.eval("function down(n) { return down(n + 1); } down(0)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
    // The environment is usable afterwards.
    assert_eq!(eval_ok(&mut env, "function one() { return 1; } one()"), JsValue::int(1));
}

#[test]
fn test_recursion_below_limit() {
    let mut env = Environment::new();
    let code = "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)";
    assert_eq!(eval_ok(&mut env, code), JsValue::int(610));
}

#[test]
fn test_default_depth_allows_moderate_recursion() {
    let mut env = Environment::new();
    let code = "function down(n) { return n == 0 ? 0 : 1 + down(n - 1); } down(100)";
    assert_eq!(eval_ok(&mut env, code), JsValue::int(100));
}

#[test]
fn test_call_function_from_host() {
    let mut env = Environment::new();
    let f = eval_ok(&mut env, "function add(a, b) { return a + b; } add");
    let r = env
        .call_function(&f, JsValue::Undefined, vec![JsValue::int(2), JsValue::int(3)])
        .unwrap();
    assert_eq!(r, JsValue::int(5));
}

#[test]
fn test_environment_debug_shows_id() {
    let env = Environment::default();
    let shown = format!("{:?}", env);
    assert!(shown.contains(&env.id().to_string()));
}
