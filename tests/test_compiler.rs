extern crate viminous;

use viminous::parser::JsParser;
use viminous::runner::ds::error::ErrorKind;
use viminous::runner::ds::operations::type_conversion::to_string;
use viminous::runner::ds::value::{JsNumberType, JsValue};
use viminous::runner::jit::{self, SCRIPT_NAME, SOURCE_LABEL};
use viminous::Environment;

fn run_get_var(code: &str, var_name: &str) -> JsValue {
    let mut env = Environment::new();
    if let Err(e) = env.eval(code) {
        panic!("{} failed: {}", code, e);
    }
    env.lookup(var_name).unwrap()
}

fn run_get_int(code: &str, var_name: &str) -> i64 {
    match run_get_var(code, var_name) {
        JsValue::Number(JsNumberType::Integer(n)) => n,
        other => panic!("{} was {:?}, expected integer", var_name, other),
    }
}

fn disasm(code: &str) -> String {
    let env = Environment::new();
    let ast = JsParser::parse_to_ast_from_str(code).unwrap();
    let executable = jit::compile(&ast, env.global_object()).unwrap();
    executable.chunk.disassemble(&executable.name)
}

fn compile_err_kind(code: &str) -> ErrorKind {
    let env = Environment::new();
    match jit::compile_source(code, env.global_object()) {
        Ok(e) => panic!("{} compiled to {:?}", code, e),
        Err(e) => e.kind(),
    }
}

#[test]
fn test_executable_is_labelled() {
    let env = Environment::new();
    let executable = jit::compile_source("1 + 1", env.global_object()).unwrap();
    assert_eq!(executable.name, SCRIPT_NAME);
    assert_eq!(executable.source_label, SOURCE_LABEL);
    assert!(executable.instruction_count() > 0);
}

#[test]
fn test_disassembly_shows_hoisting() {
    let out = disasm("var a = 1; function f() {}");
    eprintln!("{}", out);
    assert!(out.starts_with("== __script__ =="));
    let declare = out.find("DeclareVar").unwrap();
    let bind = out.find("BindFunction").unwrap();
    let set = out.find("SetVar").unwrap();
    assert!(declare < set);
    assert!(bind < set);
    assert!(out.trim_end().ends_with("Halt"));
}

#[test]
fn test_syntax_error_quotes_source() {
    let env = Environment::new();
    let err = jit::compile_source("var = ;", env.global_object()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.message().contains("var = ;"), "message was {}", err.message());
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(compile_err_kind("f() = 1;"), ErrorKind::Reference);
    assert_eq!(compile_err_kind("1 += 2;"), ErrorKind::Reference);
    assert_eq!(compile_err_kind("(a + b)++;"), ErrorKind::Reference);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(compile_err_kind("break;"), ErrorKind::Syntax);
    assert_eq!(compile_err_kind("function f() { continue; }"), ErrorKind::Syntax);
}

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(run_get_int("var x = 3 + 4 * 2;", "x"), 11);
    assert_eq!(run_get_int("var x = (3 + 4) * 2;", "x"), 14);
    assert_eq!(run_get_int("var x = 10 - 2 - 3;", "x"), 5);
    assert_eq!(run_get_int("var x = -3 + +'5';", "x"), 2);
}

#[test]
fn test_for_loop() {
    let code = "var sum = 0; for (var i = 0; i < 5; i++) { sum += i; }";
    eprintln!("{}", disasm(code));
    assert_eq!(run_get_int(code, "sum"), 10);
}

#[test]
fn test_while_with_break_and_continue() {
    let code = r#"
var i = 0;
var odd = 0;
while (true) {
    i = i + 1;
    if (i > 9) break;
    if (i % 2 == 0) continue;
    odd += i;
}
"#;
    assert_eq!(run_get_int(code, "odd"), 25);
    assert_eq!(run_get_int(code, "i"), 10);
}

#[test]
fn test_continue_in_for_runs_update() {
    let code = "var n = 0; for (var i = 0; i < 6; i++) { if (i < 3) continue; n++; }";
    assert_eq!(run_get_int(code, "n"), 3);
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(to_string(&run_get_var("var x = 0 || 'fallback';", "x")), "fallback");
    assert_eq!(to_string(&run_get_var("var x = 1 && 'second';", "x")), "second");
    assert_eq!(run_get_int("var x = 0 && missing();", "x"), 0);
}

#[test]
fn test_update_expressions() {
    assert_eq!(run_get_int("var a = 1; var b = a++;", "b"), 1);
    assert_eq!(run_get_int("var a = 1; var b = ++a;", "b"), 2);
    assert_eq!(run_get_int("var o = { n: 5 }; o.n--; var r = o.n;", "r"), 4);
    assert_eq!(run_get_int("var a = [1, 2]; var r = a[1]++ + a[1];", "r"), 5);
}

#[test]
fn test_compound_member_assignment() {
    assert_eq!(run_get_int("var o = { n: 2 }; o.n *= 5; var r = o.n;", "r"), 10);
    assert_eq!(run_get_int("var a = [4]; a[0] -= 1; var r = a[0];", "r"), 3);
}

#[test]
fn test_function_hoisting_and_closures() {
    let code = r#"
var r = twice(4);
function twice(n) { return n * 2; }
function counter() {
    var c = 0;
    return function () { c++; return c; };
}
var next = counter();
next();
var r2 = next();
"#;
    assert_eq!(run_get_int(code, "r"), 8);
    assert_eq!(run_get_int(code, "r2"), 2);
}

#[test]
fn test_missing_arguments_are_undefined() {
    let code = "function f(a, b) { return b; } var r = f(1); var t = typeof r;";
    assert_eq!(to_string(&run_get_var(code, "t")), "undefined");
    let code = "function f(a) { return a; } var r = f(1, 2, 3);";
    assert_eq!(run_get_int(code, "r"), 1);
}

#[test]
fn test_named_function_expression_sees_itself() {
    let code = "var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; var r = fact(5);";
    assert_eq!(run_get_int(code, "r"), 120);
    assert_eq!(run_get_var(code, "f"), JsValue::Undefined);
}

#[test]
fn test_assignment_to_undeclared_creates_global_property() {
    let mut env = Environment::new();
    env.eval("function f() { leaked = 3; } f();").unwrap();
    assert_eq!(env.eval("window.leaked").unwrap(), JsValue::int(3));
}

#[test]
fn test_arrays_and_objects() {
    assert_eq!(run_get_int("var a = [1, 2, 3]; a[5] = 6; var n = a.length;", "n"), 6);
    assert_eq!(run_get_int("var o = { 'a b': 1, 2: 2 }; var r = o['a b'] + o[2];", "r"), 3);
    assert_eq!(
        to_string(&run_get_var("var o = { x: 1 }; var d = delete o.x; var r = typeof o.x;", "r")),
        "undefined"
    );
    assert_eq!(
        to_string(&run_get_var("var o = { x: 1 }; var r = 'x' in o && !('y' in o);", "r")),
        "true"
    );
    assert_eq!(
        run_get_var("var a = [1, 2]; delete a[0]; var r = !(0 in a) && 1 in a;", "r"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        to_string(&run_get_var("var a = [1, 2, 3]; delete a[1]; var r = a + '|' + a.length;", "r")),
        "1,,3|3"
    );
    assert_eq!(
        run_get_var("var a = []; a[3] = 1; var r = 2 in a;", "r"),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_instanceof() {
    let code = "function A() {} function B() {} var a = new A(); var r = a instanceof A && !(a instanceof B);";
    assert_eq!(run_get_var(code, "r"), JsValue::Boolean(true));
}

#[test]
fn test_constructor_return_value_is_ignored() {
    let code = r#"
var other = { b: 2 };
function F() { this.a = 1; return other; }
var o = new F();
var same = o === other;
var r = o.a;
var t = typeof o.b;
"#;
    assert_eq!(run_get_var(code, "same"), JsValue::Boolean(false));
    assert_eq!(run_get_int(code, "r"), 1);
    assert_eq!(to_string(&run_get_var(code, "t")), "undefined");
    assert_eq!(run_get_int("function G() { return 5; } var n = typeof new G() == 'object' ? 1 : 0;", "n"), 1);
}

#[test]
fn test_completion_value() {
    let mut env = Environment::new();
    assert_eq!(env.eval("1; 2; var x = 5;").unwrap(), JsValue::int(2));
    assert_eq!(env.eval("var y = 1;").unwrap(), JsValue::Undefined);
    assert_eq!(env.eval("if (true) { 'then'; } else { 'else'; }").unwrap(), JsValue::str("then"));
}
