/// Benchmark runner for the script entry points.
///
/// Compares `eval`, which parses and compiles on every run, with re-invoking a script
/// handle from `evaluate`, which compiles once.

extern crate viminous;

use std::time::{Duration, Instant};
use viminous::runner::ds::value::{JsNumberType, JsValue};
use viminous::Environment;

/// Run through `eval` and return the execution time.
fn run_benchmark_eval(name: &str, code: &str, iterations: u32) -> Duration {
    let mut env = Environment::new();
    let start = Instant::now();
    for _ in 0..iterations {
        if let Err(e) = env.eval(code) {
            panic!("{} failed: {}", name, e);
        }
    }
    start.elapsed()
}

/// Compile once through `evaluate`, then time the invocations.
fn run_benchmark_cached(name: &str, code: &str, iterations: u32) -> Duration {
    let mut env = Environment::new();
    let handle = match env.evaluate(code) {
        Ok(h) => h,
        Err(e) => panic!("{} failed to compile: {}", name, e),
    };
    let start = Instant::now();
    for _ in 0..iterations {
        if let Err(e) = handle.invoke(&mut env) {
            panic!("{} failed: {}", name, e);
        }
    }
    start.elapsed()
}

fn run_and_get_result(code: &str) -> JsValue {
    let mut env = Environment::new();
    env.eval(code).unwrap_or(JsValue::Undefined)
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const BENCH_FIBONACCI: &str = r#"
var n = 20;
var a = 0;
var b = 1;
for (var i = 0; i < n; i = i + 1) {
    var temp = a;
    a = b;
    b = temp + b;
}
a
"#;

const BENCH_LOOP_SUM: &str = r#"
var sum = 0;
for (var i = 0; i < 10000; i++) {
    sum += i;
}
sum
"#;

const BENCH_RECURSION: &str = r#"
function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }
var result = fact(12);
result
"#;

const BENCH_OBJECTS: &str = r#"
function Point(x, y) { this.x = x; this.y = y; }
Point.prototype.len2 = function () { return this.x * this.x + this.y * this.y; };
var total = 0;
for (var i = 0; i < 200; i++) {
    total += new Point(i, 1).len2();
}
total
"#;

const BENCH_SHORT_SCRIPT: &str = "var o = { a: 1, b: [1, 2, 3] }; o.a + o.b.length";

fn main() {
    println!("=======================================================");
    println!("  viminous - Script Entry Point Benchmarks");
    println!("  eval (compile every run) vs evaluate (compile once)");
    println!("=======================================================\n");

    let benchmarks: Vec<(&str, &str, u32)> = vec![
        ("Fibonacci (n=20)", BENCH_FIBONACCI, 1000),
        ("Loop Sum (10K iterations)", BENCH_LOOP_SUM, 50),
        ("Factorial (n=12)", BENCH_RECURSION, 2000),
        ("Constructors (200)", BENCH_OBJECTS, 200),
        ("Short script", BENCH_SHORT_SCRIPT, 5000),
    ];

    println!("{:<30} {:>14} {:>14} {:>10}", "Benchmark", "eval", "evaluate", "Speedup");
    println!("{}", "-".repeat(70));

    let mut total_eval = Duration::ZERO;
    let mut total_cached = Duration::ZERO;

    for (name, code, iterations) in &benchmarks {
        let eval_dur = run_benchmark_eval(name, code, *iterations);
        let cached_dur = run_benchmark_cached(name, code, *iterations);
        total_eval += eval_dur;
        total_cached += cached_dur;

        let speedup = eval_dur.as_secs_f64() / cached_dur.as_secs_f64();

        println!(
            "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
            name, eval_dur, cached_dur, speedup
        );
    }

    println!("{}", "-".repeat(70));
    let total_speedup = total_eval.as_secs_f64() / total_cached.as_secs_f64();
    println!(
        "{:<30} {:>12.2?} {:>12.2?} {:>9.2}x",
        "TOTAL", total_eval, total_cached, total_speedup
    );

    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    let verifications: Vec<(&str, &str, i64)> = vec![
        ("Fibonacci", BENCH_FIBONACCI, 6765),
        ("Loop Sum", BENCH_LOOP_SUM, 49995000),
        ("Factorial", BENCH_RECURSION, 479001600),
        ("Constructors", BENCH_OBJECTS, 2646900),
    ];

    println!("{:<20} {:>12} {:>12}", "Test", "Expected", "Actual");
    println!("{}", "-".repeat(46));
    for (name, code, expected) in &verifications {
        let actual = match run_and_get_result(code) {
            JsValue::Number(JsNumberType::Integer(n)) => n.to_string(),
            other => format!("{:?}", other),
        };
        let mark = if actual == expected.to_string() { "ok" } else { "MISMATCH" };
        println!("{:<20} {:>12} {:>12}  {}", name, expected, actual, mark);
    }
}
