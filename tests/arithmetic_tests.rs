// Number, BigInt and string semantics as seen through trace snapshots

use serde_json::{json, Value};
use stepscope::instrument::{candidate_identifiers, instrument};
use stepscope::language::Language;
use stepscope::runner::{RunReport, RunStatus, TraceRunner};
use stepscope::transpile::transpile;

fn run(source: &str) -> RunReport {
    let host = transpile(source, Language::JavaScript);
    let program = instrument(&host, candidate_identifiers(&host)).expect("Instrumentation failed");
    TraceRunner::default().run(&program)
}

/// Bindings at the last step of a program that must complete
fn final_scope(source: &str) -> serde_json::Map<String, Value> {
    let report = run(source);
    assert_eq!(report.status, RunStatus::Completed, "{:?}", report.status);
    let last = report.trace.len() - 1;
    report.trace.get(last).expect("No steps").scope.clone()
}

#[test]
fn test_number_arithmetic() {
    let scope = final_scope(
        r#"
let half = 7 / 2;
let rem = -7 % 3;
let pow = 2 ** 10;
let inf = 1 / 0;
let nan = 0 / 0;
let rounded = Math.round(2.5) + Math.floor(-1.5) + Math.max(3, 9, 4);
"#,
    );
    assert_eq!(scope["half"], json!(3.5));
    assert_eq!(scope["rem"], json!(-1));
    assert_eq!(scope["pow"], json!(1024));
    // Non-finite numbers have no JSON form
    assert_eq!(scope["inf"], Value::Null);
    assert_eq!(scope["nan"], Value::Null);
    assert_eq!(scope["rounded"], json!(10));
}

#[test]
fn test_string_coercion_and_methods() {
    let scope = final_scope(
        r#"
let s = "n=" + 4 + 2;
let t = 4 + 2 + "=n";
let up = "abc".toUpperCase();
let parts = "a,b,c".split(",");
let piece = "stepscope".substring(0, 4);
let fixed = (3.14159).toFixed(2);
let parsed = parseInt("42px") + parseFloat("0.5");
"#,
    );
    assert_eq!(scope["s"], json!("n=42"));
    assert_eq!(scope["t"], json!("6=n"));
    assert_eq!(scope["up"], json!("ABC"));
    assert_eq!(scope["parts"], json!(["a", "b", "c"]));
    assert_eq!(scope["piece"], json!("step"));
    assert_eq!(scope["fixed"], json!("3.14"));
    assert_eq!(scope["parsed"], json!(42.5));
}

#[test]
fn test_bigint_arithmetic() {
    let scope = final_scope(
        r#"
let a = 9007199254740993n;
let b = a * 3n;
let q = 7n / 2n;
let typeName = typeof a;
"#,
    );
    assert_eq!(scope["a"], json!("9007199254740993"));
    assert_eq!(scope["b"], json!("27021597764222979"));
    assert_eq!(scope["q"], json!("3"));
    assert_eq!(scope["typeName"], json!("bigint"));
}

#[test]
fn test_bigint_mixing_is_a_type_error() {
    let report = run("let a = 1n;\nlet b = a + 1;\n");
    assert_eq!(report.trace.len(), 1);
    assert_eq!(
        report.status,
        RunStatus::SimulationError {
            message: "TypeError: Cannot mix BigInt and other types, use explicit conversions (line 2)"
                .to_string()
        }
    );
}

#[test]
fn test_bigint_division_by_zero() {
    let report = run("let z = 0n;\nlet r = 5n / z;\n");
    assert_eq!(
        report.status,
        RunStatus::SimulationError {
            message: "RangeError: Division by zero (line 2)".to_string()
        }
    );
}

#[test]
fn test_large_integers_fall_back_to_floats() {
    let scope = final_scope("let safe = Number.MAX_SAFE_INTEGER;\nlet past = safe * 4;\n");
    assert_eq!(scope["safe"], json!(9007199254740991_i64));
    assert_eq!(scope["past"], json!(36028797018963964.0));
}

#[test]
fn test_const_reassignment_fails() {
    let report = run("const k = 1;\nk = 2;\n");
    assert_eq!(report.trace.len(), 1);
    assert_eq!(
        report.status,
        RunStatus::SimulationError {
            message: "TypeError: Assignment to constant variable 'k' (line 2)".to_string()
        }
    );
}

#[test]
fn test_compound_assignment_and_increments() {
    let scope = final_scope(
        r#"
let n = 10;
n += 5;
n -= 3;
n *= 2;
n /= 4;
n %= 4;
let i = 0;
let post = i++;
let pre = ++i;
"#,
    );
    assert_eq!(scope["n"], json!(2));
    assert_eq!(scope["post"], json!(0));
    assert_eq!(scope["pre"], json!(2));
    assert_eq!(scope["i"], json!(2));
}

#[test]
fn test_destructuring_swap() {
    let scope = final_scope("let a = 1;\nlet b = 2;\n[a, b] = [b, a];\n");
    assert_eq!(scope["a"], json!(2));
    assert_eq!(scope["b"], json!(1));
}
