// Integration tests for the transpile → instrument → run pipeline

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use stepscope::analyzer::{analyze, ComplexityClass};
use stepscope::instrument::{candidate_identifiers, instrument, suspension_map, LineKind};
use stepscope::language::{Language, UnsupportedLanguage};
use stepscope::runner::{RunReport, RunStatus, RunnerConfig, TraceRunner};
use stepscope::session::{PipelineError, Session};
use stepscope::snapshot::Trace;
use stepscope::transpile::transpile;

fn run(source: &str, language: Language) -> RunReport {
    let host = transpile(source, language);
    let candidates = candidate_identifiers(&host);
    let program = instrument(&host, candidates).expect("Instrumentation failed");
    TraceRunner::default().run(&program)
}

fn run_js(source: &str) -> RunReport {
    run(source, Language::JavaScript)
}

/// Values of one binding across the steps that captured it
fn values_of(trace: &Trace, name: &str) -> Vec<Value> {
    trace.iter().filter_map(|step| step.get(name).cloned()).collect()
}

fn lines_of(trace: &Trace) -> Vec<usize> {
    trace.iter().map(|step| step.line_number).collect()
}

#[test]
fn test_doubling_loop_end_to_end() {
    let source = "let x = 1;\nfor (let i=0;i<2;i++){ x = x*2; }";

    assert_eq!(analyze(source).complexity, ComplexityClass::Logarithmic);
    assert_eq!(analyze(source).complexity.to_string(), "O(log n)");

    let report = run_js(source);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(lines_of(&report.trace), vec![1, 2, 2]);
    assert_eq!(values_of(&report.trace, "x"), vec![json!(1), json!(2), json!(4)]);
}

#[test]
fn test_same_program_gives_same_trace() {
    let source = r#"
let xs = [5, 3, 8, 1];
let best = xs[0];
for (const x of xs) {
  if (x < best) {
    best = x;
  }
}
let sorted = xs.slice().sort((a, b) => a - b);
"#;
    let first = run_js(source);
    let second = run_js(source);
    assert_eq!(first, second);
    assert_eq!(values_of(&first.trace, "best").last(), Some(&json!(1)));
    assert_eq!(values_of(&first.trace, "sorted"), vec![json!([1, 3, 5, 8])]);
}

#[test]
fn test_throw_keeps_steps_captured_before_it() {
    let source = r#"let a = 1;
a = a + 1;
throw new Error("boom");
let never = 3;
"#;
    let report = run_js(source);
    assert_eq!(lines_of(&report.trace), vec![1, 2]);
    assert_eq!(
        report.status,
        RunStatus::SimulationError {
            message: "Error: boom (line 3)".to_string()
        }
    );
}

#[test]
fn test_type_error_is_contained() {
    let report = run_js("let n = 5;\nlet r = n();\n");
    assert_eq!(report.trace.len(), 1);
    match report.status {
        RunStatus::SimulationError { message } => {
            assert!(message.starts_with("TypeError: "), "{}", message)
        }
        other => panic!("Expected a simulation error, got {:?}", other),
    }
}

#[test]
fn test_program_without_capture_points_reports_empty_trace() {
    let report = run_js("// nothing runs at top level\nfunction unused(a) {\n  let b = a * 2;\n  return b;\n}\n");
    assert_eq!(report.status, RunStatus::EmptyTrace);
    assert!(report.trace.is_empty());
}

#[test]
fn test_no_step_inside_non_suspending_bodies() {
    let source = r#"function square(v) {
  let s = v * v;
  return s;
}
const total = [1, 2, 3].reduce((acc, v) => {
  let next = acc + square(v);
  return next;
}, 0);
async function report(t) {
  let shown = t;
  return shown;
}
await report(total);
"#;
    let host = transpile(source, Language::JavaScript);
    let excluded: Vec<usize> = suspension_map(&host)
        .iter()
        .filter(|(_, kind)| *kind == LineKind::NonSuspendingBody)
        .map(|(line, _)| line)
        .collect();
    assert_eq!(excluded, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let report = run_js(source);
    assert_eq!(report.status, RunStatus::Completed);
    for step in report.trace.iter() {
        assert!(
            !excluded.contains(&step.line_number),
            "step on excluded line {}",
            step.line_number
        );
    }
    assert_eq!(lines_of(&report.trace), vec![10, 13]);
    // `total` is declared on an excluded line but is visible from both steps
    assert_eq!(values_of(&report.trace, "total"), vec![json!(14), json!(14)]);
    assert_eq!(values_of(&report.trace, "shown"), vec![json!(14)]);
}

#[test]
fn test_java_program_end_to_end() {
    let source = r#"public class Main {
    public static void main(String[] args) {
        int total = 0;
        for (int i = 1; i <= 3; i++) {
            total += i;
        }
        System.out.println(total);
    }
}"#;
    let report = run(source, Language::Java);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(
        values_of(&report.trace, "total"),
        vec![json!(0), json!(1), json!(3), json!(6), json!(6)]
    );
    assert_eq!(analyze(source).complexity, ComplexityClass::Linear);
}

#[test]
fn test_cpp_program_end_to_end() {
    let source = r#"#include <iostream>
using namespace std;

int main() {
    int x = 1;
    while (x < 100) {
        x = x * 3;
    }
    cout << x << endl;
    return 0;
}"#;
    let report = run(source, Language::Cpp);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(
        values_of(&report.trace, "x"),
        vec![json!(1), json!(3), json!(9), json!(27), json!(81), json!(243), json!(243)]
    );
}

#[test]
fn test_step_limit_ends_a_runaway_program() {
    let host = transpile("let n = 0;\nwhile (n >= 0) {\n  n++;\n}\n", Language::JavaScript);
    let program = instrument(&host, candidate_identifiers(&host)).expect("Instrumentation failed");

    let runner = TraceRunner::new(RunnerConfig::default().with_max_steps(100));
    let report = runner.run(&program);
    assert_eq!(report.status, RunStatus::StepLimitReached { limit: 100 });
    assert_eq!(report.trace.len(), 100);
    assert_eq!(values_of(&report.trace, "n").last(), Some(&json!(99)));
}

#[test]
fn test_abandoned_stream_does_not_block_the_next_run() {
    let host = transpile("let n = 0;\nwhile (true) {\n  n++;\n}\n", Language::JavaScript);
    let endless = instrument(&host, candidate_identifiers(&host)).expect("Instrumentation failed");
    let runner = TraceRunner::default();

    let first_two: Vec<usize> = runner.steps(&endless).take(2).map(|s| s.line_number).collect();
    assert_eq!(first_two, vec![1, 3]);

    let report = run_js("let done = true;\n");
    assert_eq!(report.status, RunStatus::Completed);
}

#[test]
fn test_runs_do_not_share_globals() {
    let runner = TraceRunner::default();
    let mut session = Session::new("var leaked = 42;\n", "javascript");
    session.visualize(&runner).expect("Visualization failed");

    session.set_source("let seen = typeof leaked;\n");
    let report = session.visualize(&runner).expect("Visualization failed");
    assert_eq!(values_of(&report.trace, "seen"), vec![json!("undefined")]);
}

#[test]
fn test_snapshots_are_deep_copies() {
    let source = r#"let a = [1];
let b = a;
b.push(2);
let o = { k: a, f: (x) => x };
let big = 2n ** 64n;
function helper() {}
"#;
    let report = run_js(source);
    let a_values = values_of(&report.trace, "a");
    assert_eq!(a_values, vec![json!([1]), json!([1]), json!([1, 2]), json!([1, 2]), json!([1, 2])]);

    let last = report.trace.get(report.trace.len() - 1).expect("No steps");
    assert_eq!(last.get("o"), Some(&json!({ "k": [1, 2] })));
    assert_eq!(last.get("big"), Some(&json!("18446744073709551616")));
    assert_eq!(last.get("helper"), None);
}

#[test]
fn test_matrix_updates_show_in_place() {
    let source = r#"let grid = Array.from({ length: 2 }, () => new Array(2).fill(0));
for (let r = 0; r < 2; r++) {
  for (let c = 0; c < 2; c++) {
    grid[r][c] = r * 2 + c;
  }
}
"#;
    let report = run_js(source);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(analyze(source).complexity, ComplexityClass::Quadratic);
    assert_eq!(
        values_of(&report.trace, "grid").last(),
        Some(&json!([[0, 1], [2, 3]]))
    );
}

#[test]
fn test_recursion_runs_inside_a_single_step() {
    let source = "function fact(n) {\n  return n <= 1 ? 1 : n * fact(n - 1);\n}\nlet f = fact(10);\n";
    let report = run_js(source);
    assert_eq!(lines_of(&report.trace), vec![4]);
    assert_eq!(values_of(&report.trace, "f"), vec![json!(3628800)]);
}

#[test]
fn test_unsupported_language_is_rejected() {
    let mut session = Session::new("fn main() {}", "rust");
    assert_eq!(
        session.visualize(&TraceRunner::default()),
        Err(PipelineError::UnsupportedLanguage(UnsupportedLanguage(
            "rust".to_string()
        )))
    );
}

#[test]
fn test_execution_payload_is_the_surface_source() {
    let source = "#include <iostream>\nint main() {\n    int x = 1;\n    return 0;\n}\n";
    let session = Session::new(source, "cpp");
    let payload = session.execution_payload().expect("Payload failed");
    assert_eq!(payload.language_id, "cpp");
    assert_eq!(payload.source, source);
    assert!(!payload.source.contains("async function"));
}

#[test]
fn test_oversized_allocations_are_range_errors() {
    let cases = [
        ("let s = 'ab'.repeat(1e12);\n", "RangeError: Invalid string length (line 1)"),
        ("let a = Array.from({ length: 1e12 });\n", "RangeError: Invalid array length (line 1)"),
        ("let a = new Array(4000000000);\n", "RangeError: Invalid array length (line 1)"),
        ("let a = [1];\na[1e12] = 2;\n", "RangeError: Invalid array length (line 2)"),
        ("let a = [1];\na.length = 1e10;\n", "RangeError: Invalid array length (line 2)"),
        ("let big = 2n ** 100000000n;\n", "RangeError: Maximum BigInt size exceeded (line 1)"),
    ];
    for (source, message) in cases {
        let report = run_js(source);
        assert_eq!(
            report.status,
            RunStatus::SimulationError {
                message: message.to_string()
            },
            "{}",
            source
        );
    }
}

#[test]
fn test_allocations_within_limits_still_work() {
    let report = run_js("let row = new Array(3).fill(0).concat([1]).join(\"-\");\nlet bar = \"=\".repeat(4);\nlet one = 1n ** 100000000n;\n");
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(values_of(&report.trace, "row").last(), Some(&json!("0-0-0-1")));
    assert_eq!(values_of(&report.trace, "bar").last(), Some(&json!("====")));
    assert_eq!(values_of(&report.trace, "one").last(), Some(&json!("1")));
}
