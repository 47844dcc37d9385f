//! Structure Analyzer
//!
//! A single top-to-bottom scan over the surface source that estimates loop
//! nesting, guesses a complexity class and lists declared functions.
//!
//! The complexity class is advisory. It is a textual heuristic that knows
//! nothing about recursion depth, amortized behavior or data-dependent
//! bounds, and any closing brace inside a loop ends one level of nesting.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Coarse time complexity estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ComplexityClass {
    #[serde(rename = "O(1)")]
    Constant,
    #[serde(rename = "O(log n)")]
    Logarithmic,
    #[serde(rename = "O(n)")]
    Linear,
    #[serde(rename = "O(n²)")]
    Quadratic,
    #[serde(rename = "O(n³)")]
    Cubic,
}

impl ComplexityClass {
    /// Class implied by the deepest loop nesting
    pub fn from_nesting(depth: usize) -> Self {
        match depth {
            0 => ComplexityClass::Constant,
            1 => ComplexityClass::Linear,
            2 => ComplexityClass::Quadratic,
            _ => ComplexityClass::Cubic,
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Quadratic => "O(n²)",
            ComplexityClass::Cubic => "O(n³)",
        };
        f.write_str(text)
    }
}

/// A declared function and the line it was first declared on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub complexity: ComplexityClass,
    pub max_nesting: usize,
    pub functions: Vec<FunctionInfo>,
}

impl Default for StructureReport {
    fn default() -> Self {
        StructureReport {
            complexity: ComplexityClass::Constant,
            max_nesting: 0,
            functions: Vec::new(),
        }
    }
}

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else",
];

static LOOP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:for|while)\b").expect("loop header pattern"));

static COMPOUND_SCALING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*=|/=|<<=|>>=").expect("compound scaling pattern"));

/// `v = v * k`, `v = v / k`, `v = v >> k`, `v = v << k`
static SELF_SCALING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_$][\w$]*)\s*=\s*([A-Za-z_$][\w$]*)\s*(?:\*|/|>>|<<)[^=]")
        .expect("self scaling pattern")
});

/// `function name(`, `async function name(`
static SCRIPT_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(")
        .expect("script function pattern")
});

/// `const name = (...) =>`, `let name = async x =>`, `var name = function`
static BOUND_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s*)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("bound function pattern")
});

/// Typed signatures: `public static int sum(int[] a) {`, `vector<int> f(int n)`
static TYPED_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[\w<>\[\],:&*]+\s+)+[&*]?([A-Za-z_]\w*)\s*\([^;]*\)\s*(?:const\s*)?(?:\{\s*)?$")
        .expect("typed function pattern")
});

/// Scan `source` once and report its structure
pub fn analyze(source: &str) -> StructureReport {
    let mut current_nesting = 0usize;
    let mut max_nesting = 0usize;
    let mut logarithmic = false;
    let mut functions: Vec<FunctionInfo> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        if LOOP_HEADER.is_match(trimmed) {
            current_nesting += 1;
            max_nesting = max_nesting.max(current_nesting);
            if has_scaling_update(trimmed) {
                logarithmic = true;
            }
        } else if current_nesting > 0 && trimmed.contains('}') && !trimmed.contains('{') {
            current_nesting -= 1;
        }

        if let Some(name) = declared_function(line) {
            if !functions.iter().any(|f| f.name == name) {
                functions.push(FunctionInfo {
                    name: name.to_string(),
                    line: index + 1,
                });
            }
        }
    }

    let complexity = if logarithmic {
        ComplexityClass::Logarithmic
    } else {
        ComplexityClass::from_nesting(max_nesting)
    };
    StructureReport {
        complexity,
        max_nesting,
        functions,
    }
}

/// Whether a loop line changes a variable geometrically
fn has_scaling_update(line: &str) -> bool {
    if COMPOUND_SCALING.is_match(line) {
        return true;
    }
    SELF_SCALING
        .captures_iter(line)
        .any(|caps| caps.get(1).map(|m| m.as_str()) == caps.get(2).map(|m| m.as_str()))
}

/// Name declared by a function header on this line, if any
fn declared_function(line: &str) -> Option<&str> {
    [&*SCRIPT_FUNCTION, &*BOUND_FUNCTION]
        .iter()
        .find_map(|pattern| pattern.captures(line).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
        .or_else(|| typed_declaration(line))
        .filter(|name| !CONTROL_KEYWORDS.contains(name))
}

/// Words that start a statement or expression, never a return type
const STATEMENT_LEADERS: &[&str] = &[
    "return", "new", "await", "throw", "typeof", "else", "case", "yield", "delete", "void",
];

/// `int sum(int[] a) {`; `return helper(n)` has the same shape and is skipped
fn typed_declaration(line: &str) -> Option<&str> {
    let leader = line.split_whitespace().next()?;
    if STATEMENT_LEADERS.contains(&leader) {
        return None;
    }
    TYPED_FUNCTION.captures(line)?.get(1).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_doubling_loop_is_logarithmic() {
        let report = analyze("for (let x = 1; x < 8; x *= 2) {}\n");
        assert_eq!(report.complexity, ComplexityClass::Logarithmic);
        assert_eq!(report.complexity.to_string(), "O(log n)");
        assert_eq!(report.max_nesting, 1);
    }

    #[test]
    fn test_self_referencing_updates() {
        assert!(has_scaling_update("while (n > 1) { n = n / 2; }"));
        assert!(has_scaling_update("for (int i = n; i > 0; i = i >> 1)"));
        assert!(!has_scaling_update("for (let i = 0; i < n; i = j * 2)"));
        assert!(!has_scaling_update("for (let i = 0; i < n; i++)"));
    }

    #[test]
    fn test_nesting_maps_to_polynomial_classes() {
        let nested = "for (let i = 0; i < n; i++) {\n  for (let j = 0; j < n; j++) {\n    sum += i * j;\n  }\n}\n";
        let report = analyze(nested);
        assert_eq!(report.max_nesting, 2);
        assert_eq!(report.complexity, ComplexityClass::Quadratic);

        assert_eq!(analyze("let a = 1;\n").complexity, ComplexityClass::Constant);
        let triple = "for (;;) {\nfor (;;) {\nwhile (x) {\n}\n}\n}\n";
        assert_eq!(analyze(triple).complexity, ComplexityClass::Cubic);
    }

    #[test]
    fn test_closing_brace_ends_a_level() {
        let source = "for (let i = 0; i < n; i++) {\n}\nfor (let j = 0; j < n; j++) {\n}\n";
        let report = analyze(source);
        assert_eq!(report.max_nesting, 1);
        assert_eq!(report.complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_functions_across_languages() {
        let source = "public class Main {\n    public static int sum(int[] a) {\n        return 0;\n    }\n    public static void main(String[] args) {\n        if (x) {\n        }\n    }\n}\nvector<int> twoSum(vector<int>& nums, int target) {\n}\nasync function main() {}\nconst helper = (a, b) => a + b;\n";
        let report = analyze(source);
        let names: Vec<(&str, usize)> = report
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.line))
            .collect();
        assert_eq!(names, vec![("sum", 2), ("main", 5), ("twoSum", 10), ("helper", 13)]);
    }

    #[test]
    fn test_control_keywords_are_not_functions() {
        let report = analyze("} else if (a < b) {\nwhile (true) {\nreturn compute(a);\n");
        assert!(report.functions.is_empty());
    }

    #[test]
    fn test_unterminated_calls_are_not_typed_declarations() {
        let source = "function outer(n) {\n  return helper(n)\n}\nawait outer(3)\nthrow new Error(msg)\n";
        let names: Vec<String> = analyze(source).functions.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["outer".to_string()]);
        assert_eq!(typed_declaration("  return helper(n)"), None);
        assert_eq!(typed_declaration("    static long fib(int n) {"), Some("fib"));
    }

    #[test]
    fn test_report_serializes_with_class_text() {
        let report = analyze("for (let i = 0; i < n; i++) {\n}\nfunction f() {}\n");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "complexity": "O(n)",
                "maxNesting": 1,
                "functions": [{ "name": "f", "line": 3 }]
            })
        );
    }
}
