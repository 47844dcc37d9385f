//! Surface language → host language transpiler
//!
//! Purely textual: each [`rules::Pass`] is a list of regex rewrites applied in
//! [`rules::PassKind`] order. There is no parser and no symbol table, so the
//! output is an approximation good enough to animate, not a faithful
//! translation. Malformed output is not detected here; it surfaces later as a
//! syntax or runtime failure of the simulated run.

pub mod rules;

use crate::interpreter::constants::MAX_FIXED_POINT_ITERATIONS;
use crate::language::Language;
use regex::Regex;
use rules::{Pass, Ruleset};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

/// Program text in the host language, ready to be instrumented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProgram {
    /// Language the text was originally written in.
    pub language: Language,
    pub source: String,
}

impl HostProgram {
    /// Lines paired with their 1-based numbers.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.source.lines().enumerate().map(|(i, l)| (i + 1, l))
    }
}

/// Rewrite `source` into the host language.
///
/// Host-native input is returned unchanged.
pub fn transpile(source: &str, language: Language) -> HostProgram {
    let Some(ruleset) = rules::ruleset(language) else {
        return HostProgram {
            language,
            source: source.to_string(),
        };
    };

    let mut text = source.to_string();
    for pass in &ruleset.passes {
        text = run_pass(pass, text);
        debug!(pass = pass.kind.name(), %language, "rewrite pass applied");
    }
    text = finish(ruleset, text);

    HostProgram {
        language,
        source: text,
    }
}

fn run_pass(pass: &Pass, mut text: String) -> String {
    let mut iterations = 0;
    loop {
        let before = text.len();
        let mut changed = false;
        for rule in &pass.rules {
            let rewritten = rule.apply(&text);
            if rewritten != text {
                trace!(rule = rule.name, "rule matched");
                changed = true;
                text = rewritten.into_owned();
            }
        }
        iterations += 1;
        if !pass.fixed_point || !changed {
            return text;
        }
        if text.len() >= before || iterations >= MAX_FIXED_POINT_ITERATIONS {
            // A fixed-point pass must shrink the text on every round.
            warn!(pass = pass.kind.name(), iterations, "rewrite pass stopped shrinking");
            return text;
        }
    }
}

/// Structural steps of the cleanup pass that are not expressible as a
/// single local rewrite.
fn finish(ruleset: &Ruleset, mut text: String) -> String {
    if ruleset.unwrap_entry_class {
        text = unwrap_entry_class(&text);
    }
    if let Some(entry) = ruleset.entry_function {
        text = invoke_entry(&text, entry);
    }
    text
}

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*class[ \t]+\w+[^{]*\{[ \t]*$").expect("static class pattern")
});

/// Blank out the `class Main {` line and its closing brace so the body
/// stands at top level. Line numbers are preserved.
fn unwrap_entry_class(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let Some(open) = lines.iter().position(|l| CLASS_HEADER.is_match(l.trim_end_matches('\r'))) else {
        return text.to_string();
    };
    let Some(close) = lines.iter().rposition(|l| l.trim() == "}") else {
        return text.to_string();
    };
    if close <= open {
        return text.to_string();
    }
    lines[open] = "";
    lines[close] = "";
    lines.join("\n")
}

/// Append `await main();` when `main` is declared but never called.
fn invoke_entry(text: &str, entry: &str) -> String {
    let declared = Regex::new(&format!(r"\bfunction[ \t]+{}[ \t]*\(", regex::escape(entry)));
    let referenced = Regex::new(&format!(r"\b{}[ \t]*\(", regex::escape(entry)));
    let (Ok(declared), Ok(referenced)) = (declared, referenced) else {
        return text.to_string();
    };
    if !declared.is_match(text) || referenced.find_iter(text).count() > 1 {
        return text.to_string();
    }
    let mut out = text.trim_end().to_string();
    out.push_str(&format!("\nawait {}();\n", entry));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_host_language_is_identity() {
        let sources = [
            "",
            "let x = 1;",
            "int main() { return 0; }",
            "public class Main { List<Map<String, Integer>> m; }",
        ];
        for source in sources {
            assert_eq!(transpile(source, Language::JavaScript).source, source);
        }
    }

    #[test]
    fn test_nested_generics_reach_fixed_point() {
        let out = transpile("Map<String, List<Integer>> m = null;", Language::Java);
        assert!(!out.source.contains('<'), "{}", out.source);
        assert!(!out.source.contains('>'), "{}", out.source);
    }

    #[test]
    fn test_generic_stripping_leaves_comparisons() {
        let out = transpile("for (int i = 0; i < n; i++) { if (a > b) x = 1; }", Language::Java);
        assert!(out.source.contains("i < n"));
        assert!(out.source.contains("a > b"));
    }

    #[test]
    fn test_initializer_keeps_shape() {
        let out = transpile("int[][] grid = {{1,2},{3,4}};", Language::Java);
        assert_eq!(out.source.trim(), "let grid = [[1,2],[3,4]];");
    }

    #[test]
    fn test_initializer_leaves_blocks_alone() {
        let out = transpile("if (x) { y = 1; }", Language::Cpp);
        assert_eq!(out.source, "if (x) { y = 1; }");
    }

    #[test]
    fn test_java_program() {
        let source = "\
import java.util.*;

public class Main {
    public static void main(String[] args) {
        int[] arr = new int[3];
        List<Integer> list = new ArrayList<>();
        list.add(5);
        System.out.println(list.size());
    }
}";
        let out = transpile(source, Language::Java);
        let expected = "


    async function main(args) {
        let arr = new Array(3).fill(0);
        let list = [];
        list.push(5);
        console.log(list.length);
    }
await main();
";
        assert_eq!(out.source, expected);
    }

    #[test]
    fn test_cpp_program() {
        let source = "\
#include <iostream>
using namespace std;

int square(const int x) {
    return x * x;
}

int main() {
    int grid[2][3];
    vector<int> v = {1, 2};
    v.push_back(square(3));
    cout << v.size() << endl;
    return 0;
}";
        let out = transpile(source, Language::Cpp);
        let expected = "


async function square(x) {
    return x * x;
}

async function main() {
    let grid = Array.from({ length: 2 }, () => new Array(3).fill(0));
    let v = [1, 2];
    v.push(square(3));
    console.log(v.length);
    return 0;
}
await main();
";
        assert_eq!(out.source, expected);
    }

    #[test]
    fn test_entry_not_duplicated_when_called() {
        let source = "void main() {\n}\nmain();";
        let out = transpile(source, Language::Cpp);
        assert_eq!(out.source.matches("main(").count(), 2);
    }

    #[test]
    fn test_host_lines_are_numbered_from_one() {
        let host = transpile("a;\nb;", Language::JavaScript);
        let lines: Vec<_> = host.lines().collect();
        assert_eq!(lines, vec![(1, "a;"), (2, "b;")]);
    }
}
