//! Rewrite rule tables
//!
//! Every surface language is described by a [`Ruleset`]: an ordered list of
//! [`Pass`]es, each holding [`RewriteRule`]s. Supporting another language or
//! another library call means adding rows here, not touching the transpiler.
//!
//! Rules are line-preserving wherever possible. A removed header line keeps its
//! newline, so line numbers in the host program still match the surface source.

use crate::language::Language;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// How a rule produces its replacement text.
pub enum Replacement {
    /// A `regex` replacement template (`${1}` style).
    Template(&'static str),
    /// A function of the captures.
    With(fn(&Captures<'_>) -> String),
}

/// A single pattern→replacement rewrite.
pub struct RewriteRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replace: Replacement,
}

impl RewriteRule {
    fn template(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self {
            name,
            pattern: compile(pattern),
            replace: Replacement::Template(template),
        }
    }

    fn with(name: &'static str, pattern: &str, f: fn(&Captures<'_>) -> String) -> Self {
        Self {
            name,
            pattern: compile(pattern),
            replace: Replacement::With(f),
        }
    }

    /// Apply the rule to every match in `text`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.replace {
            Replacement::Template(template) => self.pattern.replace_all(text, *template),
            Replacement::With(f) => self.pattern.replace_all(text, |caps: &Captures<'_>| f(caps)),
        }
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static rewrite pattern")
}

/// The fixed pass order. Later passes rely on earlier ones having normalised
/// the text (e.g. declarations assume generics are already gone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PassKind {
    Headers,
    Modifiers,
    Generics,
    Initializers,
    Allocations,
    Signatures,
    Declarations,
    Calls,
    Cleanup,
}

impl PassKind {
    pub fn name(self) -> &'static str {
        match self {
            PassKind::Headers => "headers",
            PassKind::Modifiers => "modifiers",
            PassKind::Generics => "generics",
            PassKind::Initializers => "initializers",
            PassKind::Allocations => "allocations",
            PassKind::Signatures => "signatures",
            PassKind::Declarations => "declarations",
            PassKind::Calls => "calls",
            PassKind::Cleanup => "cleanup",
        }
    }
}

#[derive(Debug)]
pub struct Pass {
    pub kind: PassKind,
    pub rules: Vec<RewriteRule>,
    /// Re-apply until the text stops changing.
    pub fixed_point: bool,
}

impl Pass {
    fn once(kind: PassKind, rules: Vec<RewriteRule>) -> Self {
        Self {
            kind,
            rules,
            fixed_point: false,
        }
    }

    fn until_stable(kind: PassKind, rules: Vec<RewriteRule>) -> Self {
        Self {
            kind,
            rules,
            fixed_point: true,
        }
    }
}

/// Everything needed to rewrite one surface language.
#[derive(Debug)]
pub struct Ruleset {
    pub language: Language,
    pub passes: Vec<Pass>,
    /// Strip the single public class wrapping the program body.
    pub unwrap_entry_class: bool,
    /// Function invoked automatically when the program never calls it.
    pub entry_function: Option<&'static str>,
}

static JAVA: LazyLock<Ruleset> = LazyLock::new(java_ruleset);
static CPP: LazyLock<Ruleset> = LazyLock::new(cpp_ruleset);

/// Look up the ruleset for a language. Host-native languages have none.
pub fn ruleset(language: Language) -> Option<&'static Ruleset> {
    match language {
        Language::JavaScript => None,
        Language::Java => Some(&JAVA),
        Language::Cpp => Some(&CPP),
    }
}

/// Words that may precede an identifier without being a type.
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "else", "new", "throw", "case", "delete", "do", "goto", "await", "let", "const",
    "var", "typeof", "class", "struct", "if", "while", "for", "switch", "function", "async",
    "using", "namespace", "import", "package", "yield", "in", "of", "instanceof",
];

fn is_statement_keyword(word: &str) -> bool {
    STATEMENT_KEYWORDS.contains(&word)
}

/// Swap every brace for the matching bracket.
fn braces_to_brackets(span: &str) -> String {
    span.chars()
        .map(|c| match c {
            '{' => '[',
            '}' => ']',
            other => other,
        })
        .collect()
}

fn fill_row(len: &str, row: &str) -> String {
    format!(
        "Array.from({{ length: {} }}, () => new Array({}).fill(0))",
        len.trim(),
        row.trim()
    )
}

fn fill_list(len: &str, value: &str) -> String {
    format!("new Array({}).fill({})", len.trim(), value.trim())
}

// ===== Shared rule builders =====

fn initializer_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::with(
            "aggregate-initializer",
            r#"(=[ \t]*)(\{[\w \t\r\n,.'"+\-{}]*\})([ \t]*;)"#,
            |caps| format!("{}{}{}", &caps[1], braces_to_brackets(&caps[2]), &caps[3]),
        ),
        RewriteRule::with(
            "array-creation-initializer",
            r#"\bnew[ \t]+\w+(?:[ \t]*\[[ \t]*\])+[ \t]*(\{[\w \t\r\n,.'"+\-{}]*\})"#,
            |caps| braces_to_brackets(&caps[1]),
        ),
    ]
}

fn generic_rules() -> Vec<RewriteRule> {
    // Innermost group only: the body may not contain another angle bracket.
    vec![RewriteRule::template(
        "innermost-generic",
        r"\b([A-Za-z_]\w*)[ \t]*<[\w \t,?.\[\]*]*>",
        "${1}",
    )]
}

fn signature_rule() -> RewriteRule {
    RewriteRule::with(
        "typed-signature",
        r"(?m)^([ \t]*)([A-Za-z_]\w*)((?:[ \t]*(?:\[[ \t]*\]|\*+|&+))*)[ \t]+[*&]*([A-Za-z_]\w*)[ \t]*\(([^()\n]*)\)[ \t]*(?:throws[ \t]+[\w., \t]+?)?[ \t]*(\{?)[ \t]*$",
        |caps| {
            if is_statement_keyword(&caps[2]) || is_statement_keyword(&caps[4]) {
                return caps[0].to_string();
            }
            let params = untyped_params(&caps[5]);
            let brace = if caps[6].is_empty() { "" } else { " {" };
            format!("{}async function {}({}){}", &caps[1], &caps[4], params, brace)
        },
    )
}

static PARAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"([A-Za-z_]\w*)[ \t]*(?:\[[^\]]*\][ \t]*)*$"));

/// `int a, String[] b` → `a, b`
fn untyped_params(params: &str) -> String {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "void")
        .filter_map(|p| {
            let p = p.split('=').next().unwrap_or(p).trim();
            PARAM_NAME.captures(p).map(|c| c[1].to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn declaration_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::template(
            "primitive-cast",
            r"\([ \t]*(?:(?:unsigned|signed|long)[ \t]+)*(?:int|long|short|double|float|char|byte|size_t|bool|boolean)[ \t]*\)[ \t]*",
            "",
        ),
        RewriteRule::template(
            "typed-local",
            r"\b(?:(?:unsigned|signed|long|short)[ \t]+)*(?:int|long|short|double|float|char|bool|boolean|byte|String|string|auto|var|size_t|unsigned|Integer|Long|Double|Float|Character|Boolean|Byte|Short|Object|List|ArrayList|LinkedList|Deque|ArrayDeque|Queue|Stack|vector|deque|queue|stack)\b(?:[ \t]*\[[ \t]*\])*[ \t]*[*&]*[ \t]+([A-Za-z_]\w*)",
            "let ${1}",
        ),
    ]
}

fn range_for_rule() -> RewriteRule {
    RewriteRule::template(
        "range-for",
        r"\bfor[ \t]*\([ \t]*let[ \t]+([A-Za-z_]\w*)[ \t]*:",
        "for (let ${1} of",
    )
}

fn cleanup_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::template("declaration-sigil", r"\blet[ \t]*[*&]+[ \t]*", "let "),
        RewriteRule::template("arrow-member", r"->", "."),
        RewriteRule::template("address-of-argument", r"([(,][ \t]*)&([A-Za-z_])", "${1}${2}"),
    ]
}

// ===== Java =====

fn java_ruleset() -> Ruleset {
    Ruleset {
        language: Language::Java,
        passes: vec![
            Pass::once(
                PassKind::Headers,
                vec![
                    RewriteRule::template(
                        "package",
                        r"(?m)^[ \t]*package[ \t]+[\w.]+[ \t]*;[ \t]*$",
                        "",
                    ),
                    RewriteRule::template(
                        "import",
                        r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?[\w.*]+[ \t]*;[ \t]*$",
                        "",
                    ),
                    RewriteRule::template("annotation", r"(?m)^[ \t]*@\w+[ \t]*$", ""),
                    RewriteRule::template("scanner", r"(?m)^.*\bnew[ \t]+Scanner\b.*$", ""),
                ],
            ),
            Pass::once(
                PassKind::Modifiers,
                vec![RewriteRule::template(
                    "modifier",
                    r"\b(?:public|private|protected|static|final|abstract|synchronized|transient|volatile)[ \t]+",
                    "",
                )],
            ),
            Pass::until_stable(PassKind::Generics, generic_rules()),
            Pass::once(PassKind::Initializers, initializer_rules()),
            Pass::once(
                PassKind::Allocations,
                vec![
                    RewriteRule::with(
                        "typed-matrix-allocation",
                        r"\b[A-Za-z_]\w*(?:[ \t]*\[[ \t]*\]){2}[ \t]+([A-Za-z_]\w*)[ \t]*=[ \t]*new[ \t]+\w+[ \t]*\[([^\]\n]+)\][ \t]*\[([^\]\n]+)\]",
                        |caps| format!("let {} = {}", &caps[1], fill_row(&caps[2], &caps[3])),
                    ),
                    RewriteRule::with(
                        "matrix-allocation",
                        r"\bnew[ \t]+\w+[ \t]*\[([^\]\n]+)\][ \t]*\[([^\]\n]+)\]",
                        |caps| fill_row(&caps[1], &caps[2]),
                    ),
                    RewriteRule::with(
                        "array-allocation",
                        r"\bnew[ \t]+\w+[ \t]*\[([^\]\n]+)\]",
                        |caps| fill_list(&caps[1], "0"),
                    ),
                    RewriteRule::template(
                        "typed-array-local",
                        r"\b[A-Za-z_]\w*(?:[ \t]*\[[ \t]*\])+[ \t]+([A-Za-z_]\w*)([ \t]*[=;])",
                        "let ${1}${2}",
                    ),
                    RewriteRule::template(
                        "empty-collection",
                        r"\bnew[ \t]+(?:ArrayList|LinkedList|Vector|ArrayDeque|Stack)[ \t]*\([ \t]*\)",
                        "[]",
                    ),
                    RewriteRule::template(
                        "copied-collection",
                        r"\bnew[ \t]+(?:ArrayList|LinkedList|Vector|ArrayDeque|Stack)[ \t]*\(([^()]+)\)",
                        "Array.from(${1})",
                    ),
                ],
            ),
            Pass::once(PassKind::Signatures, vec![signature_rule()]),
            Pass::once(PassKind::Declarations, declaration_rules()),
            Pass::once(
                PassKind::Calls,
                vec![
                    range_for_rule(),
                    RewriteRule::template(
                        "println",
                        r"\bSystem\.out\.print(?:ln|f)?[ \t]*\(",
                        "console.log(",
                    ),
                    RewriteRule::template(
                        "eprintln",
                        r"\bSystem\.err\.print(?:ln|f)?[ \t]*\(",
                        "console.error(",
                    ),
                    RewriteRule::template("size", r"\.size\(\)", ".length"),
                    RewriteRule::template("string-length", r"\.length\(\)", ".length"),
                    RewriteRule::template("is-empty", r"\.isEmpty\(\)", ".length === 0"),
                    RewriteRule::template("add", r"\.add\(", ".push("),
                    RewriteRule::template("contains", r"\.contains\(", ".includes("),
                    RewriteRule::template("get", r"\.get\(([^()]*)\)", "[${1}]"),
                    RewriteRule::template("set", r"\.set\(([^(),]+),([^()]*)\)", "[${1}] = ${2}"),
                    RewriteRule::template("equals", r"\.equals\(", " === ("),
                    RewriteRule::template("max-value", r"\bInteger\.MAX_VALUE\b", "Number.MAX_SAFE_INTEGER"),
                    RewriteRule::template("min-value", r"\bInteger\.MIN_VALUE\b", "Number.MIN_SAFE_INTEGER"),
                    RewriteRule::template("parse-int", r"\bInteger\.parseInt\(", "parseInt("),
                    RewriteRule::template("value-of", r"\bString\.valueOf\(", "String("),
                    RewriteRule::template("arrays-fill", r"\bArrays\.fill\(([^,()]+),", "${1}.fill("),
                    RewriteRule::template(
                        "arrays-sort",
                        r"\b(?:Arrays|Collections)\.sort\(([^,()]+)\)",
                        "${1}.sort((a, b) => a - b)",
                    ),
                    RewriteRule::template(
                        "arrays-to-string",
                        r"\bArrays\.(?:deepToString|toString)\(([^()]+)\)",
                        "JSON.stringify(${1})",
                    ),
                    RewriteRule::template("scanner-read", r"\b\w+\.next(?:Int|Line|Double|Long)?\(\)", "0"),
                ],
            ),
            Pass::once(PassKind::Cleanup, cleanup_rules()),
        ],
        unwrap_entry_class: true,
        entry_function: Some("main"),
    }
}

// ===== C++ =====

/// `a << b << endl` → `a, b`
fn stream_arguments(chain: &str) -> String {
    chain
        .split("<<")
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "endl" && *part != r#""\n""#)
        .collect::<Vec<_>>()
        .join(", ")
}

fn vector_constructor(caps: &Captures<'_>) -> String {
    static NESTED: LazyLock<Regex> =
        LazyLock::new(|| compile(r"^[ \t]*vector[ \t]*\(([^,()]+)(?:,[^()]*)?\)[ \t]*$"));
    let name = &caps[1];
    let len = &caps[2];
    match caps.get(3).map(|m| m.as_str()) {
        Some(fill) => match NESTED.captures(fill) {
            Some(row) => format!("let {} = {};", name, fill_row(len, &row[1])),
            None => format!("let {} = {};", name, fill_list(len, fill)),
        },
        None => format!("let {} = {};", name, fill_list(len, "0")),
    }
}

fn cpp_ruleset() -> Ruleset {
    Ruleset {
        language: Language::Cpp,
        passes: vec![
            Pass::once(
                PassKind::Headers,
                vec![
                    RewriteRule::template("preprocessor", r"(?m)^[ \t]*#.*$", ""),
                    RewriteRule::template(
                        "using-namespace",
                        r"(?m)^[ \t]*using[ \t]+namespace[ \t]+\w+[ \t]*;[ \t]*$",
                        "",
                    ),
                    RewriteRule::template("template", r"(?m)^[ \t]*template[ \t]*<[^>\n]*>[ \t]*$", ""),
                ],
            ),
            Pass::once(
                PassKind::Modifiers,
                vec![
                    RewriteRule::template(
                        "modifier",
                        r"\b(?:static|const|constexpr|inline|virtual|mutable|register|volatile|explicit)[ \t]+",
                        "",
                    ),
                    RewriteRule::template("std-qualifier", r"\bstd::", ""),
                    RewriteRule::template("access-label", r"(?m)^[ \t]*(?:public|private|protected)[ \t]*:[ \t]*$", ""),
                ],
            ),
            Pass::until_stable(PassKind::Generics, generic_rules()),
            Pass::once(PassKind::Initializers, initializer_rules()),
            Pass::once(
                PassKind::Allocations,
                vec![
                    RewriteRule::with(
                        "fixed-matrix",
                        r"\b([A-Za-z_]\w*)[ \t]+([A-Za-z_]\w*)[ \t]*\[([^\]\n]+)\][ \t]*\[([^\]\n]+)\][ \t]*;",
                        |caps| {
                            if is_statement_keyword(&caps[1]) {
                                return caps[0].to_string();
                            }
                            format!("let {} = {};", &caps[2], fill_row(&caps[3], &caps[4]))
                        },
                    ),
                    RewriteRule::with(
                        "fixed-array",
                        r"\b([A-Za-z_]\w*)[ \t]+([A-Za-z_]\w*)[ \t]*\[([^\]\n]+)\][ \t]*;",
                        |caps| {
                            if is_statement_keyword(&caps[1]) {
                                return caps[0].to_string();
                            }
                            format!("let {} = {};", &caps[2], fill_list(&caps[3], "0"))
                        },
                    ),
                    RewriteRule::with(
                        "initialized-array",
                        r"\b([A-Za-z_]\w*)[ \t]+([A-Za-z_]\w*)(?:[ \t]*\[[^\]\n]*\])+[ \t]*=",
                        |caps| {
                            if is_statement_keyword(&caps[1]) {
                                return caps[0].to_string();
                            }
                            format!("let {} =", &caps[2])
                        },
                    ),
                    RewriteRule::with(
                        "sized-vector",
                        r"\bvector[ \t]*[*&]*[ \t]+([A-Za-z_]\w*)[ \t]*\(([^,;\n]+?)(?:,([^;\n]+))?\)[ \t]*;",
                        vector_constructor,
                    ),
                    RewriteRule::template(
                        "empty-vector",
                        r"\bvector[ \t]+([A-Za-z_]\w*)[ \t]*;",
                        "let ${1} = [];",
                    ),
                    RewriteRule::with(
                        "heap-matrix",
                        r"\bnew[ \t]+\w+[ \t]*\[([^\]\n]+)\][ \t]*\[([^\]\n]+)\]",
                        |caps| fill_row(&caps[1], &caps[2]),
                    ),
                    RewriteRule::with(
                        "heap-array",
                        r"\bnew[ \t]+\w+[ \t]*\[([^\]\n]+)\]",
                        |caps| fill_list(&caps[1], "0"),
                    ),
                ],
            ),
            Pass::once(PassKind::Signatures, vec![signature_rule()]),
            Pass::once(PassKind::Declarations, declaration_rules()),
            Pass::once(
                PassKind::Calls,
                vec![
                    range_for_rule(),
                    RewriteRule::with("cout", r"\bcout[ \t]*<<([^;]*);", |caps| {
                        format!("console.log({});", stream_arguments(&caps[1]))
                    }),
                    RewriteRule::with("cerr", r"\bcerr[ \t]*<<([^;]*);", |caps| {
                        format!("console.error({});", stream_arguments(&caps[1]))
                    }),
                    RewriteRule::template("cin", r"\bcin[ \t]*>>[^;]*;", ""),
                    RewriteRule::template("printf", r"\bprintf[ \t]*\(", "console.log("),
                    RewriteRule::template("push-back", r"\.(?:push_back|emplace_back)\(", ".push("),
                    RewriteRule::template("pop-back", r"\.pop_back\(\)", ".pop()"),
                    RewriteRule::template("size", r"\.(?:size|length)\(\)", ".length"),
                    RewriteRule::template("empty", r"\.empty\(\)", ".length === 0"),
                    RewriteRule::template("back", r"\.back\(\)", ".at(-1)"),
                    RewriteRule::template("front", r"\.front\(\)", "[0]"),
                    RewriteRule::template("int-max", r"\b(?:INT_MAX|LLONG_MAX|LONG_MAX)\b", "Number.MAX_SAFE_INTEGER"),
                    RewriteRule::template("int-min", r"\b(?:INT_MIN|LLONG_MIN|LONG_MIN)\b", "Number.MIN_SAFE_INTEGER"),
                    RewriteRule::template("null-pointer", r"\b(?:nullptr|NULL)\b", "null"),
                    RewriteRule::template("to-string", r"\bto_string\(", "String("),
                    RewriteRule::with(
                        "math-free-function",
                        r"(^|[^.\w])((?:function[ \t]+)?)(max|min|abs|sqrt|pow|floor|ceil)[ \t]*\(",
                        |caps| {
                            // A user-defined `max` keeps its own name.
                            if !caps[2].is_empty() {
                                return caps[0].to_string();
                            }
                            format!("{}Math.{}(", &caps[1], &caps[3])
                        },
                    ),
                    RewriteRule::template(
                        "swap",
                        r"\bswap\(([^,()]+),([^()]+)\)",
                        "[${1}, ${2}] = [${2}, ${1}]",
                    ),
                    RewriteRule::template(
                        "sort-range",
                        r"\bsort\(([\w.]+)\.begin\(\)[ \t]*,[ \t]*[\w.]+\.end\(\)\)",
                        "${1}.sort((a, b) => a - b)",
                    ),
                ],
            ),
            Pass::once(PassKind::Cleanup, cleanup_rules()),
        ],
        unwrap_entry_class: false,
        entry_function: Some("main"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_pass(language: Language, kind: PassKind, text: &str) -> String {
        let rules = ruleset(language).unwrap();
        let pass = rules.passes.iter().find(|p| p.kind == kind).unwrap();
        let mut out = text.to_string();
        for rule in &pass.rules {
            out = rule.apply(&out).into_owned();
        }
        out
    }

    #[test]
    fn test_pass_order_is_fixed() {
        for language in [Language::Java, Language::Cpp] {
            let kinds: Vec<PassKind> = ruleset(language).unwrap().passes.iter().map(|p| p.kind).collect();
            let mut sorted = kinds.clone();
            sorted.sort();
            assert_eq!(kinds, sorted);
            assert_eq!(kinds.len(), 9);
        }
    }

    #[test]
    fn test_host_language_has_no_ruleset() {
        assert!(ruleset(Language::JavaScript).is_none());
    }

    #[test]
    fn test_signature_params_lose_types() {
        let out = apply_pass(Language::Java, PassKind::Signatures, "void sort(int[] arr, int n) {");
        assert_eq!(out, "async function sort(arr, n) {");
    }

    #[test]
    fn test_signature_ignores_control_lines() {
        let line = "    else if (a < b) {";
        assert_eq!(apply_pass(Language::Cpp, PassKind::Signatures, line), line);
    }

    #[test]
    fn test_cout_becomes_console_log() {
        let out = apply_pass(Language::Cpp, PassKind::Calls, r#"cout << "x = " << x << endl;"#);
        assert_eq!(out, r#"console.log("x = ", x);"#);
    }

    #[test]
    fn test_nested_vector_allocates_rows() {
        let out = apply_pass(Language::Cpp, PassKind::Allocations, "vector g(n, vector(m, 0));");
        assert_eq!(
            out,
            "let g = Array.from({ length: n }, () => new Array(m).fill(0));"
        );
    }

    #[test]
    fn test_untyped_params() {
        assert_eq!(untyped_params("int a, vector& v, int arr[]"), "a, v, arr");
        assert_eq!(untyped_params("void"), "");
    }
}
