// Candidate identifiers: every name a step might be able to show

use crate::transpile::HostProgram;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_$]+").expect("word pattern"));

/// Names that are never program variables: HostLang, Java and C++ keywords
/// plus what the runtime provides.
const RESERVED: &[&str] = &[
    // HostLang
    "let", "const", "var", "function", "async", "await", "return", "if", "else", "while", "do",
    "for", "of", "in", "break", "continue", "throw", "try", "catch", "finally", "switch", "case",
    "default", "new", "typeof", "instanceof", "delete", "void", "true", "false", "null", "this",
    "class", "extends", "super", "yield", "import", "export", "from",
    // Java
    "public", "private", "protected", "static", "final", "abstract", "synchronized", "volatile",
    "transient", "native", "throws", "implements", "interface", "package", "enum", "int", "long",
    "double", "float", "char", "boolean", "byte", "short", "System", "out", "println", "print",
    "printf", "Scanner", "ArrayList", "List", "HashMap", "Map", "Integer",
    // C++
    "include", "iostream", "vector", "string", "std", "cout", "cin", "endl", "using",
    "namespace", "auto", "bool", "unsigned", "signed", "struct", "template", "typename",
    "sizeof", "nullptr",
    // Runtime
    "console", "Math", "Array", "Number", "String", "BigInt", "JSON", "Object", "parseInt",
    "parseFloat", "isNaN", "Infinity", "NaN", "undefined", "Error", "__step", "__scope",
];

/// Identifiers a capture point tries to evaluate, in a fixed order
///
/// A superset: names that are not in scope at a given step are skipped there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateIdentifierSet(BTreeSet<String>);

impl CandidateIdentifierSet {
    pub fn new() -> Self {
        CandidateIdentifierSet::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for CandidateIdentifierSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        CandidateIdentifierSet(iter.into_iter().collect())
    }
}

/// Every identifier-shaped word of the program minus the reserved names
pub fn candidate_identifiers(host: &HostProgram) -> CandidateIdentifierSet {
    WORD.find_iter(&host.source)
        .map(|m| m.as_str())
        .filter(|word| !word.starts_with(|c: char| c.is_ascii_digit()))
        .filter(|word| !RESERVED.contains(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::transpile::transpile;

    #[test]
    fn test_reserved_and_numeric_words_are_dropped() {
        let host = transpile(
            "let total = 0x1F;\nfor (let i = 0; i < 10n; i++) {\n  console.log(total, i);\n}\n",
            Language::JavaScript,
        );
        let candidates = candidate_identifiers(&host);
        let names: Vec<&str> = candidates.iter().collect();
        assert_eq!(names, vec!["i", "log", "total"]);
    }

    #[test]
    fn test_candidates_are_sorted_and_unique() {
        let host = transpile("let b = 1;\nlet a = b + b;\nlet $c = a;\n", Language::JavaScript);
        let candidates = candidate_identifiers(&host);
        let names: Vec<&str> = candidates.iter().collect();
        assert_eq!(names, vec!["$c", "a", "b"]);
    }
}
