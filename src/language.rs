//! Surface languages accepted by the pipeline
//!
//! The set is closed: [`Language::JavaScript`] is the native host language and
//! runs unchanged, while [`Language::Java`] and [`Language::Cpp`] are rewritten
//! into it by [`crate::transpile`].

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A language a user may write a program in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Java,
    Cpp,
}

/// Requested language has no transpile path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("visualization is unsupported for language '{0}'")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    pub const ALL: [Language; 3] = [Language::JavaScript, Language::Java, Language::Cpp];

    /// Whether programs in this language run without transpilation.
    pub fn is_host_native(self) -> bool {
        matches!(self, Language::JavaScript)
    }

    /// Stable identifier used on the wire to the execution service.
    pub fn id(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Toolchain version string paired with [`Language::id`] for remote runs.
    pub fn version(self) -> &'static str {
        match self {
            Language::JavaScript => "18.15.0",
            Language::Java => "15.0.2",
            Language::Cpp => "10.2.0",
        }
    }

    /// Guess the language from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, UnsupportedLanguage> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "cpp" | "cc" | "cxx" | "hpp" | "h" => Ok(Language::Cpp),
            _ => Err(UnsupportedLanguage(ext)),
        }
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" | "node" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::JavaScript => write!(f, "JavaScript"),
            Language::Java => write!(f, "Java"),
            Language::Cpp => write!(f, "C++"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("JS".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("java".parse::<Language>().unwrap(), Language::Java);
        assert!("python".parse::<Language>().is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path(Path::new("a/Main.java")).unwrap(), Language::Java);
        assert_eq!(Language::from_path(Path::new("sort.cc")).unwrap(), Language::Cpp);
        assert!(Language::from_path(Path::new("script.py")).is_err());
    }
}
