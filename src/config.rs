//! Command-line configuration
//!
//! Usage: `stepscope <FILE> [--lang LANG] [--emit KIND] [--max-steps N]`

use crate::interpreter::constants::DEFAULT_MAX_STEPS;
use crate::language::{Language, UnsupportedLanguage};
use crate::runner::RunnerConfig;
use clap::{Parser, ValueEnum};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "stepscope")]
#[command(about = "Step through a small program and watch its variables change")]
pub struct Cli {
    /// Source file to visualize
    pub path: PathBuf,

    /// Surface language (js, java, cpp). Inferred from the extension if omitted
    #[arg(long = "lang")]
    pub language: Option<String>,

    /// What to produce
    #[arg(long, value_enum, default_value_t = Emit::Tui)]
    pub emit: Emit,

    /// Stop the simulation after this many steps (0 disables the cap)
    #[arg(long = "max-steps", default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,
}

/// Output of a CLI invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Interactive trace viewer
    Tui,
    /// Run report as JSON
    Trace,
    /// Structure report as JSON
    Report,
    /// Transpiled host program
    Host,
    /// Host program with its capture points marked
    Instrumented,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
}

/// Everything a run of the binary needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub source: String,
    pub language: Language,
    pub emit: Emit,
    pub runner: RunnerConfig,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let language = match &cli.language {
            Some(id) => id.parse()?,
            None => Language::from_path(&cli.path)?,
        };
        let source = fs::read_to_string(&cli.path).map_err(|source| ConfigError::Read {
            path: cli.path.clone(),
            source,
        })?;

        let runner = RunnerConfig {
            max_steps: (cli.max_steps > 0).then_some(cli.max_steps),
            ..RunnerConfig::default()
        };

        Ok(Config {
            path: cli.path,
            source,
            language,
            emit: cli.emit,
            runner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["stepscope", "main.js"]).unwrap();
        assert_eq!(cli.emit, Emit::Tui);
        assert_eq!(cli.max_steps, DEFAULT_MAX_STEPS);
        assert!(cli.language.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "stepscope",
            "prog.txt",
            "--lang",
            "c++",
            "--emit",
            "instrumented",
            "--max-steps",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.language.as_deref(), Some("c++"));
        assert_eq!(cli.emit, Emit::Instrumented);
        assert_eq!(cli.max_steps, 0);
    }

    #[test]
    fn test_unknown_extension_without_lang_is_rejected() {
        let cli = Cli::try_parse_from(["stepscope", "script.py"]).unwrap();
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let cli = Cli::try_parse_from(["stepscope", "/nonexistent/stepscope/main.js"]).unwrap();
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Read { .. })));
    }
}
