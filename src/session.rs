//! Editor-facing session
//!
//! Holds the text and language the user is editing. The structure report is
//! recomputed on every change; a trace is produced only when a visualization
//! is requested, and each request replaces the previous one.

use crate::analyzer::{analyze, StructureReport};
use crate::instrument::{candidate_identifiers, instrument, InstrumentedProgram};
use crate::language::{Language, UnsupportedLanguage};
use crate::parser::ParseError;
use crate::runner::{RunReport, TraceRunner};
use crate::transpile::{transpile, HostProgram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures that stop the pipeline before a run starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),

    #[error("SyntaxError: {0}")]
    Syntax(#[from] ParseError),
}

/// What the external execution service receives for a real run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub language_id: String,
    pub version: String,
    /// The surface source exactly as written
    pub source: String,
}

pub struct Session {
    source: String,
    language_id: String,
    structure: StructureReport,
    last_run: Option<RunReport>,
}

impl Session {
    pub fn new(source: impl Into<String>, language_id: impl Into<String>) -> Self {
        let source = source.into();
        let structure = analyze(&source);
        Session {
            source,
            language_id: language_id.into(),
            structure,
            last_run: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn language(&self) -> Result<Language, UnsupportedLanguage> {
        self.language_id.parse()
    }

    /// Report for the current text
    pub fn structure(&self) -> &StructureReport {
        &self.structure
    }

    /// Report of the most recent visualization, if it is still current
    pub fn last_run(&self) -> Option<&RunReport> {
        self.last_run.as_ref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.refresh();
    }

    pub fn set_language(&mut self, language_id: impl Into<String>) {
        self.language_id = language_id.into();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.structure = analyze(&self.source);
        self.last_run = None;
        debug!(
            complexity = %self.structure.complexity,
            functions = self.structure.functions.len(),
            "structure report updated"
        );
    }

    /// The current text rewritten into the host language
    pub fn host_program(&self) -> Result<HostProgram, PipelineError> {
        let language = self.language()?;
        Ok(transpile(&self.source, language))
    }

    /// The current text transpiled and instrumented
    pub fn instrumented(&self) -> Result<InstrumentedProgram, PipelineError> {
        let host = self.host_program()?;
        let candidates = candidate_identifiers(&host);
        Ok(instrument(&host, candidates)?)
    }

    /// Transpile, instrument and run the current text
    ///
    /// A program that does not parse yields a report with a `SyntaxError`
    /// status rather than an error; only an unsupported language is rejected.
    pub fn visualize(&mut self, runner: &TraceRunner) -> Result<&RunReport, PipelineError> {
        self.last_run = None;
        let report = match self.instrumented() {
            Ok(program) => runner.run(&program),
            Err(PipelineError::Syntax(err)) => {
                let message = format!("SyntaxError: {}", err);
                warn!("simulation error: {}", message);
                RunReport::failed(message)
            }
            Err(err) => return Err(err),
        };
        Ok(self.last_run.insert(report))
    }

    /// Payload for the external execution service
    pub fn execution_payload(&self) -> Result<ExecutionRequest, PipelineError> {
        let language = self.language()?;
        Ok(ExecutionRequest {
            language_id: language.id().to_string(),
            version: language.version().to_string(),
            source: self.source.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ComplexityClass;
    use crate::runner::RunStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structure_follows_edits() {
        let mut session = Session::new("let a = 1;\n", "javascript");
        assert_eq!(session.structure().complexity, ComplexityClass::Constant);

        session.set_source("for (let i = 0; i < n; i++) {\n}\n");
        assert_eq!(session.structure().complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_language_switch_refreshes_and_drops_the_last_run() {
        let source = "public class Main {\n    public static void main(String[] args) {\n        int total = 0;\n        for (int i = 1; i <= 2; i++) {\n            total += i;\n        }\n    }\n}\n";
        let runner = TraceRunner::default();
        let mut session = Session::new(source, "js");
        let status = session.visualize(&runner).unwrap().status.clone();
        assert!(matches!(status, RunStatus::SimulationError { ref message } if message.starts_with("SyntaxError: ")));

        session.set_language("java");
        assert!(session.last_run().is_none());
        assert_eq!(session.language(), Ok(Language::Java));
        assert_eq!(session.structure(), &analyze(source));
        assert_eq!(session.structure().complexity, ComplexityClass::Linear);

        let report = session.visualize(&runner).unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(session.execution_payload().unwrap().language_id, "java");
    }

    #[test]
    fn test_unsupported_language_is_rejected_before_running() {
        let mut session = Session::new("print(1)\n", "python");
        let err = session.visualize(&TraceRunner::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnsupportedLanguage(UnsupportedLanguage("python".to_string()))
        );
        assert!(session.last_run().is_none());
        assert!(session.execution_payload().is_err());
    }

    #[test]
    fn test_syntax_error_becomes_simulation_error() {
        let mut session = Session::new("let = 3;\n", "js");
        let report = session.visualize(&TraceRunner::default()).unwrap();
        assert!(report.trace.is_empty());
        match &report.status {
            RunStatus::SimulationError { message } => assert!(message.starts_with("SyntaxError: ")),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_edit_discards_previous_run() {
        let mut session = Session::new("let a = 1;\n", "javascript");
        session.visualize(&TraceRunner::default()).unwrap();
        assert!(session.last_run().is_some());

        session.set_source("let b = 2;\n");
        assert!(session.last_run().is_none());
    }

    #[test]
    fn test_payload_carries_surface_source() {
        let source = "public class Main {\n    public static void main(String[] args) {\n        int x = 1;\n    }\n}\n";
        let session = Session::new(source, "java");
        let payload = session.execution_payload().unwrap();
        assert_eq!(payload.language_id, "java");
        assert_eq!(payload.version, "15.0.2");
        assert_eq!(payload.source, source);
    }
}
