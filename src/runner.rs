//! Trace Runner
//!
//! Executes an [`InstrumentedProgram`] and collects its steps. The evaluator
//! runs on a worker thread with a large stack and hands every step over a
//! zero-capacity channel, then waits to be resumed. The worker and the
//! consumer therefore take turns, and a consumer that stops pulling simply
//! drops the stream: the worker's next hand-off fails and the run unwinds.
//!
//! Nothing escapes [`TraceRunner::run`]: runtime errors and worker panics are
//! turned into a [`RunStatus::SimulationError`] that keeps the steps captured
//! before the failure.

use crate::instrument::InstrumentedProgram;
use crate::interpreter::constants::INTERPRETER_STACK_SIZE;
use crate::interpreter::{Halted, Interpreter, RuntimeError, StepSink};
use crate::snapshot::{Trace, TraceStep};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::iter::FusedIterator;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Runner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Stop a run after this many steps. `None` lets a non-terminating
    /// program block the caller forever.
    pub max_steps: Option<usize>,
    /// Stack size of the worker thread in bytes
    pub stack_size: usize,
}

impl RunnerConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            max_steps: None,
            stack_size: INTERPRETER_STACK_SIZE,
        }
    }
}

/// How a step stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    SimulationError(String),
    StepLimitReached(usize),
}

/// Caller-facing result of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunStatus {
    /// Finished normally with at least one step
    Completed,
    /// Finished normally without reaching a single capture point
    EmptyTrace,
    SimulationError { message: String },
    StepLimitReached { limit: usize },
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::EmptyTrace => write!(f, "no steps captured"),
            RunStatus::SimulationError { message } => write!(f, "{}", message),
            RunStatus::StepLimitReached { limit } => write!(f, "stopped after {} steps", limit),
        }
    }
}

/// Trace of one run together with how it ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub trace: Trace,
    pub status: RunStatus,
}

impl RunReport {
    pub fn new(trace: Trace, status: RunStatus) -> Self {
        RunReport { trace, status }
    }

    /// A report for a program that failed before any step could run
    pub fn failed(message: impl Into<String>) -> Self {
        RunReport {
            trace: Trace::new(),
            status: RunStatus::SimulationError {
                message: message.into(),
            },
        }
    }
}

/// Runs instrumented programs
#[derive(Debug, Clone, Default)]
pub struct TraceRunner {
    config: RunnerConfig,
}

impl TraceRunner {
    pub fn new(config: RunnerConfig) -> Self {
        TraceRunner { config }
    }

    /// Start a fresh run of `program` and return its steps lazily
    ///
    /// The program does not start executing until the first step is pulled.
    pub fn steps(&self, program: &InstrumentedProgram) -> StepStream {
        let (resume_tx, resume_rx) = bounded::<()>(0);
        let (message_tx, message_rx) = bounded::<WorkerMessage>(0);
        let program = program.clone();

        let spawned = thread::Builder::new()
            .name("stepscope-worker".to_string())
            .stack_size(self.config.stack_size)
            .spawn(move || simulate(&program, &message_tx, &resume_rx));

        match spawned {
            Ok(handle) => StepStream {
                worker: Some(Worker {
                    resume: resume_tx,
                    messages: message_rx,
                    handle,
                }),
                max_steps: self.config.max_steps,
                delivered: 0,
                outcome: None,
            },
            Err(err) => {
                let mut stream = StepStream {
                    worker: None,
                    max_steps: self.config.max_steps,
                    delivered: 0,
                    outcome: None,
                };
                stream.finish(RunOutcome::SimulationError(format!(
                    "could not start the simulation worker: {}",
                    err
                )));
                stream
            }
        }
    }

    /// Run `program` to the end (or to the step limit) and collect its trace
    pub fn run(&self, program: &InstrumentedProgram) -> RunReport {
        let mut stream = self.steps(program);
        let trace: Trace = stream.by_ref().collect();

        let status = match stream.outcome().cloned().unwrap_or(RunOutcome::Completed) {
            RunOutcome::Completed if trace.is_empty() => RunStatus::EmptyTrace,
            RunOutcome::Completed => RunStatus::Completed,
            RunOutcome::SimulationError(message) => RunStatus::SimulationError { message },
            RunOutcome::StepLimitReached(limit) => RunStatus::StepLimitReached { limit },
        };
        debug!(steps = trace.len(), %status, "run collected");
        RunReport::new(trace, status)
    }
}

enum WorkerMessage {
    Step(TraceStep),
    /// The program ran to its end, or failed with this message
    Finished(Result<(), String>),
}

struct Worker {
    resume: Sender<()>,
    messages: Receiver<WorkerMessage>,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Release the worker and wait for its thread to exit
    fn shut_down(self) {
        let Worker {
            resume,
            messages,
            handle,
        } = self;
        // A worker parked on either channel sees the disconnect and unwinds
        drop(resume);
        drop(messages);
        if handle.join().is_err() {
            debug!("simulation worker exited by panic");
        }
    }
}

/// Pull-based sequence of the steps of one run
///
/// Each call to `next` resumes the program until its next capture point.
/// Dropping the stream abandons the run.
pub struct StepStream {
    worker: Option<Worker>,
    max_steps: Option<usize>,
    delivered: usize,
    outcome: Option<RunOutcome>,
}

impl StepStream {
    /// How the run ended, once the stream is exhausted
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    fn finish(&mut self, outcome: RunOutcome) {
        if let RunOutcome::SimulationError(message) = &outcome {
            warn!(steps = self.delivered, "simulation error: {}", message);
        }
        self.outcome = Some(outcome);
        if let Some(worker) = self.worker.take() {
            worker.shut_down();
        }
    }
}

impl Iterator for StepStream {
    type Item = TraceStep;

    fn next(&mut self) -> Option<TraceStep> {
        let worker = self.worker.as_ref()?;
        let message = match worker.resume.send(()) {
            Ok(()) => worker.messages.recv().ok(),
            Err(_) => None,
        };

        match message {
            Some(WorkerMessage::Step(step)) => {
                if self.max_steps.is_some_and(|limit| self.delivered >= limit) {
                    self.finish(RunOutcome::StepLimitReached(self.delivered));
                    return None;
                }
                self.delivered += 1;
                Some(step)
            }
            Some(WorkerMessage::Finished(Ok(()))) => {
                self.finish(RunOutcome::Completed);
                None
            }
            Some(WorkerMessage::Finished(Err(message))) => {
                self.finish(RunOutcome::SimulationError(message));
                None
            }
            None => {
                self.finish(RunOutcome::SimulationError(
                    "simulation worker stopped unexpectedly".to_string(),
                ));
                None
            }
        }
    }
}

impl FusedIterator for StepStream {}

impl Drop for StepStream {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            debug!(steps = self.delivered, "step stream dropped, abandoning run");
            worker.shut_down();
        }
    }
}

/// Sink used on the worker side: hand the step over, then wait for the turn
struct ChannelSink<'a> {
    messages: &'a Sender<WorkerMessage>,
    resume: &'a Receiver<()>,
}

impl StepSink for ChannelSink<'_> {
    fn on_step(&mut self, step: TraceStep) -> Result<(), Halted> {
        self.messages
            .send(WorkerMessage::Step(step))
            .map_err(|_| Halted)?;
        self.resume.recv().map_err(|_| Halted)
    }
}

/// Body of the worker thread
fn simulate(
    program: &InstrumentedProgram,
    messages: &Sender<WorkerMessage>,
    resume: &Receiver<()>,
) {
    // Nothing runs until the first pull
    if resume.recv().is_err() {
        return;
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut sink = ChannelSink { messages, resume };
        let mut interpreter = Interpreter::new(program, &mut sink);
        interpreter.run()
    }));

    let finished = match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(RuntimeError::Halted)) => return,
        Ok(Err(err)) => Err(err.report()),
        Err(payload) => Err(format!(
            "simulation aborted: {}",
            panic_message(payload.as_ref())
        )),
    };
    // The consumer may already be gone
    let _ = messages.send(WorkerMessage::Finished(finished));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("worker panicked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{candidate_identifiers, instrument};
    use crate::language::Language;
    use crate::transpile::transpile;
    use pretty_assertions::assert_eq;

    fn program(source: &str) -> InstrumentedProgram {
        let host = transpile(source, Language::JavaScript);
        let candidates = candidate_identifiers(&host);
        instrument(&host, candidates).unwrap()
    }

    fn lines(trace: &Trace) -> Vec<usize> {
        trace.iter().map(|step| step.line_number).collect()
    }

    #[test]
    fn test_run_collects_steps_in_order() {
        let report = TraceRunner::default().run(&program("let a = 1;\na += 2;\nlet b = a * 2;\n"));
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(lines(&report.trace), vec![1, 2, 3]);
        assert_eq!(report.trace.get(2).unwrap().get("b"), Some(&serde_json::json!(6)));
    }

    #[test]
    fn test_empty_trace_is_its_own_status() {
        let report = TraceRunner::default().run(&program("function f() {\n  return 1;\n}\n"));
        assert_eq!(report.status, RunStatus::EmptyTrace);
        assert!(report.trace.is_empty());
    }

    #[test]
    fn test_runtime_error_keeps_earlier_steps() {
        let report = TraceRunner::default().run(&program("let a = 1;\nlet b = missing + 1;\n"));
        assert_eq!(lines(&report.trace), vec![1]);
        assert_eq!(
            report.status,
            RunStatus::SimulationError {
                message: "ReferenceError: missing is not defined (line 2)".to_string()
            }
        );
    }

    #[test]
    fn test_step_limit_stops_an_endless_loop() {
        let runner = TraceRunner::new(RunnerConfig::default().with_max_steps(5));
        let report = runner.run(&program("let n = 0;\nwhile (true) {\n  n++;\n}\n"));
        assert_eq!(report.status, RunStatus::StepLimitReached { limit: 5 });
        assert_eq!(report.trace.len(), 5);
    }

    #[test]
    fn test_limit_equal_to_step_count_completes() {
        let runner = TraceRunner::new(RunnerConfig::default().with_max_steps(2));
        let report = runner.run(&program("let a = 1;\nlet b = 2;\n"));
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.trace.len(), 2);
    }

    #[test]
    fn test_stream_is_lazy_and_can_be_dropped() {
        let runner = TraceRunner::default();
        let endless = program("let n = 0;\nwhile (true) {\n  n++;\n}\n");

        let mut stream = runner.steps(&endless);
        assert_eq!(stream.next().map(|s| s.line_number), Some(1));
        assert_eq!(stream.next().map(|s| s.line_number), Some(3));
        assert!(stream.outcome().is_none());
        drop(stream);

        // A fresh stream starts from the beginning
        let first: Vec<usize> = runner.steps(&endless).take(3).map(|s| s.line_number).collect();
        assert_eq!(first, vec![1, 3, 3]);
    }

    #[test]
    fn test_outcome_after_exhaustion() {
        let runner = TraceRunner::default();
        let mut stream = runner.steps(&program("let a = 1;\n"));
        assert_eq!(stream.by_ref().count(), 1);
        assert_eq!(stream.outcome(), Some(&RunOutcome::Completed));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_status_serializes_with_kind_tag() {
        let status = RunStatus::StepLimitReached { limit: 3 };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "kind": "stepLimitReached", "limit": 3 })
        );
    }
}
