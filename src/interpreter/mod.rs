//! HostLang interpreter execution engine
//!
//! This module provides the evaluator that turns an instrumented program into
//! trace steps:
//! - [`engine`]: the [`Interpreter`](engine::Interpreter), the step sink and statement dispatch
//! - [`errors`]: Runtime error types
//! - [`constants`]: limits shared by the whole pipeline
//!
//! # Execution Model
//!
//! The interpreter walks the AST with explicit environments. Every
//! `Capture` node the instrumenter inserted evaluates the candidate
//! identifiers, snapshots them and hands the step to a [`StepSink`](engine::StepSink).
//!
//! Suspending and non-suspending functions run the same way: there is one
//! logical thread, so `await e` is simply `e`.
//!
//! # Built-in Functions
//!
//! The runtime library (`Math`, `Array.from`, string and array methods, ...)
//! lives in `builtins` and is installed into fresh globals for every run.

mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
mod jumps;
mod loops;
mod ops;
mod statements;

pub use engine::{Halted, Interpreter, StepSink};
pub use errors::RuntimeError;
