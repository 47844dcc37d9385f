//! # Introduction
//!
//! stepscope takes a short program written in JavaScript, Java or C++ and lets
//! you step through its execution one statement at a time, watching how its
//! variables, arrays and matrices evolve. The steps are navigated forward and
//! backward through a terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! Source → Transpiler → HostProgram → Instrumenter → Runner → Trace → TUI
//!    └────→ Structure Analyzer → StructureReport
//! ```
//!
//! 1. [`transpile`]: pattern-based rewriting of Java and C++ into the host
//!    language (JavaScript). Host-native input passes through unchanged.
//! 2. [`analyzer`]: a textual scan estimating loop nesting and an advisory
//!    complexity class, plus the declared functions.
//! 3. [`instrument`]: parses the host program ([`parser`]) and inserts a
//!    capture point after every simple statement outside plain functions.
//! 4. [`runner`]: executes the instrumented program with the [`interpreter`]
//!    on a worker thread and collects the [`snapshot::Trace`].
//! 5. [`session`]: the editor-facing boundary that ties the stages together.
//! 6. [`ui`]: ratatui-based trace viewer; not part of the stable library API.
//!
//! ## Supported host subset
//!
//! Declarations: `let`, `const`, `var`, array destructuring, `function` and
//! `async function`, arrow functions.
//! Control flow: `if/else`, `while`, `do-while`, `for`, `for...of`, `break`,
//! `continue`, `return`, `throw`.
//! Values: numbers, BigInt, strings, booleans, arrays, objects, closures.
//! Runtime: `Math`, `Number`, `Array`, `String`, `JSON`, `Object`,
//! `parseInt`/`parseFloat` and the common array and string methods.

pub mod analyzer;
pub mod config;
pub mod instrument;
pub mod interpreter;
pub mod language;
pub mod memory;
pub mod parser;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod transpile;
pub mod ui;
