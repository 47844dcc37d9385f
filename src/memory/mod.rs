//! Memory model for the HostLang interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation (numbers, strings, arrays, closures, ...)
//! - [`stack`]: Call stack with frames and chained lexical scopes
//!
//! There is no byte-level memory: containers are shared through reference
//! counting, and a binding's value is read directly out of its scope.

pub mod stack;
pub mod value;
