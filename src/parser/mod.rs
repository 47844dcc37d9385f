//! HostLang source code parser
//!
//! This module transforms HostLang source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Supported Subset
//!
//! HostLang is a small dynamically typed scripting language:
//! - Bindings: `let`, `const`, `var`, array destructuring
//! - Functions: declarations, `async` declarations, function expressions, arrows
//! - Statements: `if/else`, `while`, `do-while`, `for`, `for-of`, `break`,
//!   `continue`, `return`, `throw`, blocks
//! - Expressions: arithmetic, `**`, comparison, logical, `??`, bitwise, ternary,
//!   member and index access, calls, `new`, `await`, `typeof`
//! - No classes, generators, regex literals, or template strings
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};

/// Parse a complete HostLang program.
pub fn parse_program(source: &str) -> Result<ast::Program, ParseError> {
    Parser::new(source)?.parse_program()
}
