//! Instrumentation Engine
//!
//! Turns a [`HostProgram`] into an [`InstrumentedProgram`]: the parsed program
//! with a `Capture` node after every simple statement (a declaration or an
//! expression statement) that starts on an executable line.
//!
//! - [`candidates`]: which identifiers a capture tries to read
//! - [`suspension`]: which lines may hold a capture at all
//!
//! Compound statements and control transfers are not followed by a capture;
//! the statements inside them are. Nothing inside a non-suspending function
//! is instrumented, so such functions show up only through their call sites.

pub mod candidates;
pub mod suspension;

pub use candidates::{candidate_identifiers, CandidateIdentifierSet};
pub use suspension::{suspension_map, LineKind, LineMap};

use crate::parser::ast::{AstNode, FunctionDef, Program};
use crate::parser::{parse_program, ParseError};
use crate::transpile::HostProgram;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

/// A host program ready to be simulated
#[derive(Debug, Clone)]
pub struct InstrumentedProgram {
    pub host: HostProgram,
    pub program: Program,
    pub candidates: CandidateIdentifierSet,
    /// Host lines followed by a capture
    pub capture_lines: BTreeSet<usize>,
}

impl InstrumentedProgram {
    /// Listing of the host text with a step marker after every captured line
    pub fn render(&self) -> String {
        let names = self
            .candidates
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = String::new();
        for (number, line) in self.host.lines() {
            out.push_str(line);
            out.push('\n');
            if self.capture_lines.contains(&number) {
                let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                let _ = writeln!(out, "{}await __step({}, __scope([{}]));", indent, number, names);
            }
        }
        out
    }
}

/// Parse `host` and insert the capture points
pub fn instrument(
    host: &HostProgram,
    candidates: CandidateIdentifierSet,
) -> Result<InstrumentedProgram, ParseError> {
    let line_map = suspension_map(host);
    let mut program = parse_program(&host.source)?;

    let mut pass = Instrumenter {
        line_map: &line_map,
        capture_lines: BTreeSet::new(),
    };
    pass.block(&mut program.nodes, true);

    debug!(
        captures = pass.capture_lines.len(),
        candidates = candidates.len(),
        "program instrumented"
    );
    Ok(InstrumentedProgram {
        host: host.clone(),
        program,
        candidates,
        capture_lines: pass.capture_lines,
    })
}

struct Instrumenter<'a> {
    line_map: &'a LineMap,
    capture_lines: BTreeSet<usize>,
}

impl Instrumenter<'_> {
    /// Instrument a statement list; `suspending` is false inside plain functions
    fn block(&mut self, stmts: &mut Vec<AstNode>, suspending: bool) {
        let original = std::mem::take(stmts);
        stmts.reserve(original.len() * 2);

        for mut stmt in original {
            self.statement(&mut stmt, suspending);
            let line = stmt.location().line;
            let capture =
                suspending && stmt.is_simple_statement() && self.line_map.is_executable(line);
            stmts.push(stmt);
            if capture {
                self.capture_lines.insert(line);
                stmts.push(AstNode::Capture { line });
            }
        }
    }

    /// Instrument the bodies nested in one statement
    fn statement(&mut self, stmt: &mut AstNode, suspending: bool) {
        match stmt {
            AstNode::FunctionDecl { func, .. } => self.function(func),
            AstNode::VarDecl { declarators, .. } => {
                for init in declarators.iter_mut().filter_map(|d| d.init.as_mut()) {
                    self.expression(init);
                }
            }
            AstNode::Return { expr: Some(expr), .. }
            | AstNode::Throw { expr, .. }
            | AstNode::ExpressionStatement { expr, .. } => self.expression(expr),
            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.expression(condition);
                self.block(then_branch, suspending);
                if let Some(else_stmts) = else_branch {
                    self.block(else_stmts, suspending);
                }
            }
            AstNode::While { condition, body, .. } | AstNode::DoWhile { body, condition, .. } => {
                self.expression(condition);
                self.block(body, suspending);
            }
            AstNode::For { init, body, .. } => {
                if let Some(init) = init {
                    self.statement(init, suspending);
                }
                self.block(body, suspending);
            }
            AstNode::ForOf { iterable, body, .. } => {
                self.expression(iterable);
                self.block(body, suspending);
            }
            AstNode::Block { statements, .. } => self.block(statements, suspending),
            _ => {}
        }
    }

    /// Find function expressions inside an expression and instrument their bodies
    fn expression(&mut self, expr: &mut AstNode) {
        match expr {
            AstNode::FunctionExpr { func, .. } => self.function(func),
            AstNode::ArrayLiteral { elements, .. } => {
                for element in elements {
                    self.expression(element);
                }
            }
            AstNode::ObjectLiteral { properties, .. } => {
                for (_, value) in properties {
                    self.expression(value);
                }
            }
            AstNode::Call { callee, args, .. } | AstNode::New { callee, args, .. } => {
                self.expression(callee);
                for arg in args {
                    self.expression(arg);
                }
            }
            AstNode::BinaryOp { left, right, .. }
            | AstNode::Assignment {
                lhs: left,
                rhs: right,
                ..
            }
            | AstNode::CompoundAssignment {
                lhs: left,
                rhs: right,
                ..
            }
            | AstNode::ArrayAccess {
                array: left,
                index: right,
                ..
            } => {
                self.expression(left);
                self.expression(right);
            }
            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                self.expression(condition);
                self.expression(true_expr);
                self.expression(false_expr);
            }
            AstNode::Spread { expr: inner, .. }
            | AstNode::Await { expr: inner, .. }
            | AstNode::UnaryOp { operand: inner, .. }
            | AstNode::MemberAccess { object: inner, .. } => self.expression(inner),
            _ => {}
        }
    }

    fn function(&mut self, func: &mut Arc<FunctionDef>) {
        let def = Arc::make_mut(func);
        let suspending = def.is_async;
        self.block(&mut def.body, suspending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::transpile::transpile;

    fn instrumented(source: &str) -> InstrumentedProgram {
        let host = transpile(source, Language::JavaScript);
        let candidates = candidate_identifiers(&host);
        instrument(&host, candidates).unwrap()
    }

    fn lines(program: &InstrumentedProgram) -> Vec<usize> {
        program.capture_lines.iter().copied().collect()
    }

    #[test]
    fn test_captures_follow_simple_statements_only() {
        let program = instrumented(
            "let x = 1;\nwhile (x < 8) {\n  x *= 2;\n  if (x > 3) {\n    break;\n  }\n}\n",
        );
        assert_eq!(lines(&program), vec![1, 3]);
    }

    #[test]
    fn test_plain_functions_are_not_instrumented() {
        let program = instrumented(
            "function helper(a) {\n  let b = a + 1;\n  return b;\n}\nlet r = helper(1);\nlet ys = [1].map(v => { let w = v; return w; });\n",
        );
        assert_eq!(lines(&program), vec![5, 6]);
    }

    #[test]
    fn test_async_functions_are_instrumented() {
        let program = instrumented("async function main() {\n  let n = 2;\n  n++;\n}\nawait main();\n");
        assert_eq!(lines(&program), vec![2, 3, 5]);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let host = transpile("let = ;\n", Language::JavaScript);
        assert!(instrument(&host, CandidateIdentifierSet::new()).is_err());
    }

    #[test]
    fn test_render_marks_captured_lines() {
        let program = instrumented("let a = 1;\n  a++;\n");
        assert_eq!(
            program.render(),
            "let a = 1;\nawait __step(1, __scope([\"a\"]));\n  a++;\n  await __step(2, __scope([\"a\"]));\n"
        );
    }
}
