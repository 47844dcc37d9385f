//! Loop statement execution (`while`, `do-while`, `for`, `for-of`).
//!
//! `break` and `continue` are propagated via `LoopBodyResult` so the loop
//! driver can react without inspecting `control_flow` directly. A `return`
//! inside a body yields `LoopBodyResult::Exit`, which unwinds the loop and
//! leaves the signal for the enclosing call.
//!
//! `for` loops whose initializer declares with `let` get a fresh copy of the
//! loop variables for every iteration, so closures created in the body see
//! the value of their own iteration.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::stack::Scope;
use crate::parser::ast::{AstNode, DeclKind, Pattern, SourceLocation};

/// Result returned by [`Interpreter::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
    /// `return` was triggered; the loop driver should unwind and leave
    /// `self.control_flow` for the caller.
    Exit,
}

impl Interpreter<'_> {
    /// Executes all statements in `body` inside a fresh scope.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[AstNode],
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.execute_scoped_block(body)?;
        Ok(match self.control_flow {
            ControlFlow::Normal => LoopBodyResult::Continue,
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Continue
            }
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Break
            }
            ControlFlow::Return => LoopBodyResult::Exit,
        })
    }

    /// Executes a `while (condition) { body }` loop.
    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        while self.evaluate_expr(condition)?.is_truthy() {
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    /// Executes a `do { body } while (condition)` loop.
    ///
    /// The body always runs at least once; the condition is checked after each
    /// iteration.
    pub(crate) fn execute_do_while(
        &mut self,
        body: &[AstNode],
        condition: &AstNode,
    ) -> Result<(), RuntimeError> {
        loop {
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
            if !self.evaluate_expr(condition)?.is_truthy() {
                break;
            }
        }
        Ok(())
    }

    /// Executes a `for (init; condition; increment) { body }` loop.
    ///
    /// `init`, `condition`, and `increment` are all optional. A missing
    /// condition is treated as always-true. The initializer gets a scope of
    /// its own that is exited when the loop ends.
    pub(crate) fn execute_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        increment: Option<&AstNode>,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        self.enter_scope();
        let result = self.run_for(init, condition, increment, body);
        self.exit_scope();
        result
    }

    fn run_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        increment: Option<&AstNode>,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        let per_iteration = match init {
            Some(init_stmt) => {
                self.execute_statement(init_stmt)?;
                per_iteration_names(init_stmt)
            }
            None => Vec::new(),
        };

        loop {
            if let Some(cond) = condition {
                if !self.evaluate_expr(cond)?.is_truthy() {
                    break;
                }
            }

            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }

            if !per_iteration.is_empty() {
                self.copy_iteration_scope(&per_iteration);
            }
            if let Some(inc) = increment {
                self.evaluate_expr(inc)?;
            }
        }
        Ok(())
    }

    /// Replace the loop scope with a fresh one holding the current values
    fn copy_iteration_scope(&mut self, names: &[String]) {
        let scope = self.current_scope();
        let values: Vec<_> = names
            .iter()
            .map(|name| {
                let value = Scope::lookup(&scope, name).unwrap_or_default();
                (name, value)
            })
            .collect();

        self.exit_scope();
        self.enter_scope();
        let fresh = self.current_scope();
        let mut fresh = fresh.borrow_mut();
        for (name, value) in values {
            fresh.declare(name.as_str(), value, false);
        }
    }

    /// Executes `for (let x of iterable) { body }`.
    ///
    /// The iterable is read once up front; every iteration binds the target
    /// in its own scope.
    pub(crate) fn execute_for_of(
        &mut self,
        kind: DeclKind,
        target: &Pattern,
        iterable: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let source = self.evaluate_expr(iterable)?;
        let items = self.iterate(&source, location)?;

        for item in items {
            self.enter_scope();
            let outcome = self
                .bind_pattern(kind, target, item, location)
                .and_then(|()| self.execute_loop_body(body));
            self.exit_scope();
            match outcome? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }
}

/// Names a `for (let ...)` initializer declares
fn per_iteration_names(init: &AstNode) -> Vec<String> {
    match init {
        AstNode::VarDecl {
            kind: DeclKind::Let,
            declarators,
            ..
        } => declarators
            .iter()
            .flat_map(|d| d.target.names())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
