// Execution engine for the HostLang interpreter

use crate::instrument::InstrumentedProgram;
use crate::interpreter::builtins;
use crate::interpreter::errors::RuntimeError;
use crate::memory::stack::{Scope, ScopeRef, Stack};
use crate::memory::value::{Closure, Value};
use crate::parser::ast::*;
use crate::snapshot::{to_snapshot, Trace, TraceStep};
use serde_json::Map;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Prune dead closure environments once this many have been recorded
const CAPTURED_ENV_PRUNE_THRESHOLD: usize = 4096;

/// The consumer of a run stopped accepting steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step consumer is gone")]
pub struct Halted;

/// Receives every step the moment it is captured
pub trait StepSink {
    /// Hand over one step. Returning `Err(Halted)` abandons the run.
    fn on_step(&mut self, step: TraceStep) -> Result<(), Halted>;
}

impl StepSink for Trace {
    fn on_step(&mut self, step: TraceStep) -> Result<(), Halted> {
        self.push(step);
        Ok(())
    }
}

/// How the most recent statement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// Walks an instrumented program and reports a step at every capture point
pub struct Interpreter<'a> {
    /// Program being simulated
    program: &'a InstrumentedProgram,

    /// Where captured steps go
    sink: &'a mut dyn StepSink,

    /// Call stack and scopes
    pub(crate) stack: Stack,

    /// Pending control transfer out of the current statement list
    pub(crate) control_flow: ControlFlow,

    /// Value carried by the last `return`
    pub(crate) return_value: Option<Value>,

    /// Location of the statement being executed
    pub(crate) current_location: SourceLocation,

    /// Scopes captured by closures, cleared on drop to break reference cycles
    captured_envs: Vec<Weak<RefCell<Scope>>>,

    /// Number of steps handed to the sink so far
    steps_emitted: usize,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with fresh globals for one run of `program`
    pub fn new(program: &'a InstrumentedProgram, sink: &'a mut dyn StepSink) -> Self {
        let globals = Scope::root();
        builtins::install_globals(&globals);

        Interpreter {
            program,
            sink,
            stack: Stack::new(globals),
            control_flow: ControlFlow::Normal,
            return_value: None,
            current_location: SourceLocation::new(1, 1),
            captured_envs: Vec::new(),
            steps_emitted: 0,
        }
    }
}

impl Interpreter<'_> {
    /// Run the program from start to finish
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let script_scope = Scope::child(self.stack.globals(), true);
        self.stack.push_frame("<script>".to_string(), script_scope);

        let program = self.program;
        let result = self.execute_statements(&program.program.nodes);
        self.stack.pop_frame();
        self.control_flow = ControlFlow::Normal;

        debug!(steps = self.steps_emitted, ok = result.is_ok(), "run finished");
        result
    }

    /// Execute a statement list in the current scope.
    ///
    /// Function declarations are bound before the first statement runs, so a
    /// function can be called above the line that declares it.
    pub(crate) fn execute_statements(&mut self, stmts: &[AstNode]) -> Result<(), RuntimeError> {
        self.hoist_functions(stmts);
        for stmt in stmts {
            self.execute_statement(stmt)?;
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Execute a statement list inside its own block scope
    pub(crate) fn execute_scoped_block(&mut self, stmts: &[AstNode]) -> Result<(), RuntimeError> {
        self.enter_scope();
        let result = self.execute_statements(stmts);
        self.exit_scope();
        result
    }

    pub(crate) fn execute_statement(&mut self, stmt: &AstNode) -> Result<(), RuntimeError> {
        if !matches!(stmt, AstNode::Capture { .. }) {
            self.current_location = stmt.location();
        }

        match stmt {
            // Bound ahead of time by `hoist_functions`
            AstNode::FunctionDecl { .. } => Ok(()),

            AstNode::VarDecl {
                kind,
                declarators,
                location,
            } => self.execute_var_decl(*kind, declarators, *location),

            AstNode::Return { expr, .. } => self.execute_return(expr.as_deref()),

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.execute_if(condition, then_branch, else_branch.as_deref()),

            AstNode::While {
                condition, body, ..
            } => self.execute_while(condition, body),

            AstNode::DoWhile {
                body, condition, ..
            } => self.execute_do_while(body, condition),

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => self.execute_for(
                init.as_deref(),
                condition.as_deref(),
                increment.as_deref(),
                body,
            ),

            AstNode::ForOf {
                kind,
                target,
                iterable,
                body,
                location,
            } => self.execute_for_of(*kind, target, iterable, body, *location),

            AstNode::Break { .. } => self.execute_break(),

            AstNode::Continue { .. } => self.execute_continue(),

            AstNode::Throw { expr, location } => self.execute_throw(expr, *location),

            AstNode::Block { statements, .. } => self.execute_scoped_block(statements),

            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(())
            }

            AstNode::Capture { line } => self.capture(*line),

            expr => {
                self.evaluate_expr(expr)?;
                Ok(())
            }
        }
    }

    /// Bind every function declared directly in `stmts`
    fn hoist_functions(&mut self, stmts: &[AstNode]) {
        for stmt in stmts {
            if let AstNode::FunctionDecl { func, .. } = stmt {
                if let Some(name) = &func.name {
                    let closure = self.make_closure(func);
                    self.stack.scope().borrow_mut().declare(name.as_str(), closure, false);
                }
            }
        }
    }

    /// Create a closure over the current scope
    pub(crate) fn make_closure(&mut self, func: &Arc<FunctionDef>) -> Value {
        let env = self.stack.scope();
        self.captured_envs.push(Rc::downgrade(&env));
        if self.captured_envs.len() >= CAPTURED_ENV_PRUNE_THRESHOLD {
            self.captured_envs.retain(|env| env.strong_count() > 0);
        }
        Value::Function(Rc::new(Closure {
            func: Arc::clone(func),
            env,
        }))
    }

    /// Snapshot every candidate visible here and hand the step to the sink
    fn capture(&mut self, line: usize) -> Result<(), RuntimeError> {
        let scope = self.stack.scope();
        let mut snapshot = Map::new();

        for name in self.program.candidates.iter() {
            // Names that are not bound here are simply left out of the step
            let Some(value) = Scope::lookup(&scope, name) else {
                continue;
            };
            if value.is_function() {
                continue;
            }
            match to_snapshot(&value) {
                Some(json) => {
                    snapshot.insert(name.to_string(), json);
                }
                None => trace!(name, line, "binding has no snapshot, omitted"),
            }
        }

        trace!(line, bindings = snapshot.len(), "step captured");
        self.steps_emitted += 1;
        self.sink
            .on_step(TraceStep::new(line, snapshot))
            .map_err(|Halted| RuntimeError::Halted)
    }

    pub(crate) fn enter_scope(&mut self) {
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.push_scope();
        }
    }

    pub(crate) fn exit_scope(&mut self) {
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.pop_scope();
        }
    }

    /// The scope new `let`/`const` bindings go into
    pub(crate) fn current_scope(&self) -> ScopeRef {
        self.stack.scope()
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        // Closures stored in the scopes they capture keep each other alive
        for env in self.captured_envs.drain(..) {
            if let Some(env) = env.upgrade() {
                Scope::clear_chain(&env);
            }
        }
        Scope::clear_chain(self.stack.globals());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{candidate_identifiers, instrument};
    use crate::language::Language;
    use crate::transpile::transpile;
    use serde_json::json;

    fn trace_of(source: &str) -> (Trace, Result<(), RuntimeError>) {
        let host = transpile(source, Language::JavaScript);
        let candidates = candidate_identifiers(&host);
        let program = instrument(&host, candidates).unwrap();
        let mut trace = Trace::new();
        let result = Interpreter::new(&program, &mut trace).run();
        (trace, result)
    }

    #[test]
    fn test_steps_follow_statements() {
        let (trace, result) = trace_of("let a = 1;\nlet b = a + 1;\na = b * 3;\n");
        assert_eq!(result, Ok(()));
        let lines: Vec<usize> = trace.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(trace.get(2).unwrap().get("a"), Some(&json!(6)));
        assert_eq!(trace.get(0).unwrap().get("b"), None);
    }

    #[test]
    fn test_functions_are_hoisted_and_omitted_from_steps() {
        let (trace, result) = trace_of(
            "async function main() {\n  let r = await twice(4);\n}\nasync function twice(n) {\n  let d = n * 2;\n  return d;\n}\nawait main();\n",
        );
        assert_eq!(result, Ok(()));
        let lines: Vec<usize> = trace.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![5, 2, 8]);
        assert_eq!(trace.get(1).unwrap().get("r"), Some(&json!(8)));
        assert!(trace.iter().all(|s| s.get("twice").is_none()));
    }

    #[test]
    fn test_error_keeps_earlier_steps() {
        let (trace, result) = trace_of("let a = 1;\nlet b = missing + 1;\n");
        assert_eq!(trace.len(), 1);
        assert!(matches!(
            result,
            Err(RuntimeError::UndefinedVariable { ref name, .. }) if name == "missing"
        ));
    }

    struct StopAfter(usize, Vec<usize>);

    impl StepSink for StopAfter {
        fn on_step(&mut self, step: TraceStep) -> Result<(), Halted> {
            if self.1.len() == self.0 {
                return Err(Halted);
            }
            self.1.push(step.line_number);
            Ok(())
        }
    }

    #[test]
    fn test_halted_sink_unwinds() {
        let host = transpile("let i = 0;\nwhile (true) {\n  i++;\n}\n", Language::JavaScript);
        let candidates = candidate_identifiers(&host);
        let program = instrument(&host, candidates).unwrap();
        let mut sink = StopAfter(3, Vec::new());
        let result = Interpreter::new(&program, &mut sink).run();
        assert_eq!(result, Err(RuntimeError::Halted));
        assert_eq!(sink.1, vec![1, 3, 3]);
    }
}
