//! Call stack and lexical scopes
//!
//! This module provides the environment the interpreter evaluates against:
//! - [`Scope`]: one lexical block of bindings, linked to its parent
//! - [`StackFrame`]: a function activation and its innermost scope
//! - [`Stack`]: the frames plus the global scope
//!
//! # Scoping
//!
//! Scopes are reference counted so a closure can keep its defining scope alive
//! after the frame that created it has returned. `let` and `const` bind in the
//! innermost scope; `var` binds in the nearest function scope.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ScopeRef = Rc<RefCell<Scope>>;

/// A single binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub is_const: bool,
}

/// Why an assignment to a name was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    Undeclared,
    Const,
}

/// One lexical block of bindings
#[derive(Debug, Default)]
pub struct Scope {
    vars: FxHashMap<String, Binding>,
    parent: Option<ScopeRef>,
    is_function: bool,
}

impl Scope {
    /// A root scope with no parent
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            is_function: true,
            ..Scope::default()
        }))
    }

    /// A new scope nested in `parent`
    pub fn child(parent: &ScopeRef, is_function: bool) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: FxHashMap::default(),
            parent: Some(Rc::clone(parent)),
            is_function,
        }))
    }

    pub fn parent(&self) -> Option<&ScopeRef> {
        self.parent.as_ref()
    }

    /// Declare (or redeclare) a name in this scope
    pub fn declare(&mut self, name: impl Into<String>, value: Value, is_const: bool) {
        self.vars.insert(name.into(), Binding { value, is_const });
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Names bound directly in this scope
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Resolve `name` by walking outwards from `scope`
    pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
        let mut current = Rc::clone(scope);
        loop {
            let next = {
                let borrowed = current.borrow();
                if let Some(binding) = borrowed.vars.get(name) {
                    return Some(binding.value.clone());
                }
                borrowed.parent.clone()?
            };
            current = next;
        }
    }

    /// Assign to the nearest existing binding of `name`
    pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = Rc::clone(scope);
        loop {
            let next = {
                let mut borrowed = current.borrow_mut();
                if let Some(binding) = borrowed.vars.get_mut(name) {
                    if binding.is_const {
                        return Err(AssignError::Const);
                    }
                    binding.value = value;
                    return Ok(());
                }
                borrowed.parent.clone().ok_or(AssignError::Undeclared)?
            };
            current = next;
        }
    }

    /// The nearest enclosing function (or root) scope, where `var` binds
    pub fn function_scope(scope: &ScopeRef) -> ScopeRef {
        let mut current = Rc::clone(scope);
        loop {
            let next = {
                let borrowed = current.borrow();
                if borrowed.is_function {
                    None
                } else {
                    borrowed.parent.clone()
                }
            };
            match next {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Drop every binding from `scope` and its ancestors.
    ///
    /// Closures stored in a scope they also capture form reference cycles;
    /// clearing the chain at the end of a run releases them.
    pub fn clear_chain(scope: &ScopeRef) {
        let mut current = Some(Rc::clone(scope));
        while let Some(scope) = current {
            let vars = std::mem::take(&mut scope.borrow_mut().vars);
            drop(vars);
            current = scope.borrow().parent.clone();
        }
    }
}

/// Stack frame for a function call
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub function_name: String,
    scope: ScopeRef,
}

impl StackFrame {
    pub fn new(function_name: String, scope: ScopeRef) -> Self {
        StackFrame {
            function_name,
            scope,
        }
    }

    /// Innermost scope of this frame
    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }

    /// Enter a new block scope
    pub fn push_scope(&mut self) {
        self.scope = Scope::child(&self.scope, false);
    }

    /// Exit the current block scope
    pub fn pop_scope(&mut self) {
        let parent = self.scope.borrow().parent.clone();
        if let Some(parent) = parent {
            self.scope = parent;
        }
    }
}

/// The call stack
#[derive(Debug)]
pub struct Stack {
    frames: Vec<StackFrame>,
    globals: ScopeRef,
}

impl Stack {
    pub fn new(globals: ScopeRef) -> Self {
        Stack {
            frames: Vec::new(),
            globals,
        }
    }

    pub fn globals(&self) -> &ScopeRef {
        &self.globals
    }

    /// Push a new stack frame whose scope is `scope`
    pub fn push_frame(&mut self, function_name: String, scope: ScopeRef) {
        self.frames.push(StackFrame::new(function_name, scope));
    }

    /// Pop the top stack frame
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    /// Get the current (top) frame
    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Get a mutable reference to the current frame
    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    /// Innermost scope of the running code; the globals when no frame is active
    pub fn scope(&self) -> ScopeRef {
        self.current_frame()
            .map_or_else(|| Rc::clone(&self.globals), |f| Rc::clone(f.scope()))
    }

    /// Resolve `name` in the current lexical environment
    pub fn lookup(&self, name: &str) -> Option<Value> {
        Scope::lookup(&self.scope(), name)
    }

    /// Get all frames (for diagnostics)
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_scope_shadowing() {
        let globals = Scope::root();
        let mut stack = Stack::new(Rc::clone(&globals));
        stack.push_frame("<script>".to_string(), Scope::child(&globals, true));

        let frame = stack.current_frame_mut().unwrap();
        frame.scope().borrow_mut().declare("x", Value::Number(1.0), false);
        frame.push_scope();
        frame.scope().borrow_mut().declare("x", Value::Number(2.0), false);
        assert!(matches!(stack.lookup("x"), Some(Value::Number(n)) if n == 2.0));

        stack.current_frame_mut().unwrap().pop_scope();
        assert!(matches!(stack.lookup("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_assign_walks_outwards_and_respects_const() {
        let root = Scope::root();
        root.borrow_mut().declare("k", Value::Number(1.0), true);
        root.borrow_mut().declare("v", Value::Number(1.0), false);
        let inner = Scope::child(&root, false);

        assert_eq!(Scope::assign(&inner, "v", Value::Number(5.0)), Ok(()));
        assert!(matches!(Scope::lookup(&root, "v"), Some(Value::Number(n)) if n == 5.0));
        assert_eq!(Scope::assign(&inner, "k", Value::Null), Err(AssignError::Const));
        assert_eq!(Scope::assign(&inner, "nope", Value::Null), Err(AssignError::Undeclared));
    }

    #[test]
    fn test_function_scope_skips_blocks() {
        let root = Scope::root();
        let func = Scope::child(&root, true);
        let block = Scope::child(&func, false);
        assert!(Rc::ptr_eq(&Scope::function_scope(&block), &func));
    }
}
