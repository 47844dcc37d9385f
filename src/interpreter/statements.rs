//! Statement execution implementation
//!
//! This module handles declarations, conditionals and `throw`. Loops live in
//! [`loops`](super::loops) and the control transfers in [`jumps`](super::jumps).
//!
//! # Scoping
//!
//! - `let` and `const` bind in the innermost block scope
//! - `var` binds in the nearest function scope
//! - Array patterns (`let [a, b] = pair`) bind element by element, missing
//!   elements become `undefined`

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::stack::Scope;
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Interpreter<'_> {
    pub(crate) fn execute_var_decl(
        &mut self,
        kind: DeclKind,
        declarators: &[Declarator],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        for declarator in declarators {
            let value = match &declarator.init {
                Some(init) => self.evaluate_expr(init)?,
                None => Value::Undefined,
            };
            self.bind_pattern(kind, &declarator.target, value, location)?;
        }
        Ok(())
    }

    /// Declare every name of `target` in the scope `kind` binds into
    pub(crate) fn bind_pattern(
        &mut self,
        kind: DeclKind,
        target: &Pattern,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let scope = match kind {
            DeclKind::Var => Scope::function_scope(&self.current_scope()),
            DeclKind::Let | DeclKind::Const => self.current_scope(),
        };
        let is_const = kind == DeclKind::Const;

        match target {
            Pattern::Ident(name) => {
                scope.borrow_mut().declare(name.as_str(), value, is_const);
            }
            Pattern::Array(names) => {
                let items = self.destructure(&value, names.len(), location)?;
                let mut scope = scope.borrow_mut();
                for (name, item) in names.iter().zip(items) {
                    scope.declare(name.as_str(), item, is_const);
                }
            }
        }
        Ok(())
    }

    /// The first `count` elements of an iterable value, padded with `undefined`
    pub(crate) fn destructure(
        &self,
        value: &Value,
        count: usize,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut items = self.iterate(value, location)?;
        items.resize(count, Value::Undefined);
        Ok(items)
    }

    pub(crate) fn execute_if(
        &mut self,
        condition: &AstNode,
        then_branch: &[AstNode],
        else_branch: Option<&[AstNode]>,
    ) -> Result<(), RuntimeError> {
        if self.evaluate_expr(condition)?.is_truthy() {
            self.execute_scoped_block(then_branch)
        } else if let Some(else_stmts) = else_branch {
            self.execute_scoped_block(else_stmts)
        } else {
            Ok(())
        }
    }

    pub(crate) fn execute_throw(
        &mut self,
        expr: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_expr(expr)?;
        Err(RuntimeError::Thrown {
            message: describe_thrown(&value),
            location,
        })
    }
}

/// Text of an uncaught value: `Error: msg` for error objects, the value itself otherwise
fn describe_thrown(value: &Value) -> String {
    if let Value::Object(fields) = value {
        let fields = fields.borrow();
        if let Some(Value::Str(message)) = fields.get("message") {
            let name = match fields.get("name") {
                Some(Value::Str(name)) => name.to_string(),
                _ => "Error".to_string(),
            };
            return if message.is_empty() {
                name
            } else {
                format!("{}: {}", name, message)
            };
        }
    }
    format!("Uncaught {}", value.to_display_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Value;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_describe_thrown() {
        let mut fields = FxHashMap::default();
        fields.insert("name".to_string(), Value::string("Error"));
        fields.insert("message".to_string(), Value::string("boom"));
        assert_eq!(describe_thrown(&Value::object(fields)), "Error: boom");
        assert_eq!(describe_thrown(&Value::string("bad")), "Uncaught bad");
        assert_eq!(describe_thrown(&Value::Number(3.0)), "Uncaught 3");
    }
}
