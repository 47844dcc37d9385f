//! Expression evaluation implementation
//!
//! This module handles evaluation of all HostLang expression types, including:
//!
//! - Literals (numbers, BigInts, strings, arrays, objects)
//! - Variables and identifiers
//! - Short-circuit operators (`&&`, `||`, `??`) and the conditional operator
//! - Function expressions, calls and `new`
//! - `await`, which evaluates its operand in place
//!
//! Operators, member access and assignment are split out under [`ops`](super::ops).

use crate::interpreter::constants::MAX_CALL_DEPTH;
use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::stack::Scope;
use crate::memory::value::{Closure, Value};
use crate::parser::ast::*;
use rustc_hash::FxHashMap;
use std::rc::Rc;

impl Interpreter<'_> {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        let location = expr.location();

        match expr {
            AstNode::NumberLiteral(n, _) => Ok(Value::Number(*n)),

            AstNode::BigIntLiteral(digits, _) => {
                digits
                    .parse()
                    .map(Value::BigInt)
                    .map_err(|_| RuntimeError::SyntaxError {
                        message: format!("Invalid BigInt literal {}n", digits),
                        location,
                    })
            }

            AstNode::StringLiteral(s, _) => Ok(Value::string(s)),

            AstNode::BoolLiteral(b, _) => Ok(Value::Bool(*b)),

            AstNode::Null { .. } => Ok(Value::Null),

            AstNode::Variable(name, _) => {
                self.stack
                    .lookup(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        location,
                    })
            }

            AstNode::ArrayLiteral { elements, .. } => {
                let items = self.evaluate_list(elements)?;
                Ok(Value::array(items))
            }

            AstNode::ObjectLiteral { properties, .. } => {
                let mut fields = FxHashMap::default();
                for (key, value_expr) in properties {
                    let value = self.evaluate_expr(value_expr)?;
                    fields.insert(key.clone(), value);
                }
                Ok(Value::object(fields))
            }

            AstNode::Spread { .. } => Err(RuntimeError::SyntaxError {
                message: "Unexpected spread outside of a list".to_string(),
                location,
            }),

            AstNode::BinaryOp {
                op: BinOp::And,
                left,
                right,
                ..
            } => {
                let lhs = self.evaluate_expr(left)?;
                if lhs.is_truthy() {
                    self.evaluate_expr(right)
                } else {
                    Ok(lhs)
                }
            }

            AstNode::BinaryOp {
                op: BinOp::Or,
                left,
                right,
                ..
            } => {
                let lhs = self.evaluate_expr(left)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.evaluate_expr(right)
                }
            }

            AstNode::BinaryOp {
                op: BinOp::Nullish,
                left,
                right,
                ..
            } => {
                let lhs = self.evaluate_expr(left)?;
                if lhs.is_nullish() {
                    self.evaluate_expr(right)
                } else {
                    Ok(lhs)
                }
            }

            AstNode::BinaryOp {
                op, left, right, ..
            } => {
                let lhs = self.evaluate_expr(left)?;
                let rhs = self.evaluate_expr(right)?;
                self.evaluate_binary_op(*op, &lhs, &rhs, location)
            }

            AstNode::UnaryOp { op, operand, .. } => self.evaluate_unary_op(*op, operand, location),

            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.evaluate_expr(true_expr)
                } else {
                    self.evaluate_expr(false_expr)
                }
            }

            AstNode::Assignment { lhs, rhs, .. } => self.execute_assignment(lhs, rhs, location),

            AstNode::CompoundAssignment { lhs, op, rhs, .. } => {
                self.execute_compound_assignment(lhs, *op, rhs, location)
            }

            AstNode::Call { callee, args, .. } => self.evaluate_call(callee, args, location),

            AstNode::New { callee, args, .. } => self.evaluate_new(callee, args, location),

            AstNode::ArrayAccess { array, index, .. } => {
                let container = self.evaluate_expr(array)?;
                let key = self.evaluate_expr(index)?;
                self.get_index(&container, &key, location)
            }

            AstNode::MemberAccess { object, member, .. } => {
                let container = self.evaluate_expr(object)?;
                self.get_member(&container, member, location)
            }

            AstNode::FunctionExpr { func, .. } => Ok(self.make_closure(func)),

            // There is one logical thread and no promises: the awaited value is the result
            AstNode::Await { expr, .. } => self.evaluate_expr(expr),

            _ => Err(RuntimeError::SyntaxError {
                message: "Unexpected statement in expression position".to_string(),
                location,
            }),
        }
    }

    /// Evaluate array elements or call arguments, expanding `...spread` entries
    pub(crate) fn evaluate_list(&mut self, exprs: &[AstNode]) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            match expr {
                AstNode::Spread { expr: inner, location } => {
                    let source = self.evaluate_expr(inner)?;
                    values.extend(self.iterate(&source, *location)?);
                }
                _ => values.push(self.evaluate_expr(expr)?),
            }
        }
        Ok(values)
    }

    fn evaluate_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let AstNode::MemberAccess { object, member, .. } = callee {
            let receiver = self.evaluate_expr(object)?;
            let arg_values = self.evaluate_list(args)?;
            return self.call_method(&receiver, member, arg_values, location);
        }

        let function = self.evaluate_expr(callee)?;
        let arg_values = self.evaluate_list(args)?;
        self.call_value(&function, arg_values, &describe_callee(callee), location)
    }

    /// Call any callable value; `callee` names it in error messages
    pub(crate) fn call_value(
        &mut self,
        function: &Value,
        args: Vec<Value>,
        callee: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(closure) => self.call_closure(closure, args, location),
            Value::Native(native) => self.call_native(native.0, args, location),
            _ => Err(RuntimeError::NotAFunction {
                callee: callee.to_string(),
                location,
            }),
        }
    }

    /// Run a user function body in a new frame
    pub(crate) fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let depth = self.stack.depth();
        if depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded { depth, location });
        }

        let func = &closure.func;
        let scope = Scope::child(&closure.env, true);
        {
            let mut bindings = scope.borrow_mut();
            let mut args = args.into_iter();
            for param in &func.params {
                bindings.declare(param.as_str(), args.next().unwrap_or_default(), false);
            }
        }

        let name = func.name.clone().unwrap_or_else(|| "<anonymous>".to_string());
        self.stack.push_frame(name, scope);
        let saved_location = self.current_location;
        let result = self.execute_statements(&func.body);
        self.stack.pop_frame();
        self.current_location = saved_location;
        result?;

        let value = if self.control_flow == ControlFlow::Return {
            self.return_value.take().unwrap_or_default()
        } else {
            Value::Undefined
        };
        self.control_flow = ControlFlow::Normal;
        Ok(value)
    }

    fn evaluate_new(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let constructor = self.evaluate_expr(callee)?;
        let arg_values = self.evaluate_list(args)?;
        match constructor {
            Value::Native(native) if crate::interpreter::builtins::is_constructor(native.0) => {
                self.call_native(native.0, arg_values, location)
            }
            _ => Err(RuntimeError::type_error(
                format!("{} is not a constructor", describe_callee(callee)),
                location,
            )),
        }
    }
}

/// Short source-like name of a callee for error messages
pub(crate) fn describe_callee(callee: &AstNode) -> String {
    match callee {
        AstNode::Variable(name, _) => name.clone(),
        AstNode::MemberAccess { object, member, .. } => {
            format!("{}.{}", describe_callee(object), member)
        }
        AstNode::ArrayAccess { array, .. } => format!("{}[...]", describe_callee(array)),
        AstNode::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}
