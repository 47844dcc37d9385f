//! Assignment operations
//!
//! This module resolves assignment targets and writes through them:
//!
//! - Plain names, walking the scope chain to the nearest binding
//! - Array elements, growing the array with `undefined` holes when needed
//! - Object properties and `array.length`
//! - Array destructuring (`[a, b] = [b, a]`), which reads the whole right side
//!   before writing any target
//!
//! A target expression is resolved once into a [`Place`], so compound
//! assignment and `++`/`--` evaluate the container and index only one time.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{check_array_length, RuntimeError};
use crate::interpreter::ops::binary::add_values;
use crate::memory::stack::{AssignError, Scope};
use crate::memory::value::Value;
use crate::parser::ast::*;

/// A resolved assignment target
pub(crate) enum Place {
    Variable(String),
    Index(Value, Value),
    Member(Value, String),
}

impl Interpreter<'_> {
    pub(crate) fn execute_assignment(
        &mut self,
        lhs: &AstNode,
        rhs: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let AstNode::ArrayLiteral { elements, .. } = lhs {
            let value = self.evaluate_expr(rhs)?;
            let items = self.destructure(&value, elements.len(), location)?;
            for (target, item) in elements.iter().zip(items) {
                let place = self.resolve_place(target, location)?;
                self.write_place(&place, item, location)?;
            }
            return Ok(value);
        }

        let place = self.resolve_place(lhs, location)?;
        let value = self.evaluate_expr(rhs)?;
        self.write_place(&place, value.clone(), location)?;
        Ok(value)
    }

    pub(crate) fn execute_compound_assignment(
        &mut self,
        lhs: &AstNode,
        op: BinOp,
        rhs: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(lhs, location)?;
        let current = self.read_place(&place, location)?;
        let operand = self.evaluate_expr(rhs)?;
        let value = match op {
            BinOp::Add => add_values(&current, &operand, location)?,
            _ => self.evaluate_binary_op(op, &current, &operand, location)?,
        };
        self.write_place(&place, value.clone(), location)?;
        Ok(value)
    }

    /// Evaluate the container and key parts of an assignment target
    pub(crate) fn resolve_place(
        &mut self,
        target: &AstNode,
        location: SourceLocation,
    ) -> Result<Place, RuntimeError> {
        match target {
            AstNode::Variable(name, _) => Ok(Place::Variable(name.clone())),
            AstNode::ArrayAccess { array, index, .. } => {
                let container = self.evaluate_expr(array)?;
                let key = self.evaluate_expr(index)?;
                Ok(Place::Index(container, key))
            }
            AstNode::MemberAccess { object, member, .. } => {
                let container = self.evaluate_expr(object)?;
                Ok(Place::Member(container, member.clone()))
            }
            _ => Err(RuntimeError::SyntaxError {
                message: "Invalid left-hand side in assignment".to_string(),
                location,
            }),
        }
    }

    pub(crate) fn read_place(
        &mut self,
        place: &Place,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match place {
            Place::Variable(name) => {
                self.stack
                    .lookup(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        location,
                    })
            }
            Place::Index(container, key) => self.get_index(container, key, location),
            Place::Member(container, member) => self.get_member(container, member, location),
        }
    }

    pub(crate) fn write_place(
        &mut self,
        place: &Place,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match place {
            Place::Variable(name) => {
                Scope::assign(&self.current_scope(), name, value).map_err(|err| match err {
                    AssignError::Const => RuntimeError::ConstAssignment {
                        name: name.clone(),
                        location,
                    },
                    AssignError::Undeclared => RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        location,
                    },
                })
            }
            Place::Index(container, key) => set_index(container, key, value, location),
            Place::Member(container, member) => set_member(container, member, value, location),
        }
    }
}

fn set_index(
    container: &Value,
    key: &Value,
    value: Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    match container {
        Value::Array(items) => match array_index(key) {
            Some(index) => {
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    check_array_length(index.saturating_add(1), location)?;
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            None => match key {
                Value::Str(name) => set_member(container, name, value, location),
                // Non-index keys on arrays are not tracked
                _ => Ok(()),
            },
        },
        Value::Object(fields) => {
            fields.borrow_mut().insert(property_key(key), value);
            Ok(())
        }
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(
            format!(
                "Cannot set properties of {} (setting '{}')",
                container.to_display_string(),
                property_key(key)
            ),
            location,
        )),
        // Writes to primitives are silently dropped
        _ => Ok(()),
    }
}

fn set_member(
    container: &Value,
    member: &str,
    value: Value,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    match container {
        Value::Array(items) if member == "length" => {
            let length = value.to_number();
            if length < 0.0 || length.fract() != 0.0 || !length.is_finite() {
                return Err(RuntimeError::range_error("Invalid array length", location));
            }
            check_array_length(length as usize, location)?;
            items.borrow_mut().resize(length as usize, Value::Undefined);
            Ok(())
        }
        Value::Array(_) => match member.parse::<usize>() {
            Ok(index) => set_index(container, &Value::Number(index as f64), value, location),
            Err(_) => Ok(()),
        },
        Value::Object(fields) => {
            fields.borrow_mut().insert(member.to_string(), value);
            Ok(())
        }
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(
            format!(
                "Cannot set properties of {} (setting '{}')",
                container.to_display_string(),
                member
            ),
            location,
        )),
        _ => Ok(()),
    }
}

/// A key usable as an array index: a non-negative integral number
pub(crate) fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && n.is_finite() => Some(*n as usize),
        Value::Str(s) => s.parse::<usize>().ok().filter(|i| i.to_string() == **s),
        _ => None,
    }
}

/// Property name a key converts to
pub(crate) fn property_key(key: &Value) -> String {
    key.to_display_string()
}
