//! Unary operator evaluation

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::to_int32;
use crate::memory::value::Value;
use crate::parser::ast::*;
use num_bigint::BigInt;

impl Interpreter<'_> {
    pub(crate) fn evaluate_unary_op(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        use UnOp::*;

        match op {
            Neg => {
                let val = self.evaluate_expr(operand)?;
                Ok(match val {
                    Value::BigInt(n) => Value::BigInt(-n),
                    other => Value::Number(-other.to_number()),
                })
            }
            Plus => {
                let val = self.evaluate_expr(operand)?;
                if matches!(val, Value::BigInt(_)) {
                    return Err(RuntimeError::type_error(
                        "Cannot convert a BigInt value to a number",
                        location,
                    ));
                }
                Ok(Value::Number(val.to_number()))
            }
            Not => Ok(Value::Bool(!self.evaluate_expr(operand)?.is_truthy())),
            BitNot => {
                let val = self.evaluate_expr(operand)?;
                Ok(match val {
                    Value::BigInt(n) => Value::BigInt(!n),
                    other => Value::Number(f64::from(!to_int32(other.to_number()))),
                })
            }
            Typeof => self.evaluate_typeof(operand),
            PreInc | PreDec | PostInc | PostDec => self.evaluate_inc_dec_op(op, operand, location),
        }
    }

    /// `typeof` never fails on an unbound name
    fn evaluate_typeof(&mut self, operand: &AstNode) -> Result<Value, RuntimeError> {
        if let AstNode::Variable(name, _) = operand {
            if self.stack.lookup(name).is_none() {
                return Ok(Value::string("undefined"));
            }
        }
        let val = self.evaluate_expr(operand)?;
        Ok(Value::string(val.type_name()))
    }

    fn evaluate_inc_dec_op(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(operand, location)?;
        let old = self.read_place(&place, location)?;

        let step = if matches!(op, UnOp::PreInc | UnOp::PostInc) {
            1
        } else {
            -1
        };
        let old = match old {
            Value::BigInt(n) => Value::BigInt(n),
            other => Value::Number(other.to_number()),
        };
        let new = match &old {
            Value::BigInt(n) => Value::BigInt(n + BigInt::from(step)),
            other => Value::Number(other.to_number() + f64::from(step)),
        };

        self.write_place(&place, new.clone(), location)?;
        Ok(match op {
            UnOp::PreInc | UnOp::PreDec => new,
            _ => old,
        })
    }
}
