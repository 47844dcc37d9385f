//! Binary operator evaluation
//!
//! Short-circuit operators are handled in expression evaluation; everything
//! here receives two already evaluated operands.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{check_bigint_bits, check_string_length, RuntimeError};
use crate::memory::value::{bigint_to_f64, Value};
use crate::parser::ast::{BinOp, SourceLocation};
use num_bigint::BigInt;
use std::cmp::Ordering;

impl Interpreter<'_> {
    pub(crate) fn evaluate_binary_op(
        &mut self,
        op: BinOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        use BinOp::*;

        match op {
            Add => add_values(left, right, location),
            Sub | Mul | Div | Mod | Pow => arithmetic(op, left, right, location),
            Eq => Ok(Value::Bool(left.loose_equals(right))),
            Ne => Ok(Value::Bool(!left.loose_equals(right))),
            StrictEq => Ok(Value::Bool(left.strict_equals(right))),
            StrictNe => Ok(Value::Bool(!left.strict_equals(right))),
            Lt | Le | Gt | Ge => {
                let ordering = compare_values(left, right);
                Ok(Value::Bool(match (op, ordering) {
                    (_, None) => false,
                    (Lt, Some(o)) => o == Ordering::Less,
                    (Le, Some(o)) => o != Ordering::Greater,
                    (Gt, Some(o)) => o == Ordering::Greater,
                    (_, Some(o)) => o != Ordering::Less,
                }))
            }
            BitAnd | BitOr | BitXor | BitShl | BitShr => bitwise(op, left, right, location),
            And | Or | Nullish => Err(RuntimeError::type_error(
                format!("'{}' must be evaluated lazily", op.symbol()),
                location,
            )),
        }
    }
}

/// `+`: string concatenation when either side is textual, numeric addition otherwise
pub(crate) fn add_values(
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let textual = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_) | Value::Object(_));
    if textual(left) || textual(right) {
        let mut text = left.to_display_string();
        text.push_str(&right.to_display_string());
        check_string_length(text.len(), location)?;
        return Ok(Value::string(text));
    }
    arithmetic(BinOp::Add, left, right, location)
}

/// Numeric operators, on two BigInts or two Numbers
pub(crate) fn arithmetic(
    op: BinOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arithmetic(op, a, b, location).map(Value::BigInt),
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => Err(RuntimeError::BigIntMix { location }),
        _ => {
            let (a, b) = (left.to_number(), right.to_number());
            Ok(Value::Number(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                // Rust's `%` on floats keeps the sign of the dividend
                BinOp::Mod => a % b,
                _ => number_pow(a, b),
            }))
        }
    }
}

pub(crate) fn number_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn bigint_arithmetic(
    op: BinOp,
    a: &BigInt,
    b: &BigInt,
    location: SourceLocation,
) -> Result<BigInt, RuntimeError> {
    let zero = BigInt::default();
    Ok(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => {
            check_bigint_bits(a.bits() + b.bits(), location)?;
            a * b
        }
        BinOp::Div | BinOp::Mod if *b == zero => {
            return Err(RuntimeError::BigIntDivisionByZero { location })
        }
        // Both truncate toward zero
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        _ => {
            if *b < zero {
                return Err(RuntimeError::RangeError {
                    message: "Exponent must be non-negative".to_string(),
                    location,
                });
            }
            let exponent: u32 = b.to_string().parse().map_err(|_| RuntimeError::RangeError {
                message: "Maximum BigInt size exceeded".to_string(),
                location,
            })?;
            // 0, 1 and -1 never grow
            if a.bits() > 1 {
                check_bigint_bits(a.bits().saturating_mul(u64::from(exponent)), location)?;
            }
            a.pow(exponent)
        }
    })
}

/// Relational comparison; `None` when the operands are unordered (NaN involved)
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
        (Value::BigInt(a), other) => bigint_to_f64(a).partial_cmp(&other.to_number()),
        (other, Value::BigInt(b)) => other.to_number().partial_cmp(&bigint_to_f64(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// ToInt32: truncate, then wrap into the signed 32-bit range
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    (wrapped as u32) as i32
}

fn bitwise(
    op: BinOp,
    left: &Value,
    right: &Value,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::BigInt(a), Value::BigInt(b)) => {
            let shift = |b: &BigInt| -> Result<usize, RuntimeError> {
                b.to_string().parse().map_err(|_| RuntimeError::RangeError {
                    message: "Invalid shift amount".to_string(),
                    location,
                })
            };
            Ok(Value::BigInt(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                BinOp::BitShl => {
                    let amount = shift(b)?;
                    check_bigint_bits(a.bits().saturating_add(amount as u64), location)?;
                    a << amount
                }
                _ => a >> shift(b)?,
            }))
        }
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => Err(RuntimeError::BigIntMix { location }),
        _ => {
            let a = to_int32(left.to_number());
            let b = to_int32(right.to_number());
            let shift = (b as u32) & 31;
            Ok(Value::Number(f64::from(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                BinOp::BitShl => a.wrapping_shl(shift),
                _ => a >> shift,
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn number(value: Result<Value, RuntimeError>) -> f64 {
        match value {
            Ok(Value::Number(n)) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_add_concatenates_strings() {
        let joined = add_values(&Value::string("x="), &Value::Number(4.0), loc()).unwrap();
        assert!(matches!(joined, Value::Str(ref s) if &**s == "x=4"));
        assert_eq!(number(add_values(&Value::Number(1.5), &Value::Bool(true), loc())), 2.5);
    }

    #[test]
    fn test_modulo_keeps_dividend_sign() {
        let r = arithmetic(BinOp::Mod, &Value::Number(-7.0), &Value::Number(3.0), loc());
        assert_eq!(number(r), -1.0);
    }

    #[test]
    fn test_bigint_rules() {
        let a = Value::BigInt(BigInt::from(7));
        let b = Value::BigInt(BigInt::from(2));
        assert!(matches!(
            arithmetic(BinOp::Div, &a, &b, loc()),
            Ok(Value::BigInt(ref n)) if *n == BigInt::from(3)
        ));
        assert!(matches!(
            arithmetic(BinOp::Add, &a, &Value::Number(1.0), loc()),
            Err(RuntimeError::BigIntMix { .. })
        ));
        assert!(matches!(
            arithmetic(BinOp::Mod, &a, &Value::BigInt(BigInt::default()), loc()),
            Err(RuntimeError::BigIntDivisionByZero { .. })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            compare_values(&Value::string("apple"), &Value::string("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&Value::Number(f64::NAN), &Value::Number(1.0)), None);
        assert_eq!(
            compare_values(&Value::BigInt(BigInt::from(5)), &Value::Number(4.5)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_int32_wrapping() {
        assert_eq!(to_int32(4_294_967_297.0), 1);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_int32(f64::NAN), 0);
    }
}
