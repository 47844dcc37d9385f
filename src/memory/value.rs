//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! in the HostLang interpreter.
//!
//! # Value Types
//!
//! - [`Value::Undefined`] and [`Value::Null`]
//! - [`Value::Bool`], [`Value::Number`] (an IEEE double), [`Value::Str`]
//! - [`Value::BigInt`]: arbitrary precision integer
//! - [`Value::Array`] and [`Value::Object`]: shared, mutable containers
//! - [`Value::Function`]: a closure over its defining scope
//! - [`Value::Native`]: a function provided by the runtime
//!
//! # Reference Semantics
//!
//! Arrays and objects are reference counted, so two bindings to the same array
//! observe each other's writes. Cloning a `Value` never copies a container.

use crate::memory::stack::ScopeRef;
use crate::parser::ast::FunctionDef;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type ObjectRef = Rc<RefCell<FxHashMap<String, Value>>>;

/// Runtime values in the interpreter
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    Str(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Closure>),
    Native(NativeFunction),
}

/// A user function together with the scope it was created in
pub struct Closure {
    pub func: Arc<FunctionDef>,
    pub env: ScopeRef,
}

/// A runtime-provided function, identified by its qualified name (`Math.max`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeFunction(pub &'static str);

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(fields: FxHashMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    /// Result of the `typeof` operator
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Truthiness as used by conditions and `!`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => *n != BigInt::default(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// Numeric conversion (`Number(x)`, unary `+`). BigInts are handled by callers.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::BigInt(n) => bigint_to_f64(n),
            Value::Str(s) => string_to_number(s),
            Value::Array(items) => {
                let items = items.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            }
            Value::Object(_) | Value::Function(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// String conversion as done by `String(x)` and `+` with a string operand
    pub fn to_display_string(&self) -> String {
        let mut seen = Vec::new();
        self.display_into(&mut seen)
    }

    fn display_into(&self, seen: &mut Vec<*const RefCell<Vec<Value>>>) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::BigInt(n) => n.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if seen.contains(&ptr) {
                    return String::new();
                }
                seen.push(ptr);
                let parts: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|v| if v.is_nullish() { String::new() } else { v.display_into(seen) })
                    .collect();
                seen.pop();
                parts.join(",")
            }
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(closure) => {
                let name = closure.func.name.as_deref().unwrap_or("");
                format!("function {}() {{ [code] }}", name)
            }
            Value::Native(native) => format!("function {}() {{ [native code] }}", native.0),
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::BigInt(a), Value::Number(b)) | (Value::Number(b), Value::BigInt(a)) => {
                bigint_to_f64(a) == *b
            }
            (Value::BigInt(a), Value::Str(s)) | (Value::Str(s), Value::BigInt(a)) => {
                s.trim().parse::<BigInt>().is_ok_and(|b| &b == a)
            }
            (Value::Number(_) | Value::Str(_) | Value::Bool(_), Value::Number(_) | Value::Str(_) | Value::Bool(_))
                if std::mem::discriminant(self) != std::mem::discriminant(other) =>
            {
                self.to_number() == other.to_number()
            }
            (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::Str(_))
            | (Value::Number(_) | Value::Str(_), Value::Array(_) | Value::Object(_)) => {
                let (obj, prim) = if matches!(self, Value::Array(_) | Value::Object(_)) {
                    (self, other)
                } else {
                    (other, self)
                };
                Value::string(obj.to_display_string()).loose_equals(prim)
            }
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::BigInt(n) => write!(f, "{}n", n),
            Value::Array(items) => write!(f, "Array({})", items.borrow().len()),
            Value::Object(fields) => write!(f, "Object({} keys)", fields.borrow().len()),
            other => write!(f, "{}", other.to_display_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Format a number the way HostLang prints it: integers without a fraction,
/// `NaN`, `Infinity`, and exponent form from 1e21 upward.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let text = format!("{:e}", n);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{:.0}", n);
    }
    format!("{}", n)
}

/// `Number("...")`: surrounding whitespace ignored, empty string is 0
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Nearest double to a BigInt
pub fn bigint_to_f64(n: &BigInt) -> f64 {
    n.to_string().parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-f64::INFINITY), "-Infinity");
        assert_eq!(format_number(1e21), "1e+21");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::array(Vec::new()).is_truthy());
        assert!(!Value::BigInt(BigInt::default()).is_truthy());
    }

    #[test]
    fn test_equality() {
        assert!(Value::Number(1.0).loose_equals(&Value::string("1")));
        assert!(!Value::Number(1.0).strict_equals(&Value::string("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::BigInt(BigInt::from(3)).loose_equals(&Value::Number(3.0)));

        let a = Value::array(vec![Value::Number(1.0)]);
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&Value::array(vec![Value::Number(1.0)])));
    }

    #[test]
    fn test_display_string() {
        let nested = Value::array(vec![
            Value::Number(1.0),
            Value::array(vec![Value::Number(2.0), Value::Null]),
        ]);
        assert_eq!(nested.to_display_string(), "1,2,");
        assert_eq!(Value::string(" 42 ").to_number(), 42.0);
        assert!(Value::string("4x").to_number().is_nan());
    }
}
