//! Built-in function implementations
//!
//! This module provides the runtime library HostLang programs can call without
//! declaring anything.
//!
//! # Supported Built-ins
//!
//! - `console.log/info/warn/error/debug`: accepted and discarded (logged at `trace`)
//! - `Math.*`: the deterministic subset; there is no `Math.random`
//! - `Number`, `String`, `BigInt`, `parseInt`, `parseFloat`, `isNaN`
//! - `Array(n)`, `Array.from`, `Array.isArray`
//! - `JSON.stringify`, `Object.keys/values/entries`, `Error`
//! - Array, string and number methods
//!
//! # Implementation Notes
//!
//! - Every native function is a [`NativeFunction`] tagged with its qualified
//!   name, so globals are plain values and dispatch is a single `match`
//! - Object keys have no insertion order; `Object.keys` returns them sorted
//! - Callbacks (`map`, `sort` comparators, ...) run on a copy of the array, so
//!   a callback that mutates the array does not disturb the iteration

use crate::interpreter::constants::MAX_SAFE_INTEGER;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{check_array_length, check_string_length, RuntimeError};
use crate::interpreter::ops::binary::number_pow;
use crate::memory::stack::ScopeRef;
use crate::memory::value::{bigint_to_f64, format_number, string_to_number, ArrayRef, NativeFunction, Value};
use crate::parser::ast::SourceLocation;
use crate::snapshot::to_snapshot;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::trace;

const CONSOLE_FUNCTIONS: &[&str] = &[
    "console.log",
    "console.info",
    "console.warn",
    "console.error",
    "console.debug",
];

const MATH_FUNCTIONS: &[&str] = &[
    "Math.abs",
    "Math.floor",
    "Math.ceil",
    "Math.round",
    "Math.trunc",
    "Math.sign",
    "Math.sqrt",
    "Math.cbrt",
    "Math.pow",
    "Math.max",
    "Math.min",
    "Math.log",
    "Math.log2",
    "Math.log10",
];

const JSON_FUNCTIONS: &[&str] = &["JSON.stringify"];

const OBJECT_FUNCTIONS: &[&str] = &["Object.keys", "Object.values", "Object.entries"];

/// Plain global functions, bound under their own name
const GLOBAL_FUNCTIONS: &[&str] = &[
    "Array", "Number", "String", "BigInt", "Error", "parseInt", "parseFloat", "isNaN",
];

/// Bind the runtime library into a fresh global scope
pub(crate) fn install_globals(globals: &ScopeRef) {
    let mut scope = globals.borrow_mut();

    let math = namespace(MATH_FUNCTIONS);
    if let Value::Object(fields) = &math {
        let mut fields = fields.borrow_mut();
        fields.insert("PI".to_string(), Value::Number(std::f64::consts::PI));
        fields.insert("E".to_string(), Value::Number(std::f64::consts::E));
    }
    scope.declare("Math", math, false);
    scope.declare("console", namespace(CONSOLE_FUNCTIONS), false);
    scope.declare("JSON", namespace(JSON_FUNCTIONS), false);
    scope.declare("Object", namespace(OBJECT_FUNCTIONS), false);

    for &name in GLOBAL_FUNCTIONS {
        scope.declare(name, Value::Native(NativeFunction(name)), false);
    }

    scope.declare("undefined", Value::Undefined, true);
    scope.declare("NaN", Value::Number(f64::NAN), true);
    scope.declare("Infinity", Value::Number(f64::INFINITY), true);
}

/// An object whose fields are the given natives, keyed by the part after the dot
fn namespace(functions: &[&'static str]) -> Value {
    let fields = functions
        .iter()
        .map(|&name| {
            let key = name.split_once('.').map_or(name, |(_, member)| member);
            (key.to_string(), Value::Native(NativeFunction(name)))
        })
        .collect::<FxHashMap<_, _>>();
    Value::object(fields)
}

/// Natives that may be used with `new`
pub(crate) fn is_constructor(name: &str) -> bool {
    matches!(name, "Array" | "Error")
}

/// Properties of callable globals (`Number.MAX_SAFE_INTEGER`, `Array.from`)
pub(crate) fn native_static(owner: &str, member: &str) -> Option<Value> {
    let native = |name: &'static str| Some(Value::Native(NativeFunction(name)));
    match (owner, member) {
        ("Number", "MAX_SAFE_INTEGER") => Some(Value::Number(MAX_SAFE_INTEGER)),
        ("Number", "MIN_SAFE_INTEGER") => Some(Value::Number(-MAX_SAFE_INTEGER)),
        ("Number", "POSITIVE_INFINITY") => Some(Value::Number(f64::INFINITY)),
        ("Number", "NEGATIVE_INFINITY") => Some(Value::Number(f64::NEG_INFINITY)),
        ("Number", "EPSILON") => Some(Value::Number(f64::EPSILON)),
        ("Number", "isInteger") => native("Number.isInteger"),
        ("Number", "isNaN") => native("Number.isNaN"),
        ("Number", "parseInt") => native("parseInt"),
        ("Number", "parseFloat") => native("parseFloat"),
        ("Array", "from") => native("Array.from"),
        ("Array", "isArray") => native("Array.isArray"),
        _ => None,
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn num_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map_or(f64::NAN, Value::to_number)
}

/// Resolve a possibly negative position argument against `len`
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let n = match value {
        None | Some(Value::Undefined) => return default,
        Some(v) => v.to_number(),
    };
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

impl Interpreter<'_> {
    /// Call a native function by its qualified name
    pub(crate) fn call_native(
        &mut self,
        name: &'static str,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if name.starts_with("console.") {
            let text: Vec<String> = args.iter().map(Value::to_display_string).collect();
            trace!(
                target: "stepscope::program",
                method = name,
                output = %text.join(" "),
                "program output discarded"
            );
            return Ok(Value::Undefined);
        }
        if let Some(function) = name.strip_prefix("Math.") {
            return Ok(Value::Number(math_function(function, &args)));
        }

        match name {
            "Number" => Ok(Value::Number(match args.first() {
                None => 0.0,
                Some(Value::BigInt(n)) => bigint_to_f64(n),
                Some(v) => v.to_number(),
            })),
            "Number.isInteger" => Ok(Value::Bool(matches!(
                args.first(),
                Some(Value::Number(n)) if n.is_finite() && n.fract() == 0.0
            ))),
            "Number.isNaN" => Ok(Value::Bool(matches!(args.first(), Some(Value::Number(n)) if n.is_nan()))),
            "isNaN" => Ok(Value::Bool(num_arg(&args, 0).is_nan())),
            "String" => Ok(Value::string(
                args.first().map_or_else(String::new, Value::to_display_string),
            )),
            "BigInt" => to_bigint(&arg(&args, 0), location).map(Value::BigInt),
            "parseInt" => Ok(Value::Number(parse_int(
                &arg(&args, 0).to_display_string(),
                args.get(1),
            ))),
            "parseFloat" => Ok(Value::Number(parse_float(&arg(&args, 0).to_display_string()))),
            "Array" => construct_array(args, location),
            "Array.isArray" => Ok(Value::Bool(matches!(args.first(), Some(Value::Array(_))))),
            "Array.from" => self.array_from(&args, location),
            "Error" => {
                let message = match args.first() {
                    None | Some(Value::Undefined) => String::new(),
                    Some(v) => v.to_display_string(),
                };
                let mut fields = FxHashMap::default();
                fields.insert("name".to_string(), Value::string("Error"));
                fields.insert("message".to_string(), Value::string(message));
                Ok(Value::object(fields))
            }
            "JSON.stringify" => json_stringify(&arg(&args, 0), location),
            "Object.keys" | "Object.values" | "Object.entries" => {
                Ok(object_listing(name, &arg(&args, 0)))
            }
            _ => Err(RuntimeError::NotAFunction {
                callee: name.to_string(),
                location,
            }),
        }
    }

    fn array_from(&mut self, args: &[Value], location: SourceLocation) -> Result<Value, RuntimeError> {
        let source = arg(args, 0);
        let items = match &source {
            Value::Array(_) | Value::Str(_) => self.iterate(&source, location)?,
            Value::Object(fields) => {
                let length = fields.borrow().get("length").map_or(0.0, Value::to_number);
                if length.is_infinite() && length > 0.0 {
                    return Err(RuntimeError::range_error("Invalid array length", location));
                }
                let length = if length > 0.0 { length.trunc() as usize } else { 0 };
                check_array_length(length, location)?;
                vec![Value::Undefined; length]
            }
            _ => Vec::new(),
        };

        let Some(mapper) = args.get(1).filter(|m| !matches!(m, Value::Undefined)) else {
            return Ok(Value::array(items));
        };
        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let call_args = vec![item, Value::Number(index as f64)];
            mapped.push(self.call_value(mapper, call_args, "Array.from mapper", location)?);
        }
        Ok(Value::array(mapped))
    }

    /// `array.method(args)`
    pub(crate) fn call_array_method(
        &mut self,
        array: &ArrayRef,
        method: &str,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let len = array.borrow().len();

        match method {
            "push" => {
                let mut items = array.borrow_mut();
                check_array_length(items.len() + args.len(), location)?;
                items.extend(args);
                Ok(Value::Number(items.len() as f64))
            }
            "pop" => Ok(array.borrow_mut().pop().unwrap_or_default()),
            "shift" => {
                let mut items = array.borrow_mut();
                Ok(if items.is_empty() {
                    Value::Undefined
                } else {
                    items.remove(0)
                })
            }
            "unshift" => {
                let mut items = array.borrow_mut();
                check_array_length(items.len() + args.len(), location)?;
                let tail = std::mem::take(&mut *items);
                items.extend(args);
                items.extend(tail);
                Ok(Value::Number(items.len() as f64))
            }
            "fill" => {
                let value = arg(&args, 0);
                let start = relative_index(args.get(1), len, 0);
                let end = relative_index(args.get(2), len, len);
                let mut items = array.borrow_mut();
                for slot in items.iter_mut().take(end).skip(start) {
                    *slot = value.clone();
                }
                Ok(Value::Array(Rc::clone(array)))
            }
            "slice" => {
                let start = relative_index(args.first(), len, 0);
                let end = relative_index(args.get(1), len, len);
                let items = array.borrow();
                Ok(Value::array(if start < end {
                    items[start..end].to_vec()
                } else {
                    Vec::new()
                }))
            }
            "splice" => {
                let start = relative_index(args.first(), len, 0);
                let delete_count = match args.get(1) {
                    None => len - start,
                    Some(v) => {
                        let n = v.to_number();
                        if n.is_nan() || n < 0.0 { 0 } else { (n as usize).min(len - start) }
                    }
                };
                let inserted = args.into_iter().skip(2);
                let removed: Vec<Value> = array
                    .borrow_mut()
                    .splice(start..start + delete_count, inserted)
                    .collect();
                Ok(Value::array(removed))
            }
            "indexOf" | "lastIndexOf" | "includes" => {
                let needle = arg(&args, 0);
                let items = array.borrow();
                let found = match method {
                    "indexOf" => items.iter().position(|v| v.strict_equals(&needle)),
                    "lastIndexOf" => items.iter().rposition(|v| v.strict_equals(&needle)),
                    // includes treats NaN as equal to itself
                    _ => items.iter().position(|v| {
                        v.strict_equals(&needle)
                            || matches!((v, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
                    }),
                };
                Ok(match method {
                    "includes" => Value::Bool(found.is_some()),
                    _ => Value::Number(found.map_or(-1.0, |i| i as f64)),
                })
            }
            "join" | "toString" => {
                let separator = match args.first() {
                    None | Some(Value::Undefined) => ",".to_string(),
                    Some(v) => v.to_display_string(),
                };
                let parts: Vec<String> = array
                    .borrow()
                    .iter()
                    .map(|v| if v.is_nullish() { String::new() } else { v.to_display_string() })
                    .collect();
                let joined_length = parts.iter().map(String::len).sum::<usize>()
                    + separator.len().saturating_mul(parts.len().saturating_sub(1));
                check_string_length(joined_length, location)?;
                Ok(Value::string(parts.join(&separator)))
            }
            "reverse" => {
                array.borrow_mut().reverse();
                Ok(Value::Array(Rc::clone(array)))
            }
            "sort" => {
                let items = array.borrow().clone();
                let comparator = args.first().filter(|c| !matches!(c, Value::Undefined));
                let sorted = self.sort_values(items, comparator, location)?;
                *array.borrow_mut() = sorted;
                Ok(Value::Array(Rc::clone(array)))
            }
            "concat" => {
                let extra_length: usize = args
                    .iter()
                    .map(|extra| match extra {
                        Value::Array(other) => other.borrow().len(),
                        _ => 1,
                    })
                    .sum();
                check_array_length(len + extra_length, location)?;
                let mut items = array.borrow().clone();
                for extra in args {
                    match extra {
                        Value::Array(other) => items.extend(other.borrow().iter().cloned()),
                        other => items.push(other),
                    }
                }
                Ok(Value::array(items))
            }
            "at" => {
                let n = num_arg(&args, 0);
                let n = if n.is_nan() { 0.0 } else { n.trunc() };
                let index = if n < 0.0 { len as f64 + n } else { n };
                Ok(if index >= 0.0 {
                    array.borrow().get(index as usize).cloned().unwrap_or_default()
                } else {
                    Value::Undefined
                })
            }
            "map" | "forEach" | "filter" | "some" | "every" | "find" | "findIndex" => {
                self.iterate_with_callback(array, method, &args, location)
            }
            "reduce" => {
                let callback = arg(&args, 0);
                let items = array.borrow().clone();
                let mut iter = items.into_iter().enumerate();
                let mut accumulator = match args.get(1) {
                    Some(initial) => initial.clone(),
                    None => match iter.next() {
                        Some((_, first)) => first,
                        None => {
                            return Err(RuntimeError::type_error(
                                "Reduce of empty array with no initial value",
                                location,
                            ))
                        }
                    },
                };
                for (index, item) in iter {
                    let call_args = vec![
                        accumulator,
                        item,
                        Value::Number(index as f64),
                        Value::Array(Rc::clone(array)),
                    ];
                    accumulator = self.call_value(&callback, call_args, "reduce callback", location)?;
                }
                Ok(accumulator)
            }
            _ => Err(RuntimeError::NotAFunction {
                callee: format!("array.{}", method),
                location,
            }),
        }
    }

    fn iterate_with_callback(
        &mut self,
        array: &ArrayRef,
        method: &str,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let callback = arg(args, 0);
        if !callback.is_function() {
            return Err(RuntimeError::type_error(
                format!("{} is not a function", callback.to_display_string()),
                location,
            ));
        }

        let items = array.borrow().clone();
        let mut mapped = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let call_args = vec![
                item.clone(),
                Value::Number(index as f64),
                Value::Array(Rc::clone(array)),
            ];
            let result = self.call_value(&callback, call_args, method, location)?;
            match method {
                "map" => mapped.push(result),
                "filter" if result.is_truthy() => mapped.push(item),
                "some" if result.is_truthy() => return Ok(Value::Bool(true)),
                "every" if !result.is_truthy() => return Ok(Value::Bool(false)),
                "find" if result.is_truthy() => return Ok(item),
                "findIndex" if result.is_truthy() => return Ok(Value::Number(index as f64)),
                _ => {}
            }
        }

        Ok(match method {
            "map" | "filter" => Value::array(mapped),
            "some" => Value::Bool(false),
            "every" => Value::Bool(true),
            "findIndex" => Value::Number(-1.0),
            _ => Value::Undefined,
        })
    }

    /// Stable merge sort; `undefined` entries go last without being compared
    fn sort_values(
        &mut self,
        items: Vec<Value>,
        comparator: Option<&Value>,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        let (mut defined, undefined): (Vec<Value>, Vec<Value>) =
            items.into_iter().partition(|v| !matches!(v, Value::Undefined));

        let n = defined.len();
        let mut width = 1;
        while width < n {
            let mut merged = Vec::with_capacity(n);
            let mut start = 0;
            while start < n {
                let mid = (start + width).min(n);
                let end = (start + 2 * width).min(n);
                let (mut i, mut j) = (start, mid);
                while i < mid && j < end {
                    if self.sorts_after(&defined[i], &defined[j], comparator, location)? {
                        merged.push(defined[j].clone());
                        j += 1;
                    } else {
                        merged.push(defined[i].clone());
                        i += 1;
                    }
                }
                merged.extend_from_slice(&defined[i..mid]);
                merged.extend_from_slice(&defined[j..end]);
                start = end;
            }
            defined = merged;
            width *= 2;
        }

        defined.extend(undefined);
        Ok(defined)
    }

    fn sorts_after(
        &mut self,
        a: &Value,
        b: &Value,
        comparator: Option<&Value>,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        match comparator {
            Some(compare) => {
                let order = self.call_value(compare, vec![a.clone(), b.clone()], "comparator", location)?;
                Ok(order.to_number() > 0.0)
            }
            // Default order compares the string forms
            None => Ok(a.to_display_string() > b.to_display_string()),
        }
    }
}

fn math_function(function: &str, args: &[Value]) -> f64 {
    let x = num_arg(args, 0);
    match function {
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => {
            // Halves round towards +Infinity
            let floor = x.floor();
            if x - floor >= 0.5 {
                floor + 1.0
            } else {
                floor
            }
        }
        "trunc" => x.trunc(),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "sqrt" => x.sqrt(),
        "cbrt" => x.cbrt(),
        "pow" => number_pow(x, num_arg(args, 1)),
        "max" => args.iter().map(Value::to_number).fold(f64::NEG_INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.max(n) }
        }),
        "min" => args.iter().map(Value::to_number).fold(f64::INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() { f64::NAN } else { acc.min(n) }
        }),
        "log" => x.ln(),
        "log2" => x.log2(),
        "log10" => x.log10(),
        _ => f64::NAN,
    }
}

fn construct_array(args: Vec<Value>, location: SourceLocation) -> Result<Value, RuntimeError> {
    if let [Value::Number(n)] = args.as_slice() {
        if *n < 0.0 || n.fract() != 0.0 || !n.is_finite() || *n > u32::MAX as f64 {
            return Err(RuntimeError::range_error("Invalid array length", location));
        }
        check_array_length(*n as usize, location)?;
        return Ok(Value::array(vec![Value::Undefined; *n as usize]));
    }
    Ok(Value::array(args))
}

fn to_bigint(value: &Value, location: SourceLocation) -> Result<BigInt, RuntimeError> {
    match value {
        Value::BigInt(n) => Ok(n.clone()),
        Value::Bool(b) => Ok(BigInt::from(u8::from(*b))),
        Value::Number(n) => {
            if !n.is_finite() || n.fract() != 0.0 {
                return Err(RuntimeError::RangeError {
                    message: format!(
                        "The number {} cannot be converted to a BigInt because it is not an integer",
                        format_number(*n)
                    ),
                    location,
                });
            }
            format!("{:.0}", n).parse().map_err(|_| RuntimeError::RangeError {
                message: format!("Cannot convert {} to a BigInt", format_number(*n)),
                location,
            })
        }
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(BigInt::default());
            }
            trimmed.parse().map_err(|_| RuntimeError::SyntaxError {
                message: format!("Cannot convert {} to a BigInt", s),
                location,
            })
        }
        other => Err(RuntimeError::type_error(
            format!("Cannot convert {} to a BigInt", other.to_display_string()),
            location,
        )),
    }
}

/// `parseInt`: leading integer in the given radix, NaN when there is none
fn parse_int(text: &str, radix: Option<&Value>) -> f64 {
    let mut rest = text.trim_start();
    let negative = rest.starts_with('-');
    rest = rest.strip_prefix(['-', '+']).unwrap_or(rest);

    let mut radix = match radix.map(Value::to_number) {
        Some(r) if r.is_finite() && r != 0.0 => r.trunc() as u32,
        _ => 0,
    };
    if radix == 0 || radix == 16 {
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = hex;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let mut value = 0.0;
    let mut any = false;
    for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
        value = value * f64::from(radix) + f64::from(digit);
        any = true;
    }
    match (any, negative) {
        (false, _) => f64::NAN,
        (true, true) => -value,
        (true, false) => value,
    }
}

/// `parseFloat`: longest numeric prefix, NaN when there is none
fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if trimmed.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let int_digits = digits_from(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    string_to_number(&trimmed[..end])
}

fn json_stringify(value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
    if value.is_function() || matches!(value, Value::Undefined) {
        return Ok(Value::Undefined);
    }
    let json = to_snapshot(value).ok_or_else(|| {
        RuntimeError::type_error("Converting circular structure to JSON", location)
    })?;
    serde_json::to_string(&json)
        .map(Value::string)
        .map_err(|err| RuntimeError::type_error(err.to_string(), location))
}

fn object_listing(name: &str, value: &Value) -> Value {
    let Value::Object(fields) = value else {
        return Value::array(Vec::new());
    };
    let fields = fields.borrow();
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let entries = keys
        .into_iter()
        .map(|key| {
            let field = fields.get(key).cloned().unwrap_or_default();
            match name {
                "Object.keys" => Value::string(key),
                "Object.values" => field,
                _ => Value::array(vec![Value::string(key), field]),
            }
        })
        .collect();
    Value::array(entries)
}

/// `string.method(args)`
pub(crate) fn call_string_method(
    s: &Rc<str>,
    method: &str,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let substring = |start: usize, end: usize| Value::string(chars[start..end].iter().collect::<String>());
    let text_arg = |index: usize| match args.get(index) {
        None => "undefined".to_string(),
        Some(v) => v.to_display_string(),
    };

    Ok(match method {
        "charAt" => {
            let index = num_arg(args, 0);
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            if index >= 0.0 && (index as usize) < len {
                substring(index as usize, index as usize + 1)
            } else {
                Value::string("")
            }
        }
        "charCodeAt" => {
            let index = num_arg(args, 0);
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            if index >= 0.0 && (index as usize) < len {
                Value::Number(f64::from(u32::from(chars[index as usize])))
            } else {
                Value::Number(f64::NAN)
            }
        }
        "at" => {
            let n = num_arg(args, 0);
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index >= 0.0 && (index as usize) < len {
                substring(index as usize, index as usize + 1)
            } else {
                Value::Undefined
            }
        }
        "indexOf" | "includes" => {
            let needle: Vec<char> = text_arg(0).chars().collect();
            let from = relative_index(args.get(1), len, 0).min(len);
            let found = char_index_of(&chars, &needle, from);
            if method == "includes" {
                Value::Bool(found.is_some())
            } else {
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
        }
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "substring" => {
            let clamp = |v: Option<&Value>, default: usize| match v {
                None | Some(Value::Undefined) => default,
                Some(v) => {
                    let n = v.to_number();
                    if n.is_nan() { 0 } else { n.trunc().clamp(0.0, len as f64) as usize }
                }
            };
            let (a, b) = (clamp(args.first(), 0), clamp(args.get(1), len));
            substring(a.min(b), a.max(b))
        }
        "slice" => {
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            if start < end {
                substring(start, end)
            } else {
                Value::string("")
            }
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::Str(Rc::clone(s))],
                Some(sep) => {
                    let sep = sep.to_display_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::string).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "repeat" => {
            let count = num_arg(args, 0);
            let count = if count.is_nan() { 0.0 } else { count.trunc() };
            if count < 0.0 || !count.is_finite() {
                return Err(RuntimeError::RangeError {
                    message: format!("Invalid count value: {}", format_number(count)),
                    location,
                });
            }
            if !s.is_empty() && count > 0.0 {
                let length = (count as usize).checked_mul(s.len()).unwrap_or(usize::MAX);
                check_string_length(length, location)?;
            }
            Value::string(s.repeat(count as usize))
        }
        "concat" => {
            let mut joined = s.to_string();
            for extra in args {
                joined.push_str(&extra.to_display_string());
                check_string_length(joined.len(), location)?;
            }
            Value::string(joined)
        }
        "toString" => Value::Str(Rc::clone(s)),
        _ => {
            return Err(RuntimeError::NotAFunction {
                callee: format!("string.{}", method),
                location,
            })
        }
    })
}

fn char_index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..].starts_with(needle))
}

/// `number.method(args)`
pub(crate) fn call_number_method(
    n: f64,
    method: &str,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match method {
        "toFixed" => {
            let digits = match args.first() {
                None | Some(Value::Undefined) => 0.0,
                Some(v) => v.to_number().trunc(),
            };
            if !(0.0..=100.0).contains(&digits) {
                return Err(RuntimeError::RangeError {
                    message: "toFixed() digits argument must be between 0 and 100".to_string(),
                    location,
                });
            }
            if !n.is_finite() || n.abs() >= 1e21 {
                return Ok(Value::string(format_number(n)));
            }
            Ok(Value::string(format!("{:.*}", digits as usize, n)))
        }
        "toString" => {
            let radix = match args.first() {
                None | Some(Value::Undefined) => 10,
                Some(v) => v.to_number() as u32,
            };
            if !(2..=36).contains(&radix) {
                return Err(RuntimeError::RangeError {
                    message: "toString() radix must be between 2 and 36".to_string(),
                    location,
                });
            }
            Ok(Value::string(number_to_radix(n, radix)))
        }
        _ => Err(RuntimeError::NotAFunction {
            callee: format!("number.{}", method),
            location,
        }),
    }
}

/// Integers in any radix; fractions only in base 10
fn number_to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 || n.abs() > MAX_SAFE_INTEGER {
        return format_number(n);
    }
    let mut magnitude = n.abs() as u64;
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % u64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('?'));
        magnitude /= u64::from(radix);
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_math_round_and_extrema() {
        assert_eq!(math_function("round", &[Value::Number(2.5)]), 3.0);
        assert_eq!(math_function("round", &[Value::Number(-2.5)]), -2.0);
        assert_eq!(math_function("max", &[]), f64::NEG_INFINITY);
        assert_eq!(
            math_function("max", &[Value::Number(3.0), Value::string("7"), Value::Number(-1.0)]),
            7.0
        );
        assert!(math_function("min", &[Value::Number(1.0), Value::Undefined]).is_nan());
        assert_eq!(math_function("log2", &[Value::Number(8.0)]), 3.0);
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(parse_int("  42px", None), 42.0);
        assert_eq!(parse_int("-0x1F", None), -31.0);
        assert_eq!(parse_int("101", Some(&Value::Number(2.0))), 5.0);
        assert!(parse_int("abc", None).is_nan());
        assert_eq!(parse_float("3.25e2 apples"), 325.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("7e"), 7.0);
        assert!(parse_float("-").is_nan());
    }

    #[test]
    fn test_bigint_conversion() {
        assert_eq!(to_bigint(&Value::Number(12.0), loc()), Ok(BigInt::from(12)));
        assert_eq!(to_bigint(&Value::string(" 99 "), loc()), Ok(BigInt::from(99)));
        assert!(matches!(
            to_bigint(&Value::Number(1.5), loc()),
            Err(RuntimeError::RangeError { .. })
        ));
        assert!(matches!(
            to_bigint(&Value::string("1.5"), loc()),
            Err(RuntimeError::SyntaxError { .. })
        ));
    }

    #[test]
    fn test_string_methods() {
        let s: Rc<str> = Rc::from("Hello, World");
        let call = |method: &str, args: &[Value]| {
            call_string_method(&s, method, args, loc()).unwrap().to_display_string()
        };
        assert_eq!(call("charAt", &[Value::Number(4.0)]), "o");
        assert_eq!(call("indexOf", &[Value::string("World")]), "7");
        assert_eq!(call("substring", &[Value::Number(5.0), Value::Number(0.0)]), "Hello");
        assert_eq!(call("slice", &[Value::Number(-5.0)]), "World");
        assert_eq!(call("split", &[Value::string(", ")]), "Hello,World");
        assert_eq!(call("toUpperCase", &[]), "HELLO, WORLD");
    }

    #[test]
    fn test_number_methods() {
        let fixed = call_number_method(3.14159, "toFixed", &[Value::Number(2.0)], loc()).unwrap();
        assert_eq!(fixed.to_display_string(), "3.14");
        let binary = call_number_method(10.0, "toString", &[Value::Number(2.0)], loc()).unwrap();
        assert_eq!(binary.to_display_string(), "1010");
        let negative = call_number_method(-255.0, "toString", &[Value::Number(16.0)], loc()).unwrap();
        assert_eq!(negative.to_display_string(), "-ff");
    }

    #[test]
    fn test_array_constructor() {
        let holes = construct_array(vec![Value::Number(3.0)], loc()).unwrap();
        assert_eq!(holes.to_display_string(), ",,");
        assert!(matches!(
            construct_array(vec![Value::Number(-1.0)], loc()),
            Err(RuntimeError::RangeError { .. })
        ));
        let listed = construct_array(vec![Value::Number(1.0), Value::Number(2.0)], loc()).unwrap();
        assert_eq!(listed.to_display_string(), "1,2");
    }
}
