use crate::interpreter::builtins;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::assign::{array_index, property_key};
use crate::memory::value::{format_number, Value};
use crate::parser::ast::SourceLocation;

impl Interpreter<'_> {
    /// `container.member`
    pub(crate) fn get_member(
        &self,
        container: &Value,
        member: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match container {
            Value::Array(items) => Ok(match member {
                "length" => Value::Number(items.borrow().len() as f64),
                _ => match member.parse::<usize>() {
                    Ok(index) => items.borrow().get(index).cloned().unwrap_or_default(),
                    Err(_) => Value::Undefined,
                },
            }),
            Value::Str(s) => Ok(match member {
                "length" => Value::Number(s.chars().count() as f64),
                _ => Value::Undefined,
            }),
            Value::Object(fields) => Ok(fields.borrow().get(member).cloned().unwrap_or_default()),
            Value::Native(native) => Ok(builtins::native_static(native.0, member).unwrap_or_default()),
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    container.to_display_string(),
                    member
                ),
                location,
            )),
            _ => Ok(Value::Undefined),
        }
    }

    /// `container[key]`
    pub(crate) fn get_index(
        &self,
        container: &Value,
        key: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match container {
            Value::Array(items) => match array_index(key) {
                Some(index) => Ok(items.borrow().get(index).cloned().unwrap_or_default()),
                None => self.get_member(container, &property_key(key), location),
            },
            Value::Str(s) => match array_index(key) {
                Some(index) => Ok(s
                    .chars()
                    .nth(index)
                    .map_or(Value::Undefined, |c| Value::string(c.to_string()))),
                None => self.get_member(container, &property_key(key), location),
            },
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    container.to_display_string(),
                    property_key(key)
                ),
                location,
            )),
            _ => {
                let name = match key {
                    Value::Number(n) => format_number(*n),
                    other => property_key(other),
                };
                self.get_member(container, &name, location)
            }
        }
    }

    /// Elements produced by iterating `value` (`for-of`, spread, destructuring)
    pub(crate) fn iterate(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            other => Err(RuntimeError::type_error(
                format!("{} is not iterable", other.to_display_string()),
                location,
            )),
        }
    }

    /// `receiver.method(args)`
    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Array(items) => self.call_array_method(items, method, args, location),
            Value::Str(s) => builtins::call_string_method(s, method, &args, location),
            Value::Number(n) => builtins::call_number_method(*n, method, &args, location),
            Value::BigInt(n) if method == "toString" => Ok(Value::string(n.to_string())),
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    receiver.to_display_string(),
                    method
                ),
                location,
            )),
            _ => {
                let function = self.get_member(receiver, method, location)?;
                self.call_value(&function, args, method, location)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::value::Value;
    use crate::interpreter::ops::assign::array_index;

    #[test]
    fn test_array_index_keys() {
        assert_eq!(array_index(&Value::Number(2.0)), Some(2));
        assert_eq!(array_index(&Value::Number(-1.0)), None);
        assert_eq!(array_index(&Value::Number(1.5)), None);
        assert_eq!(array_index(&Value::string("3")), Some(3));
        assert_eq!(array_index(&Value::string("03")), None);
    }
}
