//! Runtime error types for the HostLang interpreter
//!
//! This module defines [`RuntimeError`], which represents every failure that can
//! occur while a program is simulated (as opposed to parse errors).
//!
//! All runtime errors are fatal to the run. The runner keeps the steps that were
//! produced before the failure and reports the error's message alongside them.

use crate::interpreter::constants::{MAX_ARRAY_LENGTH, MAX_BIGINT_BITS, MAX_STRING_LENGTH};
use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
///
/// `Display` follows the error names HostLang programs would see
/// (`ReferenceError: x is not defined`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Read of a name with no binding in scope
    #[error("ReferenceError: {name} is not defined")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Assignment to a `const` binding
    #[error("TypeError: Assignment to constant variable '{name}'")]
    ConstAssignment {
        name: String,
        location: SourceLocation,
    },

    /// Operation applied to a value of the wrong kind
    #[error("TypeError: {message}")]
    TypeError {
        message: String,
        location: SourceLocation,
    },

    /// Call of something that is not a function
    #[error("TypeError: {callee} is not a function")]
    NotAFunction {
        callee: String,
        location: SourceLocation,
    },

    /// Arithmetic between a BigInt and a Number
    #[error("TypeError: Cannot mix BigInt and other types, use explicit conversions")]
    BigIntMix { location: SourceLocation },

    /// BigInt division or remainder by zero
    #[error("RangeError: Division by zero")]
    BigIntDivisionByZero { location: SourceLocation },

    /// Too many nested calls
    #[error("RangeError: Maximum call stack size exceeded")]
    CallDepthExceeded {
        depth: usize,
        location: SourceLocation,
    },

    /// Numeric argument out of its allowed range
    #[error("RangeError: {message}")]
    RangeError {
        message: String,
        location: SourceLocation,
    },

    /// Text that cannot be converted (`BigInt("1.5")`)
    #[error("SyntaxError: {message}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    /// A value raised by `throw`, already rendered as text
    #[error("{message}")]
    Thrown {
        message: String,
        location: SourceLocation,
    },

    /// The step consumer stopped listening; the run unwinds without reporting
    #[error("run halted by the step consumer")]
    Halted,
}

impl RuntimeError {
    /// Where the error was raised, if it is tied to a source position
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            RuntimeError::UndefinedVariable { location, .. }
            | RuntimeError::ConstAssignment { location, .. }
            | RuntimeError::TypeError { location, .. }
            | RuntimeError::NotAFunction { location, .. }
            | RuntimeError::BigIntMix { location }
            | RuntimeError::BigIntDivisionByZero { location }
            | RuntimeError::CallDepthExceeded { location, .. }
            | RuntimeError::RangeError { location, .. }
            | RuntimeError::SyntaxError { location, .. }
            | RuntimeError::Thrown { location, .. } => Some(*location),
            RuntimeError::Halted => None,
        }
    }

    /// Message with the host line appended, as shown to the user
    pub fn report(&self) -> String {
        match self.location() {
            Some(location) if location.line > 0 => {
                format!("{} (line {})", self, location.line)
            }
            _ => self.to_string(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn range_error(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::RangeError {
            message: message.into(),
            location,
        }
    }
}

/// Rejects an array that would grow past [`MAX_ARRAY_LENGTH`]
pub(crate) fn check_array_length(length: usize, location: SourceLocation) -> Result<(), RuntimeError> {
    if length > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::range_error("Invalid array length", location));
    }
    Ok(())
}

/// Rejects a string that would grow past [`MAX_STRING_LENGTH`] bytes
pub(crate) fn check_string_length(length: usize, location: SourceLocation) -> Result<(), RuntimeError> {
    if length > MAX_STRING_LENGTH {
        return Err(RuntimeError::range_error("Invalid string length", location));
    }
    Ok(())
}

/// Rejects a BigInt result wider than [`MAX_BIGINT_BITS`]
pub(crate) fn check_bigint_bits(bits: u64, location: SourceLocation) -> Result<(), RuntimeError> {
    if bits > MAX_BIGINT_BITS {
        return Err(RuntimeError::range_error("Maximum BigInt size exceeded", location));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_hostlang_error_names() {
        let err = RuntimeError::UndefinedVariable {
            name: "y".to_string(),
            location: SourceLocation::new(3, 5),
        };
        assert_eq!(err.to_string(), "ReferenceError: y is not defined");
        assert_eq!(err.report(), "ReferenceError: y is not defined (line 3)");
    }

    #[test]
    fn test_length_checks_stop_at_the_limits() {
        let at = SourceLocation::new(1, 1);
        assert_eq!(check_array_length(MAX_ARRAY_LENGTH, at), Ok(()));
        assert_eq!(
            check_array_length(MAX_ARRAY_LENGTH + 1, at).map_err(|e| e.to_string()),
            Err("RangeError: Invalid array length".to_string())
        );
        assert_eq!(check_string_length(MAX_STRING_LENGTH, at), Ok(()));
        assert!(check_string_length(MAX_STRING_LENGTH + 1, at).is_err());
        assert!(check_bigint_bits(MAX_BIGINT_BITS + 1, at).is_err());
    }

    #[test]
    fn test_halted_has_no_location() {
        assert_eq!(RuntimeError::Halted.location(), None);
        assert_eq!(RuntimeError::Halted.report(), "run halted by the step consumer");
    }
}
