//! Error type for expression parsing and evaluation.

use crate::template::Position;

/// Result alias used throughout the expression crate.
pub type ExpressionResult<T> = std::result::Result<T, ExpressionError>;

/// Errors produced while parsing or evaluating an expression or template.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ExpressionError {
    /// The expression text could not be parsed.
    #[error("parse error: {message}")]
    ParseError {
        /// Description of what went wrong.
        message: String,
    },

    /// An operator or function received a value of the wrong type.
    #[error("type error: expected {expected}, found {found}")]
    TypeError {
        /// The expected type name.
        expected: String,
        /// The actual type name encountered.
        found: String,
    },

    /// A referenced variable is not bound in the evaluation context.
    #[error("variable not found: {name}")]
    VariableNotFound {
        /// The unresolved variable name.
        name: String,
    },

    /// A call targeted a builtin function that does not exist.
    #[error("function not found: {name}")]
    FunctionNotFound {
        /// The unresolved function name.
        name: String,
    },

    /// A function call received the wrong number of arguments.
    #[error("invalid argument to `{function}`: {message}")]
    InvalidArgument {
        /// Name of the function that rejected its argument.
        function: String,
        /// Description of the problem.
        message: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An array or string index fell outside the valid range.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The length of the collection being indexed.
        length: usize,
    },

    /// A regex pattern failed to compile or was rejected for safety reasons.
    #[error("regex error: {message}")]
    RegexError {
        /// Description of the regex failure.
        message: String,
    },

    /// Catch-all evaluation failure not covered by a more specific variant.
    #[error("evaluation error: {message}")]
    EvalError {
        /// Description of the failure.
        message: String,
    },
}

/// Convenience constructors mirroring the teacher's `nebula-error` style,
/// kept local so this crate has no circular dependency on its own error type.
pub trait ExpressionErrorExt {
    /// Build a [`ExpressionError::ParseError`].
    fn expression_parse_error(message: impl Into<String>) -> Self;
    /// Build a [`ExpressionError::TypeError`].
    fn expression_type_error(expected: impl Into<String>, found: impl Into<String>) -> Self;
    /// Build a [`ExpressionError::VariableNotFound`].
    fn expression_variable_not_found(name: impl Into<String>) -> Self;
    /// Build a [`ExpressionError::FunctionNotFound`].
    fn expression_function_not_found(name: impl Into<String>) -> Self;
    /// Build a [`ExpressionError::InvalidArgument`].
    fn expression_invalid_argument(function: impl Into<String>, message: impl Into<String>)
    -> Self;
    /// Build a [`ExpressionError::DivisionByZero`].
    fn expression_division_by_zero() -> Self;
    /// Build a [`ExpressionError::IndexOutOfBounds`].
    fn expression_index_out_of_bounds(index: i64, length: usize) -> Self;
    /// Build a [`ExpressionError::RegexError`].
    fn expression_regex_error(message: impl Into<String>) -> Self;
    /// Build a [`ExpressionError::EvalError`].
    fn expression_eval_error(message: impl Into<String>) -> Self;
    /// Alias kept for call sites that spell it `type_error`.
    fn type_error(expected: impl Into<String>, found: impl Into<String>) -> Self;
}

impl ExpressionErrorExt for ExpressionError {
    fn expression_parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    fn expression_type_error(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            found: found.into(),
        }
    }

    fn expression_variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound { name: name.into() }
    }

    fn expression_function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    fn expression_invalid_argument(
        function: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    fn expression_division_by_zero() -> Self {
        Self::DivisionByZero
    }

    fn expression_index_out_of_bounds(index: i64, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    fn expression_regex_error(message: impl Into<String>) -> Self {
        Self::RegexError {
            message: message.into(),
        }
    }

    fn expression_eval_error(message: impl Into<String>) -> Self {
        Self::EvalError {
            message: message.into(),
        }
    }

    fn type_error(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::expression_type_error(expected, found)
    }
}

/// Pair an [`ExpressionError`] with the template [`Position`] it occurred at.
#[derive(Debug, Clone)]
pub struct PositionedError {
    /// The underlying error.
    pub error: ExpressionError,
    /// Where in the source template the error occurred.
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_roundtrip_message() {
        let err = ExpressionError::expression_type_error("string", "number");
        assert_eq!(err.to_string(), "type error: expected string, found number");
    }

    #[test]
    fn division_by_zero_display() {
        assert_eq!(
            ExpressionError::expression_division_by_zero().to_string(),
            "division by zero"
        );
    }
}
