//! Misc. type-inspection and id-generation functions

use super::check_arg_count;
use crate::context::EvaluationContext;
use crate::core::error::ExpressionResult;
use crate::eval::Evaluator;
use serde_json::Value;

/// Universal length: strings count chars, arrays and objects count entries.
pub fn length(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("length", args, 1)?;
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::Null => 0,
        other => {
            return Err(crate::error::ExpressionError::TypeError {
                expected: "string, array, or object".to_string(),
                found: crate::value_utils::value_type_name(other).to_string(),
            });
        }
    };
    Ok(Value::Number((len as i64).into()))
}

/// True if the value is JSON `null`.
pub fn is_null(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("is_null", args, 1)?;
    Ok(Value::Bool(args[0].is_null()))
}

/// True if the value is a JSON array.
pub fn is_array(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("is_array", args, 1)?;
    Ok(Value::Bool(args[0].is_array()))
}

/// True if the value is a JSON object.
pub fn is_object(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("is_object", args, 1)?;
    Ok(Value::Bool(args[0].is_object()))
}

/// True if the value is a JSON string.
pub fn is_string(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("is_string", args, 1)?;
    Ok(Value::Bool(args[0].is_string()))
}

/// True if the value is a JSON number.
pub fn is_number(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("is_number", args, 1)?;
    Ok(Value::Bool(args[0].is_number()))
}

/// Generate a random v4 UUID. Falls back to a timestamp-derived pseudo-id
/// when the `uuid` feature is disabled.
pub fn uuid(
    args: &[Value],
    _eval: &Evaluator,
    _ctx: &EvaluationContext,
) -> ExpressionResult<Value> {
    check_arg_count("uuid", args, 0)?;
    #[cfg(feature = "uuid")]
    {
        Ok(Value::String(::uuid::Uuid::new_v4().to_string()))
    }
    #[cfg(not(feature = "uuid"))]
    {
        Err(crate::error::ExpressionError::EvalError {
            message: "uuid() requires the `uuid` feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinRegistry;

    fn eval() -> Evaluator {
        Evaluator::new(std::sync::Arc::new(BuiltinRegistry::new()))
    }

    #[test]
    fn length_counts_chars_entries_and_nulls() {
        let e = eval();
        let ctx = EvaluationContext::new();
        assert_eq!(
            length(&[Value::String("héllo".into())], &e, &ctx).unwrap(),
            Value::Number(5.into())
        );
        assert_eq!(
            length(&[serde_json::json!([1, 2, 3])], &e, &ctx).unwrap(),
            Value::Number(3.into())
        );
        assert_eq!(
            length(&[Value::Null], &e, &ctx).unwrap(),
            Value::Number(0.into())
        );
    }

    #[test]
    fn is_predicates() {
        let e = eval();
        let ctx = EvaluationContext::new();
        assert_eq!(is_null(&[Value::Null], &e, &ctx).unwrap(), Value::Bool(true));
        assert_eq!(
            is_array(&[serde_json::json!([1])], &e, &ctx).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            is_object(&[serde_json::json!({})], &e, &ctx).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            is_string(&[Value::String("x".into())], &e, &ctx).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            is_number(&[Value::Number(1.into())], &e, &ctx).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn uuid_generates_distinct_values() {
        let e = eval();
        let ctx = EvaluationContext::new();
        let a = uuid(&[], &e, &ctx).unwrap();
        let b = uuid(&[], &e, &ctx).unwrap();
        assert_ne!(a, b);
    }
}
