//! Facade tying together the parser, evaluator, and builtin registry.

use std::sync::Arc;

use serde_json::Value;

use crate::builtins::BuiltinRegistry;
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionErrorExt, ExpressionResult};
use crate::eval::Evaluator;
use crate::parser;
use crate::value_utils::is_truthy;
use crate::ExpressionError;

/// Parses and evaluates expression strings against an [`EvaluationContext`].
///
/// One engine instance can be shared across many evaluations; it holds no
/// per-call state beyond the builtin registry.
pub struct ExpressionEngine {
    evaluator: Evaluator,
}

impl ExpressionEngine {
    /// Build an engine with the default builtin function set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(Arc::new(BuiltinRegistry::new())),
        }
    }

    /// Parse and evaluate an expression, returning its JSON value.
    pub fn evaluate(&self, source: &str, context: &EvaluationContext) -> ExpressionResult<Value> {
        let ast = parser::parse(source)?;
        self.evaluator.eval(&ast, context)
    }

    /// Evaluate an expression and coerce the result to a boolean using the
    /// same truthiness rules as `if`/`&&`/`||`.
    ///
    /// Used by the `condition` node executor: the grammar admitted here is
    /// deliberately restricted to arithmetic, comparisons, boolean
    /// operators, and the `len`/membership builtins, rather than a full
    /// general-purpose scripting language.
    pub fn evaluate_bool(&self, source: &str, context: &EvaluationContext) -> ExpressionResult<bool> {
        let value = self.evaluate(source, context)?;
        Ok(is_truthy(&value))
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExpressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEngine").finish_non_exhaustive()
    }
}

/// Re-raised here so callers constructing a condition error don't need to
/// import the evaluator error module directly.
pub fn condition_error(message: impl Into<String>) -> ExpressionError {
    ExpressionError::expression_eval_error(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(input: Value) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();
        ctx.set_input(input);
        ctx
    }

    #[test]
    fn evaluates_arithmetic() {
        let engine = ExpressionEngine::new();
        let ctx = EvaluationContext::new();
        let result = engine.evaluate("1 + 2 * 3", &ctx).unwrap();
        assert_eq!(result, serde_json::json!(7.0));
    }

    #[test]
    fn evaluates_comparison_to_bool() {
        let engine = ExpressionEngine::new();
        let ctx = EvaluationContext::new();
        assert!(engine.evaluate_bool("3 > 2 && 1 == 1", &ctx).unwrap());
        assert!(!engine.evaluate_bool("3 < 2", &ctx).unwrap());
    }

    #[test]
    fn evaluates_function_call_on_input() {
        let engine = ExpressionEngine::new();
        let ctx = ctx_with(serde_json::json!({"name": "ada"}));
        let result = engine.evaluate("uppercase($input.name)", &ctx).unwrap();
        assert_eq!(result, serde_json::json!("ADA"));
    }

    #[test]
    fn unknown_variable_path_errors() {
        let engine = ExpressionEngine::new();
        let ctx = EvaluationContext::new();
        assert!(engine.evaluate("$input.missing.deep", &ctx).is_err());
    }
}
