//! The expression-language boundary the core evaluators compile and run expressions through.
//!
//! Nothing outside this module and [`crate::cel_evaluator`] names a concrete expression
//! language. [`static_eval`](crate::static_eval), [`dynamic_eval`](crate::dynamic_eval) and
//! [`readiness`](crate::readiness) only ever see [`Evaluator`], [`Environment`] and
//! [`CompiledProgram`] trait objects, so swapping the expression language means writing a
//! new adapter, not touching the fixed-point logic.

use std::fmt;

use indexmap::IndexMap;

/// Name → value bindings an expression is evaluated against.
pub type Bindings = IndexMap<String, serde_json::Value>;

/// Declares which names a compiled [`Environment`] will accept bindings for.
///
/// A fresh environment is built for every dynamic-evaluation pass (§4.3): as more sibling
/// resources resolve, the set of bindable names grows, so the environment can't be built
/// once and reused.
#[derive(Debug, Clone)]
pub struct EnvironmentSpec {
    pub variables: Vec<String>,
}

impl EnvironmentSpec {
    pub fn new(variables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }
}

/// A black-box expression-language implementation: given an [`EnvironmentSpec`], produce an
/// [`Environment`] that can compile expression strings into [`CompiledProgram`]s.
pub trait Evaluator {
    fn environment(&self, spec: &EnvironmentSpec) -> Box<dyn Environment>;
}

/// Compiles expression strings against the fixed set of names it was built for.
pub trait Environment {
    fn compile(&self, expression: &str) -> Result<Box<dyn CompiledProgram>, EvaluatorError>;
}

/// A compiled, reusable program. Evaluating it against [`Bindings`] produces a native
/// [`serde_json::Value`] — the "convert to native value" step of §4.2–§4.4 and §4.8 is
/// folded into this boundary, since `serde_json::Value` already is the runtime's native
/// value representation.
pub trait CompiledProgram {
    fn evaluate(&self, bindings: &Bindings) -> Result<serde_json::Value, EvaluatorError>;
}

/// An error from compiling or evaluating an expression, or from converting a successfully
/// evaluated value into [`serde_json::Value`].
#[derive(Debug)]
pub struct EvaluatorError {
    message: String,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvaluatorError {}

/// Classifies a dynamic-evaluation failure as "incomplete data" vs. a hard error.
///
/// This is the known-fragile substring check from §4.3/§9: the underlying evaluator has no
/// structured "missing binding" error code, so we match on the message it produces when an
/// expression indexes into a map key that isn't present yet. Isolated here so a future,
/// better-behaved evaluator only needs to change this one function.
pub fn is_incomplete_data(error: &EvaluatorError) -> bool {
    error.message().contains("no such key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_missing_key_as_incomplete_data() {
        let err = EvaluatorError::new("ExecutionError: no such key: status");
        assert!(is_incomplete_data(&err));
    }

    #[test]
    fn does_not_classify_other_errors_as_incomplete_data() {
        let err = EvaluatorError::new("ExecutionError: unsupported binary operator");
        assert!(!is_incomplete_data(&err));
    }
}
