//! The static evaluator (§4.2): runs once at construction, resolving every cell whose kind
//! is [`VariableKind::Static`] against the instance's input spec.

use snafu::ResultExt;

use crate::cache::ExpressionCache;
use crate::error::{Error, StaticEvaluationSnafu};
use crate::evaluator::{Bindings, EnvironmentSpec, Evaluator};
use crate::variable::VariableKind;

/// Resolves every unresolved static cell in `cache`. A no-op if there are no static cells.
/// Any compilation or evaluation error is fatal and aborts construction — there is no path
/// to obtain a [`crate::Runtime`] whose static cells failed to resolve.
pub fn evaluate_static_variables(
    cache: &ExpressionCache,
    instance_body: &serde_json::Value,
    evaluator: &dyn Evaluator,
) -> Result<(), Error> {
    let spec_subtree = instance_body
        .get("spec")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let environment = evaluator.environment(&EnvironmentSpec::new(["spec"]));
    let mut bindings = Bindings::new();
    bindings.insert("spec".to_string(), spec_subtree);

    for cell in cache.iter() {
        let mut cell = cell.borrow_mut();
        if cell.kind != VariableKind::Static || cell.is_resolved() {
            continue;
        }

        let program = environment
            .compile(&cell.expression)
            .context(StaticEvaluationSnafu)?;
        let value = program.evaluate(&bindings).context(StaticEvaluationSnafu)?;
        cell.resolve(value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cel_evaluator::CelEvaluator;
    use crate::variable::VariableKind;

    #[test]
    fn resolves_static_cell_from_instance_spec() {
        let mut cache = ExpressionCache::new();
        let cell = cache.get_or_insert("spec.replicas", &[], VariableKind::Static);

        evaluate_static_variables(
            &cache,
            &serde_json::json!({ "spec": { "replicas": 3 } }),
            &CelEvaluator,
        )
        .unwrap();

        assert_eq!(cell.borrow().value(), Some(&serde_json::json!(3)));
        assert!(cell.borrow().is_resolved());
    }

    #[test]
    fn no_op_when_no_static_cells() {
        let cache = ExpressionCache::new();
        evaluate_static_variables(&cache, &serde_json::json!({}), &CelEvaluator).unwrap();
    }
}
