//! The readiness evaluator (§4.8). Unlike the static and dynamic evaluators, readiness
//! expressions are evaluated fresh on every call against the resource's latest observed
//! body — they are never cached across calls, since each invocation should reflect
//! whatever the caller just refreshed via `SetResource`.

use snafu::ResultExt;

use crate::error::{Error, ReadinessSnafu};
use crate::evaluator::{Bindings, EnvironmentSpec, Evaluator};
use crate::resource::ResourceTemplate;

/// Evaluates every readiness expression on `resource` against `observed_body`. An empty
/// readiness-expression list is vacuously ready (P10). The first expression evaluating to
/// `false` short-circuits the rest. Any compile/evaluate/type error is fatal and returned —
/// unlike the dynamic evaluator, there is no "incomplete data" classification here, since
/// readiness is only ever called once the resource has already been observed.
pub fn is_resource_ready(
    name: &str,
    resource: &ResourceTemplate,
    observed_body: &serde_json::Value,
    evaluator: &dyn Evaluator,
) -> Result<bool, Error> {
    if resource.readiness_expressions.is_empty() {
        return Ok(true);
    }

    let environment = evaluator.environment(&EnvironmentSpec::new(resource.top_level_fields.clone()));

    let mut bindings = Bindings::new();
    for field in &resource.top_level_fields {
        if let Some(value) = observed_body.get(field) {
            bindings.insert(field.clone(), value.clone());
        }
    }

    for expression in &resource.readiness_expressions {
        let program = environment
            .compile(expression)
            .with_context(|_| ReadinessSnafu {
                resource: name.to_string(),
            })?;
        let value = program.evaluate(&bindings).with_context(|_| ReadinessSnafu {
            resource: name.to_string(),
        })?;

        let ready = value.as_bool().ok_or_else(|| Error::Readiness {
            resource: name.to_string(),
            source: crate::evaluator::EvaluatorError::new(format!(
                "readiness expression \"{expression}\" did not evaluate to a bool"
            )),
        })?;

        if !ready {
            return Ok(false);
        }
    }

    Ok(true)
}
