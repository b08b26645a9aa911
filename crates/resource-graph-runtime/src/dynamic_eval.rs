//! The dynamic evaluator (§4.3) and propagator (§4.4) — the main fixed-point step.

use indexmap::IndexMap;
use snafu::ResultExt;

use crate::cache::ExpressionCache;
use crate::error::{DynamicEvaluationSnafu, Error};
use crate::evaluator::{is_incomplete_data, Bindings, EnvironmentSpec, Evaluator};
use crate::resolver::{FieldDescriptor, PathResolver};
use crate::resource::ResourceTemplate;
use crate::variable::VariableKind;

/// Resolves every dynamic cell whose dependencies are all present in `resolved_resources`.
/// Cells whose dependencies aren't all satisfied yet, and cells already resolved, are left
/// alone (P5, gated evaluation).
///
/// A fresh [`crate::evaluator::Environment`] is built from the current
/// `resolved_resources` keyset on every call, since newly resolved siblings only become
/// bindable between calls (§4.3).
pub fn evaluate_dynamic_variables(
    cache: &ExpressionCache,
    resolved_resources: &IndexMap<String, serde_json::Value>,
    evaluator: &dyn Evaluator,
) -> Result<(), Error> {
    let environment = evaluator.environment(&EnvironmentSpec::new(resolved_resources.keys()));

    for cell in cache.iter() {
        let mut cell = cell.borrow_mut();
        if cell.kind != VariableKind::Dynamic || cell.is_resolved() {
            continue;
        }
        if !cell.dependencies_satisfied(&|name| resolved_resources.contains_key(name)) {
            continue;
        }

        let mut bindings = Bindings::new();
        for dependency in &cell.dependencies {
            let body = resolved_resources
                .get(dependency)
                .expect("dependency presence was just checked");
            bindings.insert(dependency.clone(), body.clone());
        }

        let program = environment
            .compile(&cell.expression)
            .context(DynamicEvaluationSnafu)?;

        let value = match program.evaluate(&bindings) {
            Ok(value) => value,
            Err(source) if is_incomplete_data(&source) => {
                return Err(Error::IncompleteData {
                    expression: cell.expression.clone(),
                    source,
                });
            }
            Err(source) => return Err(source).context(DynamicEvaluationSnafu),
        };

        cell.resolve(value);
    }

    Ok(())
}

/// After dynamic evaluation, writes each processable resource's resolved variable values
/// into its template body via `resolver` (§4.4). A resolver error is fatal for that
/// resource's cycle and returned to the caller immediately — resources already propagated
/// earlier in this same pass keep their writes.
pub fn propagate_resource_variables(
    resources: &IndexMap<String, ResourceTemplate>,
    resolved_resources: &IndexMap<String, serde_json::Value>,
    resolver: &dyn PathResolver,
) -> Result<(), Error> {
    for (name, resource) in resources {
        if !is_processable(name, resources, resolved_resources) {
            continue;
        }

        let fields: Vec<FieldDescriptor> = resource
            .runtime_variables
            .iter()
            .filter(|variable| variable.is_resolved())
            .map(|variable| FieldDescriptor {
                path: variable.field_path.clone(),
                expressions: variable
                    .cells
                    .iter()
                    .map(|cell| {
                        cell.borrow()
                            .value()
                            .cloned()
                            .expect("variable.is_resolved() guarantees a value")
                    })
                    .collect(),
            })
            .collect();

        if fields.is_empty() {
            continue;
        }

        let mut body = resource.body.borrow_mut();
        let summary = resolver.resolve(&mut body, &fields);
        if let Some(source) = summary.errors.into_iter().next() {
            return Err(Error::Propagation {
                resource: name.clone(),
                source,
            });
        }
    }

    Ok(())
}

/// A resource is processable (I3) iff every one of its own dynamic variables is resolved,
/// and for every resource it depends on, *that* dependency's own dynamic variables are
/// resolved too. This is a one-level check, not a recursive "is the dependency itself
/// processable" check — see DESIGN.md for why that's sufficient.
pub fn is_processable(
    name: &str,
    resources: &IndexMap<String, ResourceTemplate>,
    _resolved_resources: &IndexMap<String, serde_json::Value>,
) -> bool {
    let Some(resource) = resources.get(name) else {
        return false;
    };

    if !resource.own_dynamic_variables_resolved() {
        return false;
    }

    resource.dependencies.iter().all(|dependency| {
        resources
            .get(dependency)
            .is_some_and(ResourceTemplate::own_dynamic_variables_resolved)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::cell::new_cell_ref;
    use crate::variable::RuntimeVariable;

    /// Builds a minimal `ResourceTemplate` with no body fields beyond what `is_processable`
    /// inspects: its own runtime variables (pre-resolved or not) and its dependency names.
    fn template(variables: Vec<RuntimeVariable>, dependencies: Vec<&str>) -> ResourceTemplate {
        ResourceTemplate {
            name: "under-test".to_string(),
            body: Rc::new(RefCell::new(serde_json::json!({}))),
            runtime_variables: variables,
            readiness_expressions: Vec::new(),
            top_level_fields: Vec::new(),
            dependencies: dependencies.into_iter().map(str::to_string).collect(),
        }
    }

    fn resolved_variable() -> RuntimeVariable {
        let cell = new_cell_ref("x".to_string(), Vec::new(), VariableKind::Dynamic);
        cell.borrow_mut().resolve(serde_json::json!(1));
        RuntimeVariable {
            field_path: "spec.x".to_string(),
            cells: vec![cell],
        }
    }

    fn unresolved_variable() -> RuntimeVariable {
        RuntimeVariable {
            field_path: "spec.y".to_string(),
            cells: vec![new_cell_ref("y".to_string(), Vec::new(), VariableKind::Dynamic)],
        }
    }

    #[test]
    fn resource_with_no_variables_or_dependencies_is_processable() {
        let resources: IndexMap<String, ResourceTemplate> =
            IndexMap::from([("r".to_string(), template(vec![], vec![]))]);
        let resolved = IndexMap::new();

        assert!(is_processable("r", &resources, &resolved));
    }

    #[test]
    fn resource_with_unresolved_own_variable_is_not_processable() {
        let resources: IndexMap<String, ResourceTemplate> =
            IndexMap::from([("r".to_string(), template(vec![unresolved_variable()], vec![]))]);
        let resolved = IndexMap::new();

        assert!(!is_processable("r", &resources, &resolved));
    }

    #[test]
    fn resource_with_resolved_own_variable_but_unresolved_dependency_is_not_processable() {
        let resources: IndexMap<String, ResourceTemplate> = IndexMap::from([
            ("r".to_string(), template(vec![resolved_variable()], vec!["dep"])),
            ("dep".to_string(), template(vec![unresolved_variable()], vec![])),
        ]);
        let resolved = IndexMap::new();

        assert!(!is_processable("r", &resources, &resolved));
    }

    #[test]
    fn resource_is_processable_once_itself_and_its_dependency_are_resolved() {
        let resources: IndexMap<String, ResourceTemplate> = IndexMap::from([
            ("r".to_string(), template(vec![resolved_variable()], vec!["dep"])),
            ("dep".to_string(), template(vec![resolved_variable()], vec![])),
        ]);
        let resolved = IndexMap::new();

        assert!(is_processable("r", &resources, &resolved));
    }

    #[test]
    fn unknown_resource_name_is_not_processable() {
        let resources: IndexMap<String, ResourceTemplate> = IndexMap::new();
        let resolved = IndexMap::new();

        assert!(!is_processable("missing", &resources, &resolved));
    }
}
