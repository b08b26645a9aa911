//! The top-level state machine (§4.6) and accessors (§4.7, §4.8) the driver consumes.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::cache::ExpressionCache;
use crate::cel_evaluator::CelEvaluator;
use crate::dynamic_eval::{evaluate_dynamic_variables, is_processable, propagate_resource_variables};
use crate::error::Error;
use crate::evaluator::Evaluator;
use crate::instance_status::evaluate_instance_statuses;
use crate::readiness;
use crate::resolver::{JsonPathResolver, PathResolver};
use crate::resource::{InstanceSpec, ResourceSpec, ResourceState, ResourceTemplate, SharedBody};
use crate::variable::{RuntimeVariable, VariableSpec};

const INSTANCE_KEY: &str = "instance";

/// The owning state of one reconciliation's worth of expression evaluation.
///
/// Single-owner, not thread-safe (§5): cells and bodies are shared via `Rc<RefCell<_>>`, not
/// `Arc<Mutex<_>>`, because exactly one reconciliation worker drives a given `Runtime` at a
/// time. Construct once per reconciliation from the graph builder's output; there is no
/// persisted state to load (§6).
pub struct Runtime {
    instance_body: SharedBody,
    instance_variables: Vec<RuntimeVariable>,
    resources: IndexMap<String, ResourceTemplate>,
    resolved_resources: IndexMap<String, serde_json::Value>,
    cache: ExpressionCache,
    topological_order: Vec<String>,
    evaluator: Box<dyn Evaluator>,
    resolver: Box<dyn PathResolver>,
}

impl Runtime {
    /// Builds a runtime with the default CEL evaluator and the default
    /// `serde_json`-backed path resolver. The common case for an embedder that doesn't need
    /// a custom expression language or a custom template-writing strategy.
    pub fn new(
        instance: InstanceSpec,
        resources: Vec<ResourceSpec>,
        topological_order: Vec<String>,
    ) -> Result<Self, Error> {
        Self::with_collaborators(
            instance,
            resources,
            topological_order,
            Box::new(CelEvaluator),
            Box::new(JsonPathResolver),
        )
    }

    /// Builds a runtime with an injected [`Evaluator`] and [`PathResolver`] — the seam an
    /// embedder uses to swap in a different expression language or template-writing
    /// strategy (§7 "Configuration").
    #[instrument(skip(instance, resources, evaluator, resolver), level = "debug")]
    pub fn with_collaborators(
        instance: InstanceSpec,
        resources: Vec<ResourceSpec>,
        topological_order: Vec<String>,
        evaluator: Box<dyn Evaluator>,
        resolver: Box<dyn PathResolver>,
    ) -> Result<Self, Error> {
        if resources.iter().any(|resource| resource.name == INSTANCE_KEY) {
            return Err(Error::ReservedInstanceName);
        }

        let mut cache = ExpressionCache::new();
        let mut resource_templates = IndexMap::new();

        for resource_spec in resources {
            let runtime_variables = register_variables(&mut cache, &resource_spec.variables);

            resource_templates.insert(
                resource_spec.name.clone(),
                ResourceTemplate {
                    name: resource_spec.name,
                    body: Rc::new(RefCell::new(resource_spec.body)),
                    runtime_variables,
                    readiness_expressions: resource_spec.readiness_expressions,
                    top_level_fields: resource_spec.top_level_fields,
                    dependencies: resource_spec.dependencies,
                },
            );
        }

        let instance_variables = register_variables(&mut cache, &instance.variables);
        let instance_body: SharedBody = Rc::new(RefCell::new(instance.body));

        crate::static_eval::evaluate_static_variables(&cache, &instance_body.borrow(), evaluator.as_ref())?;

        let resolved_resources = IndexMap::new();
        propagate_resource_variables(&resource_templates, &resolved_resources, resolver.as_ref())?;

        debug!(
            resources = resource_templates.len(),
            cells = cache.len(),
            "constructed resource-group runtime"
        );

        Ok(Self {
            instance_body,
            instance_variables,
            resources: resource_templates,
            resolved_resources,
            cache,
            topological_order,
            evaluator,
            resolver,
        })
    }

    pub fn topological_order(&self) -> &[String] {
        &self.topological_order
    }

    pub fn resource_descriptor(&self, name: &str) -> Option<&ResourceTemplate> {
        self.resources.get(name)
    }

    /// One forward-progress step (§4.6). Returns `Ok(true)` if the driver should call again
    /// after acting on newly-processable resources, `Ok(false)` once quiescent (I4), or an
    /// error — check [`Error::is_incomplete_data`] to decide whether retrying next
    /// reconcile tick is worthwhile.
    #[instrument(skip(self), level = "debug")]
    pub fn synchronize(&mut self) -> Result<bool, Error> {
        if self.cache.all_resolved() && self.resolved_resources.len() == self.resources.len() {
            debug!("runtime reached quiescence");
            return Ok(false);
        }

        if let Err(err) = evaluate_dynamic_variables(&self.cache, &self.resolved_resources, self.evaluator.as_ref()) {
            if err.is_incomplete_data() {
                warn!(error = %err, "incomplete data, will retry on next reconcile");
            }
            return Err(err);
        }

        propagate_resource_variables(&self.resources, &self.resolved_resources, self.resolver.as_ref())?;

        evaluate_instance_statuses(&self.instance_body, &self.instance_variables, self.resolver.as_ref());

        Ok(true)
    }

    /// Returns a resource's current body and state (§4.7). `None` for the body means the
    /// resource is still waiting on dependencies; the driver has nothing to apply yet.
    pub fn get_resource(&self, name: &str) -> Result<(Option<SharedBody>, ResourceState), Error> {
        let resource = self
            .resources
            .get(name)
            .ok_or_else(|| Error::UnknownResource {
                resource: name.to_string(),
            })?;

        if let Some(observed) = self.resolved_resources.get(name) {
            return Ok((
                Some(Rc::new(RefCell::new(observed.clone()))),
                ResourceState::Resolved,
            ));
        }

        if is_processable(name, &self.resources, &self.resolved_resources) {
            return Ok((Some(resource.body.clone()), ResourceState::Resolved));
        }

        Ok((None, ResourceState::WaitingOnDependencies))
    }

    /// Records a resource's post-apply observed state, unlocking any dynamic cells gated on
    /// it (§4.3, P5).
    #[instrument(skip(self, observed_body), level = "debug")]
    pub fn set_resource(&mut self, name: &str, observed_body: serde_json::Value) -> Result<(), Error> {
        if !self.resources.contains_key(name) {
            return Err(Error::UnknownResource {
                resource: name.to_string(),
            });
        }
        self.resolved_resources.insert(name.to_string(), observed_body);
        Ok(())
    }

    pub fn get_instance(&self) -> SharedBody {
        self.instance_body.clone()
    }

    /// Replaces the instance body's contents in place, preserving the `Rc` identity so any
    /// clone of the handle a caller is holding keeps observing this runtime's instance.
    pub fn set_instance(&mut self, body: serde_json::Value) {
        *self.instance_body.borrow_mut() = body;
    }

    /// Evaluates readiness for `name` against its latest observed state (§4.8). Errors if
    /// the resource hasn't been passed to `set_resource` yet (P11).
    #[instrument(skip(self), level = "debug")]
    pub fn is_resource_ready(&self, name: &str) -> Result<bool, Error> {
        let resource = self
            .resources
            .get(name)
            .ok_or_else(|| Error::UnknownResource {
                resource: name.to_string(),
            })?;
        let observed = self
            .resolved_resources
            .get(name)
            .ok_or_else(|| Error::NotYetObserved {
                resource: name.to_string(),
            })?;

        readiness::is_resource_ready(name, resource, observed, self.evaluator.as_ref())
    }
}

/// Deduplicates each expression string in `variables` into the shared cache, returning the
/// per-variable list of cell references the runtime keeps (§4.1). Shared with both resource
/// and instance variable registration since the algorithm is identical for both.
fn register_variables(cache: &mut ExpressionCache, variables: &[VariableSpec]) -> Vec<RuntimeVariable> {
    variables
        .iter()
        .map(|variable| {
            let cells = variable
                .expressions
                .iter()
                .map(|expression| cache.get_or_insert(expression, &variable.dependencies, variable.kind))
                .collect();
            RuntimeVariable {
                field_path: variable.field_path.clone(),
                cells,
            }
        })
        .collect()
}
