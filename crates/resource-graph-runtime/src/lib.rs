//! Incremental evaluation core for resource-group-style orchestration.
//!
//! A resource group describes a desired instance, a set of dependent resources, and the
//! CEL expressions binding them together. This crate owns the piece of a reconciler that
//! turns those declarations into concrete values as dependency data becomes available: a
//! content-addressed cache deduplicates identical expressions across resources, a
//! knowledge-driven fixed point resolves dynamic variables as their dependencies are
//! observed, and a readiness predicate reports whether a resource's own condition
//! expressions are satisfied.
//!
//! What this crate does *not* do: it does not build the dependency graph or compute a
//! topological order (the graph builder hands that in), it does not talk to a cluster (the
//! driver calls [`Runtime::get_resource`]/[`Runtime::set_resource`] around its own apply/
//! observe loop), and it does not compile expressions itself (that's delegated to an
//! [`Evaluator`] — [`CelEvaluator`] by default).
//!
//! ```no_run
//! use resource_graph_runtime::{InstanceSpec, ResourceSpec, Runtime, VariableSpec};
//!
//! let instance = InstanceSpec {
//!     body: serde_json::json!({ "spec": { "replicas": 3 } }),
//!     variables: vec![],
//! };
//! let resources = vec![ResourceSpec {
//!     name: "deployment".to_string(),
//!     body: serde_json::json!({ "spec": {} }),
//!     variables: vec![VariableSpec::static_var("spec.replicas", "spec.replicas")],
//!     readiness_expressions: vec![],
//!     top_level_fields: vec![],
//!     dependencies: vec![],
//! }];
//!
//! let mut runtime = Runtime::new(instance, resources, vec!["deployment".to_string()]).unwrap();
//! runtime.synchronize().unwrap();
//! ```

mod cache;
mod cel_evaluator;
mod cell;
mod dynamic_eval;
mod error;
mod evaluator;
mod instance_status;
mod readiness;
mod resolver;
mod resource;
mod runtime;
mod static_eval;
mod variable;

pub use cel_evaluator::CelEvaluator;
pub use error::{Error, Result};
pub use evaluator::{Bindings, CompiledProgram, Environment, EnvironmentSpec, Evaluator, EvaluatorError};
pub use resolver::{FieldDescriptor, JsonPathResolver, PathResolver, ResolveSummary, ResolverError};
pub use resource::{InstanceSpec, ResourceSpec, ResourceState, ResourceTemplate, SharedBody};
pub use runtime::Runtime;
pub use variable::{RuntimeVariable, VariableKind, VariableSpec};
