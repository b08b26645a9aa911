//! The resource abstraction consumed from the graph builder (§6), and the runtime-owned
//! shape it's turned into during construction.

use std::cell::RefCell;
use std::rc::Rc;

use crate::variable::{RuntimeVariable, VariableSpec};

/// A shared handle onto a resource or instance body. Cloning shares the same underlying
/// `serde_json::Value` — mutations made by the propagator, the instance-status writer, or a
/// driver holding a clone are all visible through every other clone, which is what lets
/// `GetResource` hand the driver "the template body, not a copy" (§4.7).
pub type SharedBody = Rc<RefCell<serde_json::Value>>;

/// A named resource template as declared by the graph builder: an unstructured body, its
/// variables, its readiness expressions, the top-level fields readiness is scoped to, and
/// the names of the resources it depends on.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub name: String,
    pub body: serde_json::Value,
    pub variables: Vec<VariableSpec>,
    pub readiness_expressions: Vec<String>,
    pub top_level_fields: Vec<String>,
    pub dependencies: Vec<String>,
}

/// The instance's own declaration: a body and a list of status variables. There is no
/// `dependencies` list — dependency gating for instance variables is driven purely by
/// `dependencies` on each [`VariableSpec`], same as any dynamic resource variable.
#[derive(Debug, Clone, Default)]
pub struct InstanceSpec {
    pub body: serde_json::Value,
    pub variables: Vec<VariableSpec>,
}

/// State reported by [`crate::Runtime::get_resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Either the driver has already observed this resource, or it is processable and the
    /// returned body is the template ready to be applied.
    Resolved,
    /// At least one dynamic variable — on this resource or on one of its dependencies — is
    /// still unresolved.
    WaitingOnDependencies,
}

/// The runtime-owned counterpart to [`ResourceSpec`]: variables have been deduplicated into
/// shared cache cells (I2), and the body lives behind a [`SharedBody`] handle so propagation
/// writes are visible to any driver holding a clone.
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    pub name: String,
    pub body: SharedBody,
    pub runtime_variables: Vec<RuntimeVariable>,
    /// Readiness expressions are deliberately kept out of the shared expression cache (§9):
    /// `evaluate_dynamic_variables` walks every dynamic cell in the cache gated only on
    /// `dependencies` being satisfied, and a readiness expression's `dependencies` is always
    /// empty (it isn't keyed to a sibling resource the way a dynamic variable is), so a cell
    /// for it would look vacuously ready to evaluate on the very first `synchronize()` call
    /// — using the *dynamic*-evaluation environment (sibling resource names), not the
    /// top-level-field environment `readiness.rs` actually evaluates readiness against. It
    /// would fail with an undeclared-identifier error that can never be retried away, so no
    /// resource declaring a readiness expression could ever reach quiescence. `readiness.rs`
    /// evaluates these fresh against the observed body on every call instead.
    pub readiness_expressions: Vec<String>,
    pub top_level_fields: Vec<String>,
    pub dependencies: Vec<String>,
}

impl ResourceTemplate {
    /// Whether every one of this resource's own dynamic variables is resolved. Does not
    /// check dependencies — that's `Runtime::is_processable`'s job, since it needs to walk
    /// the dependency graph transitively.
    pub fn own_dynamic_variables_resolved(&self) -> bool {
        self.runtime_variables.iter().all(RuntimeVariable::is_resolved)
    }
}
