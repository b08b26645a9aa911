//! Error types surfaced at the [`crate::Runtime`] boundary.
//!
//! Mirrors the error-enum shape used throughout the wider operator framework
//! (see `k8s_version::ParseLevelError` or the patchinator's `Error`): one flat
//! [`Snafu`]-derived enum, a `source` field wherever we wrap an underlying
//! cause, and a crate-local [`Result`] alias.

use snafu::Snafu;

use crate::evaluator::EvaluatorError;
use crate::resolver::ResolverError;

/// Errors returned by [`crate::Runtime`] construction and its driver-facing methods.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The graph builder handed us a resource keyed under the reserved `"instance"` name.
    #[snafu(display("resource name \"instance\" is reserved for the top-level instance"))]
    ReservedInstanceName,

    /// A static variable failed to compile or evaluate during construction.
    #[snafu(display("failed to evaluate static variables: {source}"))]
    StaticEvaluation { source: EvaluatorError },

    /// A dynamic variable evaluation failed without being classified as incomplete data.
    #[snafu(display("failed to evaluate dynamic variables: {source}"))]
    DynamicEvaluation { source: EvaluatorError },

    /// A dynamic variable's dependency is present but one of its optional sub-fields has
    /// not yet populated. The driver should retry after the next observation, not surface
    /// this to the end user.
    #[snafu(display("incomplete data while evaluating \"{expression}\": {source}"))]
    IncompleteData {
        expression: String,
        source: EvaluatorError,
    },

    /// Propagating resolved values into a resource template failed.
    #[snafu(display("failed to propagate resource variables for \"{resource}\": {source}"))]
    Propagation {
        resource: String,
        source: ResolverError,
    },

    /// Writing an instance-status value back onto the instance body failed.
    #[snafu(display("failed to evaluate instance statuses: {source}"))]
    InstanceStatus { source: ResolverError },

    /// A readiness expression failed to compile, evaluate, or did not evaluate to a bool.
    #[snafu(display("failed to evaluate readiness for \"{resource}\": {source}"))]
    Readiness {
        resource: String,
        source: EvaluatorError,
    },

    /// [`crate::Runtime::is_resource_ready`] or [`crate::Runtime::get_resource`] was called
    /// for a name that the graph builder never declared.
    #[snafu(display("unknown resource \"{resource}\""))]
    UnknownResource { resource: String },

    /// [`crate::Runtime::is_resource_ready`] was called before `SetResource` populated the
    /// resource's observed state.
    #[snafu(display("resource \"{resource}\" has not been observed yet"))]
    NotYetObserved { resource: String },
}

impl Error {
    /// Whether the driver should treat this as "try again after the next observation"
    /// rather than a user-facing failure. See the §7 error-handling design: this is the
    /// single place that exposes the distinction to callers.
    pub fn is_incomplete_data(&self) -> bool {
        matches!(self, Error::IncompleteData { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
