//! Variable declarations: the input shape the graph builder hands us, and the
//! cache-backed shape the runtime keeps internally.

use crate::cell::CellRef;

/// Whether a variable depends only on the instance's input spec (`Static`, resolved once at
/// construction) or on one or more resolved sibling resources (`Dynamic`, resolved by the
/// fixed-point loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Static,
    Dynamic,
}

/// A variable as declared by the graph builder: ⟨field-path, expressions, dependencies, kind⟩.
///
/// `expressions` is almost always singleton; more than one entry describes interpolated
/// segments that share one field path (§3).
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub field_path: String,
    pub expressions: Vec<String>,
    pub dependencies: Vec<String>,
    pub kind: VariableKind,
}

impl VariableSpec {
    pub fn static_var(field_path: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            expressions: vec![expression.into()],
            dependencies: Vec::new(),
            kind: VariableKind::Static,
        }
    }

    pub fn dynamic_var(
        field_path: impl Into<String>,
        expression: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            expressions: vec![expression.into()],
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            kind: VariableKind::Dynamic,
        }
    }
}

/// A variable as tracked internally: the same field path, but each expression string has
/// been deduplicated into a shared [`CellRef`] from the expression cache (I2). Resolving the
/// cell through any other resource that happens to share the same expression string resolves
/// it here too.
#[derive(Debug, Clone)]
pub struct RuntimeVariable {
    pub field_path: String,
    pub cells: Vec<CellRef>,
}

impl RuntimeVariable {
    /// Whether every cell backing this variable is resolved.
    pub fn is_resolved(&self) -> bool {
        self.cells.iter().all(|cell| cell.borrow().is_resolved())
    }
}
