//! The shared evaluation cell: the one mutable thing in this crate.
//!
//! The cache and every resource's variable list share cell identities (§9 "cell aliasing"):
//! resolving a cell through one path must be visible through all the others. That rules out
//! copy-on-assign value types; we use `Rc<RefCell<Cell>>` ("handle types, arena indices, or
//! mutable shared ownership" per the design note) since a runtime has exactly one owner at a
//! time (§5) and never crosses a thread boundary on its own.

use std::cell::RefCell;
use std::rc::Rc;

use crate::variable::VariableKind;

/// A single shared evaluation record for one distinct expression string.
///
/// Transitions exactly once: `resolved = false → true` with `value` set (P2, monotonicity).
/// Nothing in this crate mutates a cell after `resolved` is `true`.
#[derive(Debug)]
pub struct Cell {
    pub expression: String,
    pub dependencies: Vec<String>,
    pub kind: VariableKind,
    resolved: bool,
    value: Option<serde_json::Value>,
}

impl Cell {
    pub fn new(expression: String, dependencies: Vec<String>, kind: VariableKind) -> Self {
        Self {
            expression,
            dependencies,
            kind,
            resolved: false,
            value: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }

    /// Marks the cell resolved with `value`. Panics if called twice — that would violate
    /// monotonicity and indicates a bug in one of the evaluators, not a recoverable runtime
    /// condition.
    pub fn resolve(&mut self, value: serde_json::Value) {
        assert!(
            !self.resolved,
            "internal error: attempted to re-resolve cell for expression \"{}\"",
            self.expression
        );
        self.value = Some(value);
        self.resolved = true;
    }

    /// Whether every name in `dependencies` is present in `known`. An empty dependency list
    /// is always satisfied (e.g. a dynamic variable whose expression reads only other
    /// already-resolved dynamic cells via interpolation, rather than a sibling resource).
    pub fn dependencies_satisfied(&self, known: &dyn Fn(&str) -> bool) -> bool {
        self.dependencies.iter().all(|name| known(name))
    }
}

/// A shared handle into the cache. Cloning is cheap (reference-count bump); cloning does not
/// duplicate the underlying cell.
pub type CellRef = Rc<RefCell<Cell>>;

pub fn new_cell_ref(expression: String, dependencies: Vec<String>, kind: VariableKind) -> CellRef {
    Rc::new(RefCell::new(Cell::new(expression, dependencies, kind)))
}
