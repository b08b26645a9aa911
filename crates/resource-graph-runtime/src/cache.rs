//! The expression cache: a content-addressed store mapping an expression string to a
//! single shared evaluation cell. Guarantees at-most-once evaluation per distinct
//! expression, regardless of how many resources reference it (P1, deduplication).

use indexmap::IndexMap;

use crate::cell::{new_cell_ref, CellRef};
use crate::variable::VariableKind;

/// The authoritative store for evaluation cells.
///
/// Uses an [`IndexMap`] rather than a [`std::collections::HashMap`] purely so cell iteration
/// order is deterministic across runs — the evaluation order among cells is unspecified by
/// the algorithm (§5) and callers must not rely on it, but deterministic iteration keeps test
/// failures reproducible instead of flaky.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    cells: IndexMap<String, CellRef>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing cell for `expression` if one exists, otherwise creates and
    /// inserts a new one. This is the sole place new cells are born; after construction the
    /// cache never grows (cells already in it cover every expression any variable names).
    pub fn get_or_insert(
        &mut self,
        expression: &str,
        dependencies: &[String],
        kind: VariableKind,
    ) -> CellRef {
        if let Some(existing) = self.cells.get(expression) {
            return existing.clone();
        }

        let cell = new_cell_ref(expression.to_string(), dependencies.to_vec(), kind);
        self.cells.insert(expression.to_string(), cell.clone());
        cell
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRef> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every cell in the cache is resolved (I4, used by `Synchronize`'s quiescence
    /// check).
    pub fn all_resolved(&self) -> bool {
        self.cells.values().all(|cell| cell.borrow().is_resolved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_identical_expressions() {
        let mut cache = ExpressionCache::new();
        let a = cache.get_or_insert("spec.name", &[], VariableKind::Static);
        let b = cache.get_or_insert("spec.name", &[], VariableKind::Static);

        assert!(std::rc::Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_expressions_get_distinct_cells() {
        let mut cache = ExpressionCache::new();
        let a = cache.get_or_insert("spec.name", &[], VariableKind::Static);
        let b = cache.get_or_insert("spec.replicas", &[], VariableKind::Static);

        assert!(!std::rc::Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }
}
