//! Ordered required-column declarations.

use serde::{Deserialize, Serialize};

use crate::column::ColumnKind;

/// An ordered mapping from column name to [`ColumnKind`].
///
/// Declared once per stage at graph-construction time and read-only after the
/// graph starts executing. Insertion order is preserved so that completed
/// frames gain their columns in a deterministic order; re-inserting an
/// existing name updates the kind in place without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredColumns {
    entries: Vec<(String, ColumnKind)>,
}

impl RequiredColumns {
    /// Create an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a column declaration, preserving first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, kind: ColumnKind) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = kind;
        } else {
            self.entries.push((name, kind));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.insert(name, kind);
        self
    }

    /// Look up the declared kind for a column name.
    pub fn get(&self, name: &str) -> Option<ColumnKind> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    /// Iterate declarations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.entries.iter().map(|(n, k)| (n.as_str(), *k))
    }

    /// Number of declared columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no columns are declared. An empty declaration means no
    /// completion step is spliced into the graph at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another declaration into this one, keeping existing positions.
    pub fn extend_from(&mut self, other: &RequiredColumns) {
        for (name, kind) in other.iter() {
            self.insert(name, kind);
        }
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnKind)> for RequiredColumns {
    fn from_iter<T: IntoIterator<Item = (S, ColumnKind)>>(iter: T) -> Self {
        let mut required = Self::new();
        for (name, kind) in iter {
            required.insert(name, kind);
        }
        required
    }
}
