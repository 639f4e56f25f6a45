//! Append-only arena used for evidence, disproof attempts and audit steps.

use serde::{Deserialize, Serialize};

/// A growing, index-addressable log.
///
/// Entries can be appended and read but never edited, reordered or removed:
/// the type exposes no `&mut` access to stored items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger<T> {
    entries: Vec<T>,
}

impl<T> Ledger<T> {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry and return its index.
    pub fn append(&mut self, entry: T) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Entry at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// Most recently appended entry.
    pub fn last(&self) -> Option<&T> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Read-only view of all entries.
    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a Ledger<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T> From<Vec<T>> for Ledger<T> {
    fn from(entries: Vec<T>) -> Self {
        Self { entries }
    }
}
