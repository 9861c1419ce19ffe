//! Which subtrees are open.
//!
//! The set is keyed by category id and knows nothing about tree shape, so it
//! survives rebuilds for as long as the ids do. Entries for categories that
//! no longer exist are never pruned; they simply match no node.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::tree::builder::Forest;
use crate::tree::query;

/// A set of open category ids.
///
/// Serializes as a sorted JSON array so callers can persist it between
/// sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionState {
    open: BTreeSet<String>,
}

impl ExpansionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `id` between open and closed. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.open.remove(id) {
            false
        } else {
            self.open.insert(id.to_string());
            true
        }
    }

    #[must_use]
    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    /// Open `id`. Returns `false` if it was already open.
    pub fn expand(&mut self, id: &str) -> bool {
        self.open.insert(id.to_string())
    }

    /// Close `id`. Returns `false` if it was already closed.
    pub fn collapse(&mut self, id: &str) -> bool {
        self.open.remove(id)
    }

    /// Open every node in `forest` that has children.
    pub fn expand_all(&mut self, forest: &Forest) {
        self.open.extend(
            forest
                .iter()
                .filter(|(_, node)| node.has_children())
                .map(|(_, node)| node.id().to_string()),
        );
    }

    pub fn collapse_all(&mut self) {
        self.open.clear();
    }

    /// Open every ancestor of `id` so the node itself becomes visible.
    ///
    /// Returns `false` if `id` is not in `forest`.
    pub fn reveal(&mut self, forest: &Forest, id: &str) -> bool {
        let Some(path) = query::path_to(forest, id) else {
            return false;
        };
        for ancestor in &path[..path.len() - 1] {
            self.open.insert(ancestor.id().to_string());
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            open: iter.into_iter().map(Into::into).collect(),
        }
    }
}
