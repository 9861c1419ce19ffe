//! Flat category list → forest.
//!
//! # Algorithm
//!
//! Two passes over the input, independent of the order in which parents and
//! children appear:
//!
//! 1. Index every id to its input position.
//! 2. Resolve each record's parent through the index. A missing parent
//!    (orphan) or a record naming itself as parent resolves to "root".
//!
//! Parent loops are then broken (see [`super::cycles`]) and the nodes are
//! materialized bottom-up without recursion, so very deep chains are safe.
//! Children keep the relative order of their records in the input.
//!
//! # Duplicate ids
//!
//! Callers must supply unique ids. If they do not, the first occurrence owns
//! the index slot (children attach to it); later duplicates are still placed
//! by their own `parentId` and a warning is logged.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

use super::cycles::break_parent_cycles;
use crate::model::category::Category;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A category plus its children, in input order.
///
/// Nodes are rebuilt wholesale on every fetch and never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.category.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.category.name
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes below this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Self> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Ordered root-level nodes and everything beneath them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<TreeNode>,
    len: usize,
}

impl Forest {
    #[must_use]
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    #[must_use]
    pub fn into_roots(self) -> Vec<TreeNode> {
        self.roots
    }

    /// Total number of nodes at every depth.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pre-order depth-first walk yielding `(depth, node)`; roots are depth 0.
    #[must_use]
    pub fn iter(&self) -> Walk<'_> {
        Walk {
            stack: self.roots.iter().rev().map(|n| (0, n)).collect(),
        }
    }

    /// Find a node anywhere in the forest.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.iter().map(|(_, n)| n).find(|n| n.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}

impl Serialize for Forest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.roots.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = (usize, &'a TreeNode);
    type IntoIter = Walk<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Forest::iter`].
pub struct Walk<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

/// What the builder had to correct while linking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Records whose `parentId` matched no record; promoted to root.
    pub orphans: Vec<String>,
    /// Records naming themselves as parent; promoted to root.
    pub self_parents: Vec<String>,
    /// Ids seen more than once (listed once per extra occurrence).
    pub duplicates: Vec<String>,
    /// Records promoted to root to break a parent loop.
    pub cycle_breaks: Vec<String>,
}

impl BuildReport {
    /// Returns `true` if the input needed no correction.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
            && self.self_parents.is_empty()
            && self.duplicates.is_empty()
            && self.cycle_breaks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build a forest from a flat list.
///
/// Every record appears in exactly one node. See the module docs for the
/// orphan, self-parent, duplicate and cycle rules.
#[must_use]
pub fn build_forest(records: &[Category]) -> Forest {
    build_forest_with_report(records.to_vec()).0
}

/// Build a forest from an owned list and report the corrections made.
#[must_use]
pub fn build_forest_with_report(records: Vec<Category>) -> (Forest, BuildReport) {
    let mut report = BuildReport::default();
    let mut parents = resolve_parents(&records, &mut report);

    for i in break_parent_cycles(&mut parents) {
        let id = &records[i].id;
        warn!(category = %id, "parent loop detected; promoting category to root");
        report.cycle_breaks.push(id.clone());
    }

    let n = records.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    // Pre-order visits each parent before its descendants, so walking it in
    // reverse always finds a node's children already built.
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }

    let mut records: Vec<Option<Category>> = records.into_iter().map(Some).collect();
    let mut built: Vec<Option<TreeNode>> = vec![None; n];
    for &i in order.iter().rev() {
        let Some(category) = records[i].take() else {
            continue;
        };
        let kids = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(TreeNode {
            category,
            children: kids,
        });
    }

    let roots: Vec<TreeNode> = roots.iter().filter_map(|&r| built[r].take()).collect();

    debug!(
        records = n,
        roots = roots.len(),
        orphans = report.orphans.len(),
        "built category forest"
    );

    (Forest { roots, len: order.len() }, report)
}

/// Map each record to the input index of its parent, or `None` for roots.
fn resolve_parents(records: &[Category], report: &mut BuildReport) -> Vec<Option<usize>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (i, category) in records.iter().enumerate() {
        match index.entry(category.id.as_str()) {
            Entry::Occupied(_) => {
                warn!(category = %category.id, "duplicate category id in flat list");
                report.duplicates.push(category.id.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
        }
    }

    records
        .iter()
        .map(|category| {
            let parent_id = category.parent()?;
            if parent_id == category.id {
                report.self_parents.push(category.id.clone());
                return None;
            }
            let parent = index.get(parent_id).copied();
            if parent.is_none() {
                report.orphans.push(category.id.clone());
            }
            parent
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
