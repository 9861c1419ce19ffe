//! Read-only hierarchy queries over a built [`Forest`].
//!
//! - Which nodes lie on the path from a root to a given category?
//! - What is the full subtree of a given category?
//! - Which categories may become the parent of the one being edited?
//! - Which rows are visible given the current expansion state?
//!
//! All walks are iterative; none of them allocate per-node beyond the
//! returned collections.

#![allow(clippy::module_name_repetitions)]

use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use super::builder::{Forest, TreeNode};
use crate::expansion::ExpansionState;
use crate::model::category::Category;

/// A render-ready row: one visible node with its indentation depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRow {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Root-first chain of nodes ending at `id` itself.
///
/// Returns `None` if `id` is not in the forest.
#[must_use]
pub fn path_to<'a>(forest: &'a Forest, id: &str) -> Option<Vec<&'a TreeNode>> {
    let mut path: Vec<&TreeNode> = Vec::new();
    for (depth, node) in forest {
        path.truncate(depth);
        path.push(node);
        if node.id() == id {
            return Some(path);
        }
    }
    None
}

/// Ancestors of `id`, from immediate parent up to the root.
///
/// Empty for roots and for ids not in the forest.
#[must_use]
pub fn ancestors<'a>(forest: &'a Forest, id: &str) -> Vec<&'a TreeNode> {
    let Some(mut path) = path_to(forest, id) else {
        return Vec::new();
    };
    path.pop();
    path.reverse();
    path
}

/// Depth of `id` (roots are 0).
#[must_use]
pub fn depth_of(forest: &Forest, id: &str) -> Option<usize> {
    forest
        .iter()
        .find_map(|(depth, node)| (node.id() == id).then_some(depth))
}

/// Ids of every node in the subtree rooted at `id`, including `id`.
///
/// Breadth-first order. Empty if `id` is not in the forest.
#[must_use]
pub fn subtree_ids(forest: &Forest, id: &str) -> Vec<String> {
    let Some(root) = forest.find(id) else {
        return Vec::new();
    };

    let mut result = Vec::new();
    let mut queue: VecDeque<&TreeNode> = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        result.push(node.id().to_string());
        queue.extend(node.children.iter());
    }
    result
}

/// Categories that may be offered as the new parent of `editing`.
///
/// Excludes `editing` itself and everything beneath it, since either choice
/// would close a loop. With `editing == None` (a create form) every category
/// is a candidate. Entries are `(depth, category)` in pre-order so a caller
/// can indent them.
#[must_use]
pub fn parent_candidates<'a>(
    forest: &'a Forest,
    editing: Option<&str>,
) -> Vec<(usize, &'a Category)> {
    let excluded: HashSet<String> = editing
        .map(|id| subtree_ids(forest, id).into_iter().collect())
        .unwrap_or_default();

    forest
        .iter()
        .filter(|(_, node)| !excluded.contains(node.id()) && Some(node.id()) != editing)
        .map(|(depth, node)| (depth, &node.category))
        .collect()
}

/// Flatten the forest into the rows a tree view would draw.
///
/// Roots are always visible; a node's children are visible only when the
/// node is open and the node itself is visible.
#[must_use]
pub fn visible_rows(forest: &Forest, expansion: &ExpansionState) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(usize, &TreeNode)> = forest.roots().iter().rev().map(|n| (0, n)).collect();

    while let Some((depth, node)) = stack.pop() {
        let expanded = expansion.is_open(node.id());
        rows.push(VisibleRow {
            id: node.id().to_string(),
            name: node.name().to_string(),
            description: node.category.description.clone(),
            depth,
            has_children: node.has_children(),
            expanded,
        });
        if expanded {
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
