//! Cycle breaking for parent references.
//!
//! # Overview
//!
//! The store only guarantees that a record does not name itself as parent.
//! Longer loops (A→B→A) can still arrive, e.g. after two concurrent moves.
//! Linking such a list naively leaves every member of the loop unreachable
//! from any root, so the members would silently vanish from the tree.
//!
//! # Policy
//!
//! In each parent cycle, the member that appears **first in the input list**
//! is promoted to root; the rest of the cycle hangs beneath it. Records that
//! merely lead into a loop keep their parent.
//!
//! # Complexity
//!
//! O(n): every record is pushed onto a walk path at most once.

#![allow(clippy::module_name_repetitions)]

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the current walk path.
    Gray,
    /// Chain is known to end at a root.
    Black,
}

/// Break every cycle in a resolved parent table.
///
/// `parents[i]` is the input index of record `i`'s parent, or `None` for a
/// root. Cycle members chosen for promotion have their entry cleared.
///
/// Returns the promoted indices in detection order.
pub fn break_parent_cycles(parents: &mut [Option<usize>]) -> Vec<usize> {
    let mut color = vec![Color::White; parents.len()];
    let mut promoted = Vec::new();
    let mut path: Vec<usize> = Vec::new();

    for start in 0..parents.len() {
        if color[start] != Color::White {
            continue;
        }

        path.clear();
        let mut current = Some(start);
        while let Some(i) = current {
            match color[i] {
                Color::Black => break,
                Color::Gray => {
                    // `i` is on the current path: path[pos..] is the loop.
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        if let Some(&first) = path[pos..].iter().min() {
                            parents[first] = None;
                            promoted.push(first);
                        }
                    }
                    break;
                }
                Color::White => {
                    color[i] = Color::Gray;
                    path.push(i);
                    current = parents[i];
                }
            }
        }

        for &i in &path {
            color[i] = Color::Black;
        }
    }

    promoted
}

/// Returns `true` if following parents from `start` ever revisits a record.
#[cfg(test)]
fn has_cycle_from(parents: &[Option<usize>], start: usize) -> bool {
    let mut seen = vec![false; parents.len()];
    let mut current = Some(start);
    while let Some(i) = current {
        if std::mem::replace(&mut seen[i], true) {
            return true;
        }
        current = parents[i];
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_acyclic(parents: &[Option<usize>]) {
        for i in 0..parents.len() {
            assert!(!has_cycle_from(parents, i), "cycle remains from {i}: {parents:?}");
        }
    }

    #[test]
    fn acyclic_table_is_untouched() {
        let mut parents = vec![None, Some(0), Some(0), Some(1)];
        let before = parents.clone();
        assert!(break_parent_cycles(&mut parents).is_empty());
        assert_eq!(parents, before);
    }

    #[test]
    fn empty_table() {
        let mut parents: Vec<Option<usize>> = Vec::new();
        assert!(break_parent_cycles(&mut parents).is_empty());
    }

    #[test]
    fn self_loop_is_promoted() {
        let mut parents = vec![Some(0)];
        assert_eq!(break_parent_cycles(&mut parents), vec![0]);
        assert_eq!(parents, vec![None]);
    }

    #[test]
    fn two_cycle_promotes_first_in_input() {
        // 0 → 1 → 0
        let mut parents = vec![Some(1), Some(0)];
        assert_eq!(break_parent_cycles(&mut parents), vec![0]);
        assert_eq!(parents, vec![None, Some(0)]);
    }

    #[test]
    fn promotion_does_not_depend_on_walk_start() {
        // 0 is a tail hanging off the 1 → 2 → 1 loop; the loop's first
        // member (1) is promoted even though the walk enters at 0.
        let mut parents = vec![Some(1), Some(2), Some(1)];
        assert_eq!(break_parent_cycles(&mut parents), vec![1]);
        assert_eq!(parents, vec![Some(1), None, Some(1)]);
    }

    #[test]
    fn three_cycle_entered_mid_loop() {
        // 0 → 2, 1 → 0, 2 → 1 : loop 0 → 2 → 1 → 0
        let mut parents = vec![Some(2), Some(0), Some(1)];
        assert_eq!(break_parent_cycles(&mut parents), vec![0]);
        assert_eq!(parents, vec![None, Some(0), Some(1)]);
        assert_acyclic(&parents);
    }

    #[test]
    fn disjoint_cycles_each_broken_once() {
        // loop A: 0 ↔ 3, loop B: 1 → 2 → 4 → 1, plus root 5
        let mut parents = vec![Some(3), Some(2), Some(4), Some(0), Some(1), None];
        let mut promoted = break_parent_cycles(&mut parents);
        promoted.sort_unstable();
        assert_eq!(promoted, vec![0, 1]);
        assert_acyclic(&parents);
        assert_eq!(parents[5], None);
    }

    #[test]
    fn long_chain_without_cycle() {
        let n = 10_000;
        let mut parents: Vec<Option<usize>> =
            (0..n).map(|i| if i == 0 { None } else { Some(i - 1) }).collect();
        assert!(break_parent_cycles(&mut parents).is_empty());
        assert_eq!(parents[n - 1], Some(n - 2));
    }

    #[test]
    fn has_cycle_from_detects_loop() {
        assert!(has_cycle_from(&[Some(1), Some(0)], 0));
        assert!(!has_cycle_from(&[None, Some(0)], 1));
    }
}
