//! Keyed children differ.
//!
//! Compares two ordered identity lists. Identities present on both sides are
//! kept; among those, the ones forming a longest increasing subsequence of
//! their previous indices stay where they are and every other kept identity
//! is moved. Placing moved and added identities left to right, each right
//! after its predecessor, turns the previous order into the next one.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenDiff<T> {
    /// In next order.
    pub added: Vec<T>,
    /// In previous order.
    pub removed: Vec<T>,
    /// Kept identities that must be repositioned, in next order.
    pub moved: Vec<T>,
}

impl<T: Eq + Hash> ChildrenDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }
}

pub fn diff_children<T: Eq + Hash + Clone>(prev: &[T], next: &[T]) -> ChildrenDiff<T> {
    let prev_index: HashMap<&T, usize> = prev.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let next_ids: HashSet<&T> = next.iter().collect();

    let removed = prev.iter().filter(|id| !next_ids.contains(id)).cloned().collect();

    let mut added = Vec::new();
    let mut kept = Vec::new();
    for id in next {
        match prev_index.get(id) {
            Some(index) => kept.push((id, *index)),
            None => added.push(id.clone()),
        }
    }

    let indices: Vec<usize> = kept.iter().map(|(_, index)| *index).collect();
    let stable: HashSet<usize> = longest_increasing_subsequence(&indices).into_iter().collect();
    let moved = kept
        .iter()
        .enumerate()
        .filter(|(position, _)| !stable.contains(position))
        .map(|(_, (id, _))| (*id).clone())
        .collect();

    ChildrenDiff { added, removed, moved }
}

/// Positions (into `seq`) of one longest strictly increasing subsequence.
pub fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&tail| seq[tail] < *value);
        if slot > 0 {
            predecessor[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = predecessor[i];
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lis() {
        assert_eq!(longest_increasing_subsequence(&[]), Vec::<usize>::new());
        assert_eq!(longest_increasing_subsequence(&[0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(longest_increasing_subsequence(&[2, 0, 1]), vec![1, 2]);
        assert_eq!(longest_increasing_subsequence(&[3, 1, 2, 0, 4]).len(), 3);
    }

    #[test]
    fn test_swap_moves_one() {
        let diff = diff_children(&["a", "b"], &["b", "a"]);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.moved.len(), 1);
    }

    #[test]
    fn test_added_and_removed() {
        let diff = diff_children(&["a", "b", "c"], &["a", "d", "c"]);
        assert_eq!(diff.added, vec!["d"]);
        assert_eq!(diff.removed, vec!["b"]);
        assert!(diff.moved.is_empty());
    }

    #[test]
    fn test_unchanged_is_empty() {
        assert!(diff_children(&[1, 2, 3], &[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_rotation_moves_only_the_wrapped_item() {
        let diff = diff_children(&["a", "b", "c", "d"], &["d", "a", "b", "c"]);
        assert_eq!(diff.moved, vec!["d"]);
    }
}
