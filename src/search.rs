//! Synchronous radius search.
//!
//! Breadth-first walk from the root. For a node at distance `d` from the query,
//! only the children whose edge key `k` satisfies `d - r <= k <= d + r` can hold
//! an element within radius `r` (triangle inequality), every other subtree is
//! skipped without a single distance computation.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use tracing::{debug, instrument, trace};

use crate::errors::{TreeError, TreeResult};
use crate::metric::{Distance, MetricElement};
use crate::node::TreeNode;
use crate::tree::Tree;

/// Result of a radius search on a non-empty tree.
#[derive(Debug, Clone)]
pub struct SearchHits<'a, T> {
    /// Matching elements, breadth-first with children in ascending distance order.
    pub matches: Vec<&'a T>,
    /// Distance computations performed, at least 1.
    pub comparisons: usize,
}

impl<'a, T> SearchHits<'a, T> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// Edge keys that may lead to elements within `radius` of a node at `distance`.
pub(crate) fn edge_window(distance: Distance, radius: Distance) -> RangeInclusive<Distance> {
    distance.saturating_sub(radius)..=distance.saturating_add(radius)
}

/// Children of `node` that survive pruning.
pub(crate) fn candidates<T>(
    node: &TreeNode<T>,
    distance: Distance,
    radius: Distance,
) -> impl Iterator<Item = &TreeNode<T>> {
    node.children()
        .range(edge_window(distance, radius))
        .map(|(_, child)| child)
}

impl<T: MetricElement> Tree<T> {
    /// All stored elements within `radius` of `value`.
    ///
    /// Fails with [`TreeError::EmptyTree`] if nothing was ever added; a
    /// non-empty tree without matches yields empty [`SearchHits`].
    #[instrument(level = "debug", skip(self, value))]
    pub fn search(&self, value: &T, radius: Distance) -> TreeResult<SearchHits<'_, T>> {
        let root = self.root().ok_or(TreeError::EmptyTree)?;

        let mut queue = VecDeque::new();
        queue.push_back(root);
        let mut matches = Vec::new();
        let mut comparisons = 0;

        while let Some(node) = queue.pop_front() {
            let dist = node.value().distance_to(value);
            comparisons += 1;
            trace!(dist, "visited");
            if dist <= radius {
                matches.push(node.value());
            }
            queue.extend(candidates(node, dist, radius));
        }

        debug!(matches = matches.len(), comparisons, "search done");
        Ok(SearchHits {
            matches,
            comparisons,
        })
    }

    /// True if an element at distance 0 from `value` is stored.
    pub fn contains(&self, value: &T) -> bool {
        self.search(value, 0).is_ok_and(|hits| !hits.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{Point, Word};
    use rstest::rstest;

    #[rstest]
    #[case(5, 2, 3..=7)]
    #[case(1, 3, 0..=4)]
    #[case(0, 0, 0..=0)]
    #[case(Distance::MAX, 1, Distance::MAX - 1..=Distance::MAX)]
    fn test_edge_window(
        #[case] distance: Distance,
        #[case] radius: Distance,
        #[case] expected: RangeInclusive<Distance>,
    ) {
        assert_eq!(edge_window(distance, radius), expected);
    }

    #[test]
    fn test_candidates_prune_out_of_window_edges() {
        let mut root = TreeNode::new(Point(0));
        for k in 1..=6 {
            root.attach_child(k, Point(k as i32)).unwrap();
        }
        let kept: Vec<i32> = candidates(&root, 4, 1).map(|c| c.value().0).collect();
        assert_eq!(kept, vec![3, 4, 5]);
    }

    #[test]
    fn test_search_empty_tree_is_error() {
        let tree: Tree<Word> = Tree::new();
        let err = tree.search(&Word::from("x"), 3).unwrap_err();
        assert!(matches!(err, TreeError::EmptyTree));
        assert!(!tree.contains(&Word::from("x")));
    }

    #[test]
    fn test_search_without_matches_is_empty_hits() {
        let tree: Tree<Point> = [0, 10, 20].into_iter().map(Point).collect();
        let hits = tree.search(&Point(100), 5).unwrap();
        assert!(hits.is_empty());
        assert!(hits.comparisons >= 1);
    }

    #[test]
    fn test_contains() {
        let tree: Tree<Word> = ["book", "back", "cook"].into_iter().map(Word::from).collect();
        assert!(tree.contains(&Word::from("cook")));
        assert!(!tree.contains(&Word::from("cake")));
    }
}
