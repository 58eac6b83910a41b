use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::instrument;

use crate::errors::{TreeError, TreeResult};
use crate::metric::Distance;

/// One indexed element plus the subtrees keyed by their distance to it.
///
/// Every node exclusively owns its children, so the structure is a strict tree.
/// The element never changes after construction; only the children map grows.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    value: T,
    children: BTreeMap<Distance, TreeNode<T>>,
}

impl<T> TreeNode<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            children: BTreeMap::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Children in ascending distance order.
    pub fn children(&self) -> &BTreeMap<Distance, TreeNode<T>> {
        &self.children
    }

    pub fn child(&self, distance: Distance) -> Option<&TreeNode<T>> {
        self.children.get(&distance)
    }

    pub fn child_mut(&mut self, distance: Distance) -> Option<&mut TreeNode<T>> {
        self.children.get_mut(&distance)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, this node included.
    ///
    /// Walks the whole subtree; only meant for reconciling the tree's counter.
    pub fn size(&self) -> usize {
        if self.children.is_empty() {
            return 1;
        }
        1 + self.children.values().map(TreeNode::size).sum::<usize>()
    }

    /// Number of levels in this subtree, a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .values()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Hangs `value` under this node at `distance` without consulting the metric.
    ///
    /// This bypasses the tree's element counter; call
    /// [`crate::Tree::calculate_size`] afterwards. The caller is responsible for
    /// `distance` being the real distance, otherwise searches may miss the new node.
    #[instrument(level = "trace", skip(self, value))]
    pub fn attach_child(&mut self, distance: Distance, value: T) -> TreeResult<&mut TreeNode<T>> {
        match self.children.entry(distance) {
            Entry::Occupied(_) => Err(TreeError::OccupiedSlot(distance)),
            Entry::Vacant(slot) => Ok(slot.insert(TreeNode::new(value))),
        }
    }

    pub(crate) fn slot(&mut self, distance: Distance) -> Entry<'_, Distance, TreeNode<T>> {
        self.children.entry(distance)
    }
}
