use std::collections::btree_map::Entry;
use std::collections::VecDeque;

use tracing::{debug, instrument, trace};

use crate::metric::MetricElement;
use crate::node::TreeNode;

/// Where [`Tree::add`] put a value.
///
/// Depths count edges from the root, the root itself is at depth 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The tree was empty and the value became the root.
    Root,
    /// A new leaf was created.
    Inserted { depth: usize },
    /// A node at distance 0 was met while descending; nothing was stored.
    Duplicate { depth: usize },
}

impl InsertOutcome {
    pub fn is_new(&self) -> bool {
        !matches!(self, InsertOutcome::Duplicate { .. })
    }
}

/// BK-tree over a caller-supplied metric.
///
/// Single writer: `add` needs `&mut self`, so concurrent writers have to be
/// serialized by the owner (e.g. behind a `Mutex`). Searches only borrow.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    root: Option<TreeNode<T>>,
    size: usize,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self {
            root: None,
            size: 0,
        }
    }

    pub fn root(&self) -> Option<&TreeNode<T>> {
        self.root.as_ref()
    }

    /// Mutable access to the root for manual restructuring.
    ///
    /// Changes made through here are not reflected in [`Tree::len`] until
    /// [`Tree::calculate_size`] is called.
    pub fn root_mut(&mut self) -> Option<&mut TreeNode<T>> {
        self.root.as_mut()
    }

    /// Number of stored elements as tracked by [`Tree::add`].
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Recounts all nodes, stores and returns the result.
    #[instrument(level = "debug", skip(self))]
    pub fn calculate_size(&mut self) -> usize {
        let counted = self.root.as_ref().map_or(0, TreeNode::size);
        if counted != self.size {
            debug!(tracked = self.size, counted, "size reconciled");
        }
        self.size = counted;
        counted
    }

    /// Number of levels, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    /// Breadth-first iterator over the stored elements, children in
    /// ascending distance order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }
}

impl<T: MetricElement> Tree<T> {
    /// Inserts `value`, descending by its distance to each visited node.
    ///
    /// The descent stops without storing anything as soon as any node on the
    /// path is at distance 0 from `value`. With a true metric that node is equal
    /// to `value`; with a pseudo-metric the value is dropped even though the
    /// slot it would route to might still be free below.
    #[instrument(level = "debug", skip(self, value))]
    pub fn add(&mut self, value: T) -> InsertOutcome {
        let Some(mut current) = self.root.as_mut() else {
            self.root = Some(TreeNode::new(value));
            self.size = 1;
            debug!("added root");
            return InsertOutcome::Root;
        };

        let mut depth = 0;
        loop {
            let dist = current.value().distance_to(&value);
            if dist == 0 {
                debug!(depth, "duplicate, insertion skipped");
                return InsertOutcome::Duplicate { depth };
            }
            depth += 1;
            match current.slot(dist) {
                Entry::Vacant(slot) => {
                    slot.insert(TreeNode::new(value));
                    self.size += 1;
                    debug!(depth, dist, "added node");
                    return InsertOutcome::Inserted { depth };
                }
                Entry::Occupied(slot) => {
                    trace!(dist, "descending");
                    current = slot.into_mut();
                }
            }
        }
    }
}

impl<T: MetricElement> FromIterator<T> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(iter);
        tree
    }
}

impl<T: MetricElement> Extend<T> for Tree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

pub struct Iter<'a, T> {
    queue: VecDeque<&'a TreeNode<T>>,
}

impl<'a, T> Iter<'a, T> {
    fn new(tree: &'a Tree<T>) -> Self {
        let mut queue = VecDeque::new();
        if let Some(root) = tree.root() {
            queue.push_back(root);
        }
        Self { queue }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.children().values());
        Some(node.value())
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
