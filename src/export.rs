//! Write-only snapshots of a tree.
//!
//! Every node becomes the pair `[description, {distance: node, ...}]`. In JSON
//! the distance keys end up as object keys, i.e. strings:
//!
//! ```text
//! ["book", {"1": ["books", {}], "4": ["cake", {}]}]
//! ```
//!
//! Nothing reads this format back into a [`Tree`].

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeTuple, Serializer};
use termtree::Tree as TextTree;
use tracing::instrument;

use crate::errors::{TreeError, TreeResult};
use crate::metric::{Distance, MetricElement};
use crate::node::TreeNode;
use crate::tree::Tree;

/// Owned, serializable image of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNode {
    pub description: String,
    pub children: BTreeMap<Distance, ExportNode>,
}

impl ExportNode {
    fn from_node<T: MetricElement>(node: &TreeNode<T>) -> Self {
        Self {
            description: node.value().describe(),
            children: node
                .children()
                .iter()
                .map(|(dist, child)| (*dist, ExportNode::from_node(child)))
                .collect(),
        }
    }
}

impl Serialize for ExportNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.description)?;
        pair.serialize_element(&self.children)?;
        pair.end()
    }
}

impl<T: MetricElement> Tree<T> {
    #[instrument(level = "debug", skip(self))]
    pub fn export(&self) -> TreeResult<ExportNode> {
        self.root()
            .map(ExportNode::from_node)
            .ok_or(TreeError::EmptyTree)
    }

    pub fn to_json(&self) -> TreeResult<String> {
        Ok(serde_json::to_string(&self.export()?)?)
    }

    pub fn to_json_pretty(&self) -> TreeResult<String> {
        Ok(serde_json::to_string_pretty(&self.export()?)?)
    }

    /// Indented text rendering, each child labelled with its edge distance.
    pub fn to_text_tree(&self) -> TreeResult<TextTree<String>> {
        let root = self.root().ok_or(TreeError::EmptyTree)?;

        fn build<T: MetricElement>(node: &TreeNode<T>, label: String) -> TextTree<String> {
            let leaves: Vec<_> = node
                .children()
                .iter()
                .map(|(dist, child)| build(child, format!("[{}] {}", dist, child.value().describe())))
                .collect();
            TextTree::new(label).with_leaves(leaves)
        }

        Ok(build(root, root.value().describe()))
    }
}
