//! The flat, ordered content sequence and its canonical wire form.

use crate::node::BlockNode;
use serde::{Deserialize, Serialize};

/// An ordered sequence of block nodes.
///
/// A `ContentModel` represents either one page's visible fragment or the
/// full canonical document (all pages' nodes concatenated in reading
/// order). The wire form is exactly an ordered JSON array of nodes — this
/// is the format the persistence gateway stores and returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentModel {
    nodes: Vec<BlockNode>,
}

impl ContentModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<BlockNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[BlockNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: BlockNode) {
        self.nodes.push(node);
    }

    pub fn insert(&mut self, index: usize, node: BlockNode) {
        self.nodes.insert(index, node);
    }

    pub fn remove(&mut self, index: usize) -> BlockNode {
        self.nodes.remove(index)
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = BlockNode>) {
        self.nodes.extend(nodes);
    }

    /// Split off the tail starting at `index`, leaving `[0, index)` behind.
    pub fn split_off(&mut self, index: usize) -> Vec<BlockNode> {
        self.nodes.split_off(index)
    }

    /// Prepend nodes ahead of the existing sequence, preserving their order.
    pub fn prepend(&mut self, nodes: Vec<BlockNode>) {
        let mut merged = nodes;
        merged.append(&mut self.nodes);
        self.nodes = merged;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockNode> {
        self.nodes.iter()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BlockNode> {
        self.nodes.get_mut(index)
    }

    pub fn last_mut(&mut self) -> Option<&mut BlockNode> {
        self.nodes.last_mut()
    }

    /// Serialize to the canonical wire form (ordered JSON array).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the canonical wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl IntoIterator for ContentModel {
    type Item = BlockNode;
    type IntoIter = std::vec::IntoIter<BlockNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl FromIterator<BlockNode> for ContentModel {
    fn from_iter<I: IntoIterator<Item = BlockNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
