//! Document traversal.
//!
//! Everything walks attached nodes depth-first in document order. The
//! `_without_descending` variants do not look inside a node once it matched,
//! so an outer binding is found without its identically named inner copies.

use crate::document::Document;
use crate::node::{Node, NodeId};

/// Depth-first pre-order walk over attached nodes.
pub struct Walk<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
    /// Matches are yielded without their subtrees being visited.
    stop_at: Option<&'a str>,
}

impl<'a> Walk<'a> {
    fn new(document: &'a Document, start: &[NodeId], stop_at: Option<&'a str>) -> Self {
        Self {
            document,
            stack: start.iter().rev().copied().collect(),
            stop_at,
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;

        let stop = match (self.stop_at, self.document.node(id)) {
            (Some(significance), Some(node)) => node.is_significant(significance),
            _ => false,
        };

        if !stop {
            self.stack
                .extend(self.document.children_of(id).iter().rev().copied());
        }
        Some(id)
    }
}

fn labeled(node: Option<&Node>, significance: &str, name: &str) -> bool {
    node.and_then(|node| node.label(significance))
        .is_some_and(|label| *label == name)
}

impl Document {
    /// Every attached node, depth-first.
    pub fn each(&self) -> Walk<'_> {
        Walk::new(self, self.roots(), None)
    }

    /// Every node below `node`, depth-first.
    pub fn descendants(&self, node: NodeId) -> Walk<'_> {
        let node = self.resolve(node);
        Walk::new(self, self.children_of(node), None)
    }

    pub fn each_significant_node<'a>(
        &'a self,
        significance: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.each()
            .filter(move |id| self.is_significant_node(*id, significance))
    }

    pub fn each_significant_node_without_descending<'a>(
        &'a self,
        significance: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        Walk::new(self, self.roots(), Some(significance))
            .filter(move |id| self.is_significant_node(*id, significance))
    }

    /// Significant nodes whose `significance` label equals `name`.
    pub fn each_significant_node_with_name<'a>(
        &'a self,
        significance: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.each_significant_node(significance)
            .filter(move |id| labeled(self.node(*id), significance, name))
    }

    pub fn each_significant_node_with_name_without_descending<'a>(
        &'a self,
        significance: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.each_significant_node_without_descending(significance)
            .filter(move |id| labeled(self.node(*id), significance, name))
    }

    pub fn find_first_significant_node(&self, significance: &str) -> Option<NodeId> {
        self.each_significant_node(significance).next()
    }

    pub fn find_first_significant_node_without_descending(
        &self,
        significance: &str,
    ) -> Option<NodeId> {
        self.each_significant_node_without_descending(significance)
            .next()
    }

    pub fn find_significant_nodes(&self, significance: &str) -> Vec<NodeId> {
        self.each_significant_node(significance).collect()
    }

    pub fn find_significant_nodes_without_descending(&self, significance: &str) -> Vec<NodeId> {
        self.each_significant_node_without_descending(significance)
            .collect()
    }

    pub fn find_significant_nodes_with_name(&self, significance: &str, name: &str) -> Vec<NodeId> {
        self.each_significant_node_with_name(significance, name)
            .collect()
    }

    pub fn find_significant_nodes_with_name_without_descending(
        &self,
        significance: &str,
        name: &str,
    ) -> Vec<NodeId> {
        self.each_significant_node_with_name_without_descending(significance, name)
            .collect()
    }

    /// Significant nodes below `node`.
    pub fn significant_descendants<'a>(
        &'a self,
        node: NodeId,
        significance: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(node)
            .filter(move |id| self.is_significant_node(*id, significance))
    }

    pub fn significant_descendants_without_descending<'a>(
        &'a self,
        node: NodeId,
        significance: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        let node = self.resolve(node);
        Walk::new(self, self.children_of(node), Some(significance))
            .filter(move |id| self.is_significant_node(*id, significance))
    }

    fn is_significant_node(&self, id: NodeId, significance: &str) -> bool {
        self.node(id)
            .is_some_and(|node| node.is_significant(significance))
    }
}
