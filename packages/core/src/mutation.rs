//! # Document Mutations
//!
//! Every mutation targets nodes by identity and returns the document for
//! chaining. A target that is not part of the document (already removed, or
//! never there) turns the call into a no-op.
//!
//! Content is given as an [`Insertable`]: another document, whose nodes are
//! copied in with their children and pending transformations, or an HTML
//! string, parsed in the target document's mode.

use std::sync::Arc;

use tracing::debug;

use crate::attributes::Attributes;
use crate::document::{Document, Owner};
use crate::labels::LabelValue;
use crate::node::{Node, NodeId};
use crate::parser::{ParseOptions, Parser};

/// Content accepted by the mutation operations.
#[derive(Debug, Clone)]
pub enum Insertable {
    Document(Document),
    Html(String),
}

impl From<Document> for Insertable {
    fn from(document: Document) -> Self {
        Insertable::Document(document)
    }
}

impl From<&Document> for Insertable {
    fn from(document: &Document) -> Self {
        Insertable::Document(document.clone())
    }
}

impl From<&str> for Insertable {
    fn from(html: &str) -> Self {
        Insertable::Html(html.to_string())
    }
}

impl From<String> for Insertable {
    fn from(html: String) -> Self {
        Insertable::Html(html)
    }
}

impl Insertable {
    /// True for a document holding exactly one element at the top level.
    fn is_single_element(&self) -> bool {
        match self {
            Insertable::Document(document) => match document.roots() {
                [root] => document.node(*root).is_some_and(Node::is_element),
                _ => false,
            },
            Insertable::Html(_) => false,
        }
    }
}

impl Document {
    /// Copies `content` into the arena and returns its top-level ids.
    fn import(&mut self, content: Insertable) -> Vec<NodeId> {
        let source = match content {
            Insertable::Document(document) => document,
            Insertable::Html(html) => Parser::new()
                .with_options(ParseOptions {
                    mode: self.mode,
                    ..ParseOptions::default()
                })
                .parse(&html),
        };

        if !source.transforms.document.is_empty() {
            debug!("Document-level transformations are not carried into another document");
        }

        self.import_document(source)
    }

    /// Inserts `ids` into `owner`'s list at `index`.
    fn insert_at(&mut self, owner: Owner, index: usize, ids: Vec<NodeId>) {
        if ids.is_empty() {
            return;
        }

        let inserted = ids.clone();
        let owner = self.edit_children(owner, move |list| {
            let index = index.min(list.len());
            list.splice(index..index, ids);
        });
        self.attach(owner, &inserted);
    }

    /// Replaces the whole child list of `node`.
    fn set_children(&mut self, node: NodeId, ids: Vec<NodeId>) {
        let removed = self.children_of(node).to_vec();
        let inserted = ids.clone();

        let owner = self.edit_children(Owner::Node(node), move |list| *list = ids);
        for child in removed {
            self.purge(child);
        }
        self.attach(owner, &inserted);
    }

    /// Replaces `node` with `content`.
    ///
    /// When `content` is a document holding a single element, that element
    /// takes over the children of `node` unless it has children of its own,
    /// and the pending transformations of `node` unless it has some of its own.
    pub fn replace_node(&mut self, node: NodeId, content: impl Into<Insertable>) -> &mut Self {
        let node = self.resolve(node);
        if !self.contains(node) {
            return self;
        }

        let content = content.into();
        let carry_over = content.is_single_element();
        let ids = self.import(content);

        if let (true, [replacement]) = (carry_over, ids.as_slice()) {
            self.carry_over(node, *replacement);
        }

        if let Some((owner, index)) = self.position(node) {
            let inserted = ids.clone();
            let owner = self.edit_children(owner, move |list| {
                list.splice(index..=index, ids);
            });
            self.purge(node);
            self.attach(owner, &inserted);
        }
        self
    }

    fn carry_over(&mut self, from: NodeId, to: NodeId) {
        if self.children_of(to).is_empty() {
            let children = self.children_of(from).to_vec();
            // Copied, not moved: `from` keeps its list until it is purged.
            if !children.is_empty() {
                Arc::make_mut(&mut self.tree)
                    .children
                    .insert(to, children.clone());
                self.attach(Owner::Node(to), &children);
            }
        }

        if !self.transforms.nodes.contains_key(&to) {
            if let Some(queue) = self.transforms.nodes.remove(&from) {
                self.transforms.nodes.insert(to, queue);
            }
        }

        if !self.transforms.attributes.contains_key(&to) {
            if let Some(queue) = self.transforms.attributes.remove(&from) {
                self.transforms.attributes.insert(to, queue);
            }
        }
    }

    pub fn remove_node(&mut self, node: NodeId) -> &mut Self {
        let node = self.resolve(node);
        if let Some((owner, index)) = self.position(node) {
            self.edit_children(owner, |list| {
                list.remove(index);
            });
            self.purge(node);
        }
        self
    }

    pub fn remove_node_children(&mut self, node: NodeId) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) && !self.children_of(node).is_empty() {
            self.set_children(node, Vec::new());
        }
        self
    }

    pub fn replace_node_children(
        &mut self,
        node: NodeId,
        content: impl Into<Insertable>,
    ) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let ids = self.import(content.into());
            self.set_children(node, ids);
        }
        self
    }

    /// Replaces the children of `node` with `html`, emitted verbatim.
    pub fn set_node_html(&mut self, node: NodeId, html: impl Into<String>) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let literal = self.alloc(Arc::new(Node::literal(html)));
            self.set_children(node, vec![literal]);
        }
        self
    }

    pub fn insert_after_node(&mut self, node: NodeId, content: impl Into<Insertable>) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let ids = self.import(content.into());
            if let Some((owner, index)) = self.position(node) {
                self.insert_at(owner, index + 1, ids);
            }
        }
        self
    }

    pub fn insert_before_node(
        &mut self,
        node: NodeId,
        content: impl Into<Insertable>,
    ) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let ids = self.import(content.into());
            if let Some((owner, index)) = self.position(node) {
                self.insert_at(owner, index, ids);
            }
        }
        self
    }

    pub fn append_to_node(&mut self, node: NodeId, content: impl Into<Insertable>) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let ids = self.import(content.into());
            let end = self.children_of(node).len();
            self.insert_at(Owner::Node(node), end, ids);
        }
        self
    }

    pub fn prepend_to_node(&mut self, node: NodeId, content: impl Into<Insertable>) -> &mut Self {
        let node = self.resolve(node);
        if self.contains(node) {
            let ids = self.import(content.into());
            self.insert_at(Owner::Node(node), 0, ids);
        }
        self
    }

    pub fn set_node_label(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<LabelValue>,
    ) -> &mut Self {
        let (key, value) = (key.into(), value.into());
        self.edit_node(node, move |node| {
            node.labels_mut().set(key, value);
        });
        self
    }

    pub fn delete_node_label(&mut self, node: NodeId, key: &str) -> &mut Self {
        let node = self.resolve(node);
        if self.node(node).is_some_and(|value| value.is_labeled(key)) {
            self.edit_node(node, |node| {
                node.labels_mut().delete(key);
            });
        }
        self
    }

    pub fn set_node_attribute(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let (key, value) = (key.into(), value.into());
        self.edit_node(node, move |node| {
            node.attributes_mut().set(key, value);
        });
        self
    }

    pub fn delete_node_attribute(&mut self, node: NodeId, key: &str) -> &mut Self {
        let node = self.resolve(node);
        if self
            .node(node)
            .is_some_and(|value| value.attributes().contains(key))
        {
            self.edit_node(node, |node| {
                node.attributes_mut().delete(key);
            });
        }
        self
    }

    pub fn replace_node_attributes(&mut self, node: NodeId, attributes: Attributes) -> &mut Self {
        self.edit_node(node, move |node| {
            *node.attributes_mut() = attributes;
        });
        self
    }

    /// Removes every top-level node.
    pub fn clear(&mut self) -> &mut Self {
        let roots = self.roots().to_vec();
        self.edit_children(Owner::Root, |list| list.clear());
        for root in roots {
            self.purge(root);
        }
        self.collapsed = None;
        self
    }

    /// Replaces everything in the document with `content`.
    pub fn replace(&mut self, content: impl Into<Insertable>) -> &mut Self {
        self.clear().append(content)
    }

    pub fn append(&mut self, content: impl Into<Insertable>) -> &mut Self {
        let ids = self.import(content.into());
        self.expand_collapsed();
        let end = self.roots().len();
        self.insert_at(Owner::Root, end, ids);
        self
    }

    pub fn prepend(&mut self, content: impl Into<Insertable>) -> &mut Self {
        let ids = self.import(content.into());
        self.expand_collapsed();
        self.insert_at(Owner::Root, 0, ids);
        self
    }

    /// Turns a collapsed document back into a single literal node so more
    /// content can be placed around it.
    fn expand_collapsed(&mut self) {
        if let Some(html) = self.collapsed.take() {
            let literal = self.alloc(Arc::new(Node::literal(html)));
            self.insert_at(Owner::Root, 0, vec![literal]);
        }
    }
}
