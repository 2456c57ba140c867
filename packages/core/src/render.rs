//! # Rendering
//!
//! Rendering walks the tree once, left to right. Literal nodes are emitted
//! as they are; a node with pending transformations is handed to them first:
//!
//! - [`Transformed::Delete`] emits nothing for the node,
//! - [`Transformed::Raw`] emits the given markup and stops,
//! - [`Transformed::Keep`] / [`Transformed::Replace`] continue with the next
//!   callback, then render the subject normally.
//!
//! A failing callback is passed to the `on_error` handler, whose answer is
//! read the same way. Without a handler the node is dropped.
//!
//! Whatever a drained queue produced is written back into the tree in place
//! of the node: deleted nodes are detached, raw markup becomes a literal and
//! a kept subject is merged back with its ids. Rendering again, or editing
//! and then rendering, starts from that settled tree and runs nothing twice.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::document::{Document, Mode, Owner};
use crate::node::{Node, NodeId};
use crate::transform::{Env, Queue, Transformation, Transformed};

pub type ErrorHandler<'a> =
    &'a (dyn Fn(&anyhow::Error, &Document) -> Transformed + 'a);

/// Options for [`Document::render_with`].
#[derive(Clone, Copy, Default)]
pub struct RenderOptions<'a> {
    context: Option<&'a dyn Any>,
    on_error: Option<ErrorHandler<'a>>,
}

impl std::fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("context", &self.context.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<'a> RenderOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value handed to transformations through [`Env::context`].
    pub fn with_context(mut self, context: &'a dyn Any) -> Self {
        self.context = Some(context);
        self
    }

    /// Decides what a node becomes when one of its transformations fails.
    pub fn on_error(mut self, handler: ErrorHandler<'a>) -> Self {
        self.on_error = Some(handler);
        self
    }

    fn recover(&self, error: &anyhow::Error, subject: &Document) -> Transformed {
        match self.on_error {
            Some(handler) => handler(error, subject),
            None => Transformed::Delete,
        }
    }
}

/// Result of running a node's queue.
enum Outcome {
    Delete,
    Raw(String),
    Render(Document),
}

impl Document {
    /// Renders the document, running every pending transformation.
    pub fn render(&mut self) -> String {
        self.render_with(&RenderOptions::default())
    }

    #[instrument(skip(self, options), fields(mode = ?self.mode, roots = self.tree.roots.len()))]
    pub fn render_with(&mut self, options: &RenderOptions<'_>) -> String {
        let mut output = String::new();
        self.render_into(&mut output, options);
        output
    }

    fn render_into(&mut self, output: &mut String, options: &RenderOptions<'_>) {
        // A document transformation may queue another one on its subject.
        while !self.transforms.document.is_empty() {
            let queue = std::mem::take(&mut self.transforms.document);
            let mut subject = self.share();
            subject.transforms = std::mem::take(&mut self.transforms);

            let outcome = self.run_queue(None, queue, subject, options);
            self.settle_document(outcome);
        }

        if self.tree.roots.is_empty() {
            if let Some(collapsed) = &self.collapsed {
                output.push_str(collapsed);
            }
            return;
        }

        for root in self.tree.roots.clone() {
            self.render_node(root, output, options);
        }
    }

    fn render_node(&mut self, id: NodeId, output: &mut String, options: &RenderOptions<'_>) {
        if !self.transforms.is_pending(id) {
            self.emit_node(id, output, options);
            return;
        }

        let settled = match self.transforms.nodes.remove(&id) {
            Some(queue) => {
                let subject = self.take_subtree(id);
                let outcome = self.run_queue(Some(id), queue, subject, options);
                self.settle(id, outcome)
            }
            None => self.apply_attributes(id, options),
        };

        for id in settled {
            self.render_node(id, output, options);
        }
    }

    fn emit_node(&mut self, id: NodeId, output: &mut String, options: &RenderOptions<'_>) {
        let Some(node) = self.slot(id).cloned() else {
            return;
        };

        output.push_str(node.tag_open_start());
        node.attributes().write_to(output);
        output.push_str(node.tag_open_end());

        for child in self.children_of(id).to_vec() {
            self.render_node(child, output, options);
        }

        output.push_str(node.tag_close());
    }

    /// Runs the attributes queue of `id` and stores the result on the node.
    /// Returns the ids to render in its place.
    fn apply_attributes(&mut self, id: NodeId, options: &RenderOptions<'_>) -> Vec<NodeId> {
        let Some(queue) = self.transforms.attributes.remove(&id) else {
            return vec![id];
        };
        let Some(node) = self.slot(id).cloned() else {
            return Vec::new();
        };

        let mut attributes = node.attributes().clone();
        let mut failed = None;
        {
            let env = Env::new(self, options.context);
            for transformation in queue {
                let Err(error) = transformation(&mut attributes, &env) else {
                    continue;
                };

                warn!(node = %id, error = %error, "Attributes transformation failed");
                match options.recover(&error, &self.extract(id)) {
                    Transformed::Keep => {}
                    Transformed::Delete => failed = Some(Outcome::Delete),
                    Transformed::Raw(raw) => failed = Some(Outcome::Raw(raw)),
                    Transformed::Replace(document) => failed = Some(Outcome::Render(document)),
                }
                if failed.is_some() {
                    break;
                }
            }
        }

        match failed {
            Some(outcome) => self.settle(id, outcome),
            None => vec![self.edit_node(id, move |node| *node.attributes_mut() = attributes)],
        }
    }

    fn run_queue(
        &self,
        node: Option<NodeId>,
        queue: Queue<Transformation>,
        mut subject: Document,
        options: &RenderOptions<'_>,
    ) -> Outcome {
        let env = Env::new(self, options.context);

        for transformation in queue {
            let transformed = match transformation(&mut subject, &env) {
                Ok(transformed) => transformed,
                Err(error) => {
                    match node {
                        Some(node) => warn!(node = %node, error = %error, "Transformation failed"),
                        None => warn!(error = %error, "Document transformation failed"),
                    }
                    options.recover(&error, &subject)
                }
            };

            match transformed {
                Transformed::Delete => return Outcome::Delete,
                Transformed::Raw(raw) => return Outcome::Raw(raw),
                Transformed::Keep => {}
                Transformed::Replace(document) => subject = document,
            }
        }

        Outcome::Render(subject)
    }

    /// Moves the subtree of `id` out into its own document, queues included.
    fn take_subtree(&mut self, id: NodeId) -> Document {
        let subject = self.extract(id);
        self.transforms
            .remove_where(|node| subject.tree.owners.contains_key(&node));
        subject
    }

    /// Writes what the queue of `id` produced into the tree in place of `id`.
    /// Returns the ids now standing there, still to be rendered.
    fn settle(&mut self, id: NodeId, outcome: Outcome) -> Vec<NodeId> {
        let ids = match outcome {
            Outcome::Delete => Vec::new(),
            Outcome::Raw(html) => vec![self.alloc_literal(html)],
            Outcome::Render(document) => return self.adopt(id, document),
        };

        self.splice(id, &ids);
        self.purge(id);
        ids
    }

    /// Puts a transformed subject where `id` is.
    ///
    /// A subject taken from this document is merged back as is: its nodes
    /// keep their ids and edits, and its pending queues come along. Anything
    /// else is imported under fresh ids.
    fn adopt(&mut self, id: NodeId, document: Document) -> Vec<NodeId> {
        let subtree: HashSet<NodeId> = self.subtree(id).into_iter().collect();
        let merges = document.lineage == self.lineage
            && document.collapsed.is_none()
            && document.arena.len() >= self.arena.len()
            && document
                .tree
                .owners
                .keys()
                .all(|each| subtree.contains(each) || !self.contains(*each));

        if !merges {
            let ids = self.import_document(document);
            self.splice(id, &ids);
            self.purge(id);
            return ids;
        }

        let Some((owner, index)) = self.position(id) else {
            return Vec::new();
        };
        let Document {
            arena,
            tree: subject,
            transforms,
            ..
        } = document;

        self.arena = arena;
        self.transforms.absorb(transforms);

        let keep_lists = self.mode == Mode::Immutable;
        let tree = Arc::make_mut(&mut self.tree);
        for each in &subtree {
            tree.owners.remove(each);
            if !keep_lists {
                tree.children.remove(each);
            }
        }

        for (each, children) in &subject.children {
            tree.children.insert(*each, children.clone());
        }
        for (each, held_by) in &subject.owners {
            let held_by = match held_by {
                Owner::Root => owner,
                Owner::Node(parent) => Owner::Node(*parent),
            };
            tree.owners.insert(*each, held_by);
        }
        tree.successors
            .extend(subject.successors.iter().map(|(old, new)| (*old, *new)));

        let list = match owner {
            Owner::Root => &mut tree.roots,
            Owner::Node(parent) => tree.children.entry(parent).or_default(),
        };
        list.splice(index..=index, subject.roots.iter().copied());

        debug!(node = %id, roots = subject.roots.len(), "Merged transformed subject");
        subject.roots.clone()
    }

    /// Writes what the document queue produced over the whole document.
    fn settle_document(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Render(document)
                if document.lineage == self.lineage
                    && document.arena.len() >= self.arena.len() =>
            {
                self.arena = document.arena;
                self.tree = document.tree;
                self.transforms = document.transforms;
                self.collapsed = document.collapsed;
            }
            outcome => {
                self.clear();
                let ids = match outcome {
                    Outcome::Delete => Vec::new(),
                    Outcome::Raw(html) => vec![self.alloc_literal(html)],
                    Outcome::Render(document) => self.import_document(document),
                };
                self.attach(Owner::Root, &ids);
                Arc::make_mut(&mut self.tree).roots = ids;
            }
        }
    }

    /// Markup of everything inside `node`, without running transformations.
    pub fn node_html(&self, node: NodeId) -> String {
        let node = self.resolve(node);
        let mut output = String::new();
        for child in self.children_of(node) {
            self.write_static(*child, &mut output);
        }
        output
    }

    /// Text inside `node`, tags stripped.
    pub fn node_text(&self, node: NodeId) -> String {
        strip_tags(&self.node_html(node))
    }

    /// Markup of `node` itself, without running transformations.
    pub fn node_to_html(&self, node: NodeId) -> String {
        let mut output = String::new();
        self.write_static(self.resolve(node), &mut output);
        output
    }

    fn write_static(&self, id: NodeId, output: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };

        output.push_str(node.tag_open_start());
        node.attributes().write_to(output);
        output.push_str(node.tag_open_end());
        for child in self.children_of(id) {
            self.write_static(*child, output);
        }
        output.push_str(node.tag_close());
    }

    /// Folds every subtree that holds no node of `types` (and nothing pending)
    /// into a single literal.
    ///
    /// If nothing in the document is kept, the whole document is stored as one
    /// string and the tree is emptied.
    #[instrument(skip(self))]
    pub fn collapse(&mut self, types: &[&str]) -> &mut Self {
        let roots = self.tree.roots.clone();
        if !roots.iter().any(|root| self.keeps(*root, types)) {
            let html = self.to_string();
            self.clear();
            self.collapsed = Some(html);
            debug!("Collapsed whole document");
            return self;
        }

        let folded = self.collapse_list(Owner::Root, types);
        debug!(folded, "Collapsed document");
        self
    }

    fn keeps(&self, id: NodeId, types: &[&str]) -> bool {
        let kept = self
            .node(id)
            .is_some_and(|node| node.is_significant_in(types))
            || self.transforms.is_pending(id);

        kept || self.children_of(id).iter().any(|child| self.keeps(*child, types))
    }

    /// Returns how many subtrees were folded.
    fn collapse_list(&mut self, owner: Owner, types: &[&str]) -> usize {
        let ids = self.list(owner).to_vec();
        let mut list = Vec::with_capacity(ids.len());
        let mut folded = Vec::new();
        let mut buffer = String::new();
        let mut count = 0;

        for id in &ids {
            if self.keeps(*id, types) {
                if !buffer.is_empty() {
                    list.push(self.alloc_literal(std::mem::take(&mut buffer)));
                }
                list.push(*id);
            } else {
                self.write_static(*id, &mut buffer);
                folded.push(*id);
                count += 1;
            }
        }
        if !buffer.is_empty() {
            list.push(self.alloc_literal(buffer));
        }

        let changed = list != ids;
        let owner = if changed {
            let inserted = list.clone();
            let owner = self.edit_children(owner, move |current| *current = list);
            for id in folded {
                self.purge(id);
            }
            self.attach(owner, &inserted);
            owner
        } else {
            owner
        };

        for child in self.list(owner).to_vec() {
            if self.node(child).is_some_and(Node::is_element) {
                count += self.collapse_list(Owner::Node(child), types);
            }
        }
        count
    }

    fn alloc_literal(&mut self, html: String) -> NodeId {
        self.alloc(Arc::new(Node::literal(html)))
    }
}

/// Renders without running transformations.
impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.tree.roots.is_empty() {
            return f.write_str(self.collapsed.as_deref().unwrap_or_default());
        }

        let mut output = String::new();
        for root in self.roots() {
            self.write_static(*root, &mut output);
        }
        f.write_str(&output)
    }
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}
