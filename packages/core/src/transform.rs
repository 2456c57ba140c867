//! # Transformations
//!
//! Deferred callbacks attached to a node, to a node's attributes, or to the
//! whole document. They run during [`Document::render`](crate::Document::render),
//! `high` before `default` before `low` and first-in first-out within a level.
//! Rendering consumes a queue and writes what it produced back into the
//! tree, so each callback runs at most once per document.

use std::any::Any;
use std::collections::{vec_deque, HashMap, VecDeque};
use std::iter::Chain;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::document::Document;
use crate::node::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Default,
    Low,
}

/// What a node transformation turned its subject into.
#[derive(Debug, Clone)]
pub enum Transformed {
    /// Render nothing for the node.
    Delete,
    /// Emit this markup verbatim instead of the node.
    Raw(String),
    /// Continue with the (possibly edited) subject.
    Keep,
    /// Continue with this document as the new subject.
    Replace(Document),
}

impl From<Document> for Transformed {
    fn from(document: Document) -> Self {
        Transformed::Replace(document)
    }
}

impl From<String> for Transformed {
    fn from(html: String) -> Self {
        Transformed::Raw(html)
    }
}

impl From<&str> for Transformed {
    fn from(html: &str) -> Self {
        Transformed::Raw(html.to_string())
    }
}

/// Callback for a node or the whole document.
///
/// The subject is the node as a single-rooted document sharing the node ids
/// of the document being rendered.
pub type Transformation =
    Arc<dyn Fn(&mut Document, &Env<'_>) -> anyhow::Result<Transformed> + Send + Sync>;

/// Callback editing the attributes of one node before they are emitted.
pub type AttributesTransformation =
    Arc<dyn Fn(&mut Attributes, &Env<'_>) -> anyhow::Result<()> + Send + Sync>;

/// What a transformation can see besides its subject.
pub struct Env<'a> {
    document: &'a Document,
    context: Option<&'a dyn Any>,
}

impl<'a> Env<'a> {
    pub(crate) fn new(document: &'a Document, context: Option<&'a dyn Any>) -> Self {
        Self { document, context }
    }

    /// The document owning the node being transformed.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// The render context as `T`. Without a context, the document itself is
    /// the context.
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        match self.context {
            Some(context) => context.downcast_ref::<T>(),
            None => (self.document as &dyn Any).downcast_ref::<T>(),
        }
    }
}

/// Three FIFO levels drained in priority order.
#[derive(Clone)]
pub(crate) struct Queue<T> {
    high: VecDeque<T>,
    default: VecDeque<T>,
    low: VecDeque<T>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            high: VecDeque::new(),
            default: VecDeque::new(),
            low: VecDeque::new(),
        }
    }
}

impl<T> std::fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("high", &self.high.len())
            .field("default", &self.default.len())
            .field("low", &self.low.len())
            .finish()
    }
}

impl<T> Queue<T> {
    pub(crate) fn push(&mut self, priority: Priority, item: T) {
        match priority {
            Priority::High => self.high.push_back(item),
            Priority::Default => self.default.push_back(item),
            Priority::Low => self.low.push_back(item),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.high.is_empty() && self.default.is_empty() && self.low.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.high.len() + self.default.len() + self.low.len()
    }
}

type Levels<T> = vec_deque::IntoIter<T>;

impl<T> IntoIterator for Queue<T> {
    type Item = T;
    type IntoIter = Chain<Chain<Levels<T>, Levels<T>>, Levels<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.high
            .into_iter()
            .chain(self.default)
            .chain(self.low)
    }
}

/// Queues that belong to one node id.
#[derive(Default)]
pub(crate) struct Pending {
    node: Option<Queue<Transformation>>,
    attributes: Option<Queue<AttributesTransformation>>,
}

/// Every queue of a document.
#[derive(Debug, Clone, Default)]
pub(crate) struct Transforms {
    pub(crate) nodes: HashMap<NodeId, Queue<Transformation>>,
    pub(crate) attributes: HashMap<NodeId, Queue<AttributesTransformation>>,
    pub(crate) document: Queue<Transformation>,
}

impl Transforms {
    pub(crate) fn is_pending(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id) || self.attributes.contains_key(&id)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.nodes.is_empty() || !self.attributes.is_empty() || !self.document.is_empty()
    }

    pub(crate) fn forget(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.attributes.remove(&id);
    }

    pub(crate) fn take(&mut self, id: NodeId) -> Pending {
        Pending {
            node: self.nodes.remove(&id),
            attributes: self.attributes.remove(&id),
        }
    }

    pub(crate) fn restore(&mut self, id: NodeId, pending: Pending) {
        if let Some(queue) = pending.node {
            self.nodes.insert(id, queue);
        }
        if let Some(queue) = pending.attributes {
            self.attributes.insert(id, queue);
        }
    }

    /// Moves everything pending on `old` over to `new`.
    pub(crate) fn rename(&mut self, old: NodeId, new: NodeId) {
        let pending = self.take(old);
        self.restore(new, pending);
    }

    /// Node-level queues for the ids `keep` accepts.
    pub(crate) fn subset(&self, keep: impl Fn(NodeId) -> bool) -> Transforms {
        Transforms {
            nodes: filtered(&self.nodes, &keep),
            attributes: filtered(&self.attributes, &keep),
            document: Queue::default(),
        }
    }

    /// Removes the node-level entries for the ids `take` accepts.
    pub(crate) fn remove_where(&mut self, take: impl Fn(NodeId) -> bool) {
        self.nodes.retain(|id, _| !take(*id));
        self.attributes.retain(|id, _| !take(*id));
    }

    /// Adds the node-level queues of `other`, keeping ours where both have one.
    pub(crate) fn absorb(&mut self, other: Transforms) {
        for (id, queue) in other.nodes {
            self.nodes.entry(id).or_insert(queue);
        }
        for (id, queue) in other.attributes {
            self.attributes.entry(id).or_insert(queue);
        }
    }
}

fn filtered<T: Clone>(
    map: &HashMap<NodeId, T>,
    keep: &impl Fn(NodeId) -> bool,
) -> HashMap<NodeId, T> {
    map.iter()
        .filter(|(id, _)| keep(**id))
        .map(|(id, value)| (*id, value.clone()))
        .collect()
}

impl Document {
    /// Queues `transformation` for the node `node`.
    ///
    /// Does nothing if `node` is not part of the document.
    pub fn transform<F>(&mut self, node: NodeId, priority: Priority, transformation: F) -> &mut Self
    where
        F: Fn(&mut Document, &Env<'_>) -> anyhow::Result<Transformed> + Send + Sync + 'static,
    {
        let node = self.resolve(node);
        if self.contains(node) {
            self.transforms
                .nodes
                .entry(node)
                .or_default()
                .push(priority, Arc::new(transformation));
        }
        self
    }

    /// Queues `transformation` for the attributes of `node`.
    pub fn transform_attributes<F>(
        &mut self,
        node: NodeId,
        priority: Priority,
        transformation: F,
    ) -> &mut Self
    where
        F: Fn(&mut Attributes, &Env<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let node = self.resolve(node);
        if self.contains(node) {
            self.transforms
                .attributes
                .entry(node)
                .or_default()
                .push(priority, Arc::new(transformation));
        }
        self
    }

    /// Queues `transformation` with the whole document as its subject.
    pub fn transform_document<F>(&mut self, priority: Priority, transformation: F) -> &mut Self
    where
        F: Fn(&mut Document, &Env<'_>) -> anyhow::Result<Transformed> + Send + Sync + 'static,
    {
        self.transforms
            .document
            .push(priority, Arc::new(transformation));
        self
    }

    /// True if rendering would run at least one callback.
    pub fn has_pending_transformations(&self) -> bool {
        self.transforms.has_pending()
    }

    /// Number of callbacks queued on `node` itself (attributes included).
    pub fn pending_transformations(&self, node: NodeId) -> usize {
        let node = self.resolve(node);
        self.transforms.nodes.get(&node).map_or(0, Queue::len)
            + self.transforms.attributes.get(&node).map_or(0, Queue::len)
    }
}
