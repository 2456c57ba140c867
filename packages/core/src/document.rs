//! # Document
//!
//! A document is an ordered forest of [`Node`]s. Node values live in an arena
//! addressed by [`NodeId`]; the tree structure (top-level ids, child lists and
//! owner back-references) is kept in a separate table. Both tables are shared
//! between documents forked from one another and copied on first write.
//!
//! ## Forks
//!
//! Cloning or duplicating a document forks it. The copy accepts every id
//! that existed at the split and numbers the nodes it creates afterwards in
//! a lineage of its own, so an id made on one side of a fork is unknown to
//! the other and edits through it are no-ops there.
//!
//! ## Modes
//!
//! - [`Mode::Mutable`] edits node values in place. A node keeps its id for
//!   its whole life.
//! - [`Mode::Immutable`] never changes a value once it is in the arena. An edit
//!   stores the edited copy under a new id, swaps it into the owner's list and
//!   records the old id as superseded. The old id keeps reading the value (and
//!   child list) it had before the edit; [`Document::resolve`] maps it to the
//!   current node.
//!
//! Both modes render identically for the same sequence of edits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeId};
use crate::parser::{ParseOptions, Parser};
use crate::transform::Transforms;

static NEXT_LINEAGE: AtomicU32 = AtomicU32::new(1);

/// How a document applies edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Mutable,
    Immutable,
}

/// Who holds a node in its child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Root,
    Node(NodeId),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tree {
    pub(crate) roots: Vec<NodeId>,
    pub(crate) children: HashMap<NodeId, Vec<NodeId>>,
    /// Present for every attached node.
    pub(crate) owners: HashMap<NodeId, Owner>,
    /// Superseded id -> id of the edited copy.
    pub(crate) successors: HashMap<NodeId, NodeId>,
}

/// Ids of `lineage` numbered below `below`, accepted by a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Inherited {
    lineage: u32,
    below: u32,
}

/// Parsed markup with its significant nodes kept addressable.
pub struct Document {
    pub(crate) mode: Mode,
    /// Lineage of the ids this document allocates.
    pub(crate) lineage: u32,
    pub(crate) inherited: Arc<Vec<Inherited>>,
    pub(crate) arena: Arc<Vec<Arc<Node>>>,
    pub(crate) tree: Arc<Tree>,
    pub(crate) transforms: Transforms,
    pub(crate) collapsed: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty(Mode::default())
    }
}

/// Forks the document: see the module docs.
impl Clone for Document {
    fn clone(&self) -> Self {
        let mut inherited = Vec::clone(&self.inherited);
        inherited.push(Inherited {
            lineage: self.lineage,
            below: self.arena.len() as u32,
        });

        Self {
            lineage: next_lineage(),
            inherited: Arc::new(inherited),
            ..self.share()
        }
    }
}

fn next_lineage() -> u32 {
    NEXT_LINEAGE.fetch_add(1, Ordering::Relaxed)
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("mode", &self.mode)
            .field("roots", &self.tree.roots)
            .field("arena", &self.arena.len())
            .field("transforms", &self.transforms)
            .field("collapsed", &self.collapsed)
            .finish()
    }
}

impl Document {
    pub fn empty(mode: Mode) -> Self {
        Self {
            mode,
            lineage: next_lineage(),
            inherited: Arc::new(Vec::new()),
            arena: Arc::new(Vec::new()),
            tree: Arc::new(Tree::default()),
            transforms: Transforms::default(),
            collapsed: None,
        }
    }

    /// Parses `html` with the process-wide significance registry, in mutable mode.
    pub fn parse(html: &str) -> Self {
        Parser::new().parse(html)
    }

    pub fn parse_with(html: &str, options: ParseOptions) -> Self {
        Parser::new().with_options(options).parse(html)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.tree.roots
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.tree.roots.is_empty() && self.collapsed.is_none()
    }

    /// Markup stored by a whole-document [`collapse`](Document::collapse).
    pub fn collapsed(&self) -> Option<&str> {
        self.collapsed.as_deref()
    }

    /// Value stored under `id`, attached or not.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|node| node.as_ref())
    }

    /// True if `id` is currently part of the tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.owns(id) && self.tree.owners.contains_key(&id)
    }

    /// The current id of the node `id` refers to, following immutable edits.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self.tree.successors.get(&id) {
            id = *next;
        }
        id
    }

    /// Child ids of `id` (the pre-edit list for a superseded or removed id
    /// in immutable mode).
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.tree
            .children
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        match self.tree.owners.get(&id)? {
            Owner::Root => None,
            Owner::Node(parent) => Some(*parent),
        }
    }

    /// A copy to render independently of `self`.
    ///
    /// Mutable documents copy every node value up front; immutable documents
    /// share them until either side edits.
    pub fn duplicate(&self) -> Self {
        let mut duplicate = self.clone();
        if self.mode == Mode::Mutable {
            duplicate.arena = Arc::new(
                self.arena
                    .iter()
                    .map(|node| Arc::new(Node::clone(node)))
                    .collect(),
            );
            duplicate.tree = Arc::new(Tree::clone(&self.tree));
        }
        duplicate
    }

    /// The subtree rooted at `id` as a document of its own, keeping ids.
    ///
    /// Pending transformations of the subtree are copied along.
    pub fn extract(&self, id: NodeId) -> Self {
        let id = self.resolve(id);
        let mut tree = Tree::default();

        if self.contains(id) {
            tree.roots.push(id);
            tree.owners.insert(id, Owner::Root);

            let mut stack = vec![id];
            while let Some(current) = stack.pop() {
                let children = self.children_of(current);
                if children.is_empty() {
                    continue;
                }

                tree.children.insert(current, children.to_vec());
                for child in children {
                    tree.owners.insert(*child, Owner::Node(current));
                    stack.push(*child);
                }
            }
        }

        let transforms = self.transforms.subset(|node| tree.owners.contains_key(&node));

        Self {
            tree: Arc::new(tree),
            transforms,
            collapsed: None,
            ..self.share()
        }
    }

    /// A copy in the same lineage. Ids it allocates continue this document's
    /// numbering, which is what lets a render subject be merged back.
    pub(crate) fn share(&self) -> Self {
        Self {
            mode: self.mode,
            lineage: self.lineage,
            inherited: self.inherited.clone(),
            arena: self.arena.clone(),
            tree: self.tree.clone(),
            transforms: self.transforms.clone(),
            collapsed: self.collapsed.clone(),
        }
    }

    /// A deep copy of the subtree rooted at `id` with fresh ids.
    pub fn instance(&self, id: NodeId) -> Self {
        let mut instance = Self::empty(self.mode);
        let roots = instance.import_document(self.extract(id));
        instance.attach(Owner::Root, &roots);
        Arc::make_mut(&mut instance.tree).roots = roots;
        instance
    }

    /// True for ids allocated here or inherited at a fork.
    fn owns(&self, id: NodeId) -> bool {
        id.lineage == self.lineage
            || self
                .inherited
                .iter()
                .any(|from| from.lineage == id.lineage && id.index < from.below)
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&Arc<Node>> {
        if !self.owns(id) {
            return None;
        }
        self.arena.get(id.index as usize)
    }

    pub(crate) fn alloc(&mut self, node: Arc<Node>) -> NodeId {
        let arena = Arc::make_mut(&mut self.arena);
        let index = arena.len() as u32;
        arena.push(node);
        NodeId {
            lineage: self.lineage,
            index,
        }
    }

    /// Appends a freshly built node; used while parsing.
    pub(crate) fn push_node(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(Arc::new(node));
        let owner = match parent {
            Some(parent) => Owner::Node(parent),
            None => Owner::Root,
        };

        let tree = Arc::make_mut(&mut self.tree);
        tree.owners.insert(id, owner);
        match parent {
            Some(parent) => tree.children.entry(parent).or_default().push(id),
            None => tree.roots.push(id),
        }
        id
    }

    pub(crate) fn owner_of(&self, id: NodeId) -> Option<Owner> {
        self.tree.owners.get(&id).copied()
    }

    pub(crate) fn list(&self, owner: Owner) -> &[NodeId] {
        match owner {
            Owner::Root => &self.tree.roots,
            Owner::Node(id) => self.children_of(id),
        }
    }

    /// Owner of `id` and its index in the owner's list.
    pub(crate) fn position(&self, id: NodeId) -> Option<(Owner, usize)> {
        let owner = self.owner_of(id)?;
        let index = self.list(owner).iter().position(|each| *each == id)?;
        Some((owner, index))
    }

    /// Applies `edit` to a node value and returns the id now holding it.
    pub(crate) fn edit_node(&mut self, id: NodeId, edit: impl FnOnce(&mut Node)) -> NodeId {
        let id = self.resolve(id);
        if !self.contains(id) {
            return id;
        }

        match self.mode {
            Mode::Mutable => {
                let arena = Arc::make_mut(&mut self.arena);
                edit(Arc::make_mut(&mut arena[id.index as usize]));
                id
            }
            Mode::Immutable => {
                let Some(current) = self.slot(id) else {
                    return id;
                };
                let mut node = Node::clone(current);
                edit(&mut node);
                let edited = self.alloc(Arc::new(node));
                self.supersede(id, edited);
                edited
            }
        }
    }

    /// Applies `edit` to the child list held by `owner` and returns the owner
    /// now holding the list.
    pub(crate) fn edit_children(
        &mut self,
        owner: Owner,
        edit: impl FnOnce(&mut Vec<NodeId>),
    ) -> Owner {
        let owner = match owner {
            Owner::Root => Owner::Root,
            Owner::Node(id) => match self.mode {
                Mode::Mutable => Owner::Node(id),
                Mode::Immutable => Owner::Node(self.edit_node(id, |_| {})),
            },
        };

        let tree = Arc::make_mut(&mut self.tree);
        match owner {
            Owner::Root => edit(&mut tree.roots),
            Owner::Node(id) => edit(tree.children.entry(id).or_default()),
        }
        owner
    }

    /// Moves `old`'s place, children and pending work to `new`.
    fn supersede(&mut self, old: NodeId, new: NodeId) {
        let tree = Arc::make_mut(&mut self.tree);

        if let Some(owner) = tree.owners.remove(&old) {
            tree.owners.insert(new, owner);
            let list = match owner {
                Owner::Root => &mut tree.roots,
                Owner::Node(parent) => tree.children.entry(parent).or_default(),
            };
            if let Some(slot) = list.iter_mut().find(|each| **each == old) {
                *slot = new;
            }
        }

        if let Some(children) = tree.children.get(&old).cloned() {
            for child in &children {
                tree.owners.insert(*child, Owner::Node(new));
            }
            tree.children.insert(new, children);
        }

        tree.successors.insert(old, new);

        self.transforms.rename(old, new);
    }

    /// Records `ids` as held by `owner`.
    pub(crate) fn attach(&mut self, owner: Owner, ids: &[NodeId]) {
        let tree = Arc::make_mut(&mut self.tree);
        for id in ids {
            tree.owners.insert(*id, owner);
        }
    }

    /// Puts `ids` where `id` sits in its owner's list. The owner keeps its id
    /// in both modes. Returns false if `id` is detached.
    pub(crate) fn splice(&mut self, id: NodeId, ids: &[NodeId]) -> bool {
        let Some((owner, index)) = self.position(id) else {
            return false;
        };

        let tree = Arc::make_mut(&mut self.tree);
        let list = match owner {
            Owner::Root => &mut tree.roots,
            Owner::Node(parent) => tree.children.entry(parent).or_default(),
        };
        list.splice(index..=index, ids.iter().copied());
        for each in ids {
            tree.owners.insert(*each, owner);
        }
        true
    }

    /// Forgets the subtree rooted at `id` after it was taken out of its list.
    ///
    /// Descendants already owned by another node are left alone. Immutable
    /// documents keep the child lists, so old ids still read them.
    pub(crate) fn purge(&mut self, id: NodeId) {
        let keep_lists = self.mode == Mode::Immutable;
        let tree = Arc::make_mut(&mut self.tree);
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            tree.owners.remove(&current);
            self.transforms.forget(current);

            let children = if keep_lists {
                tree.children.get(&current).cloned()
            } else {
                tree.children.remove(&current)
            };
            stack.extend(
                children
                    .into_iter()
                    .flatten()
                    .filter(|child| tree.owners.get(child) == Some(&Owner::Node(current))),
            );
        }
    }

    /// Every attached id in the subtree rooted at `id`.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            ids.push(current);
            stack.extend(self.children_of(current).iter().copied());
        }
        ids
    }

    /// Copies the nodes of `source` into this arena under new ids, along with
    /// their children and pending transformations. Returns the new top-level ids,
    /// not yet attached to any owner.
    pub(crate) fn import_document(&mut self, mut source: Document) -> Vec<NodeId> {
        if source.tree.roots.is_empty() {
            return match source.collapsed.take() {
                Some(html) => vec![self.alloc(Arc::new(Node::literal(html)))],
                None => Vec::new(),
            };
        }

        let roots = source.tree.roots.clone();
        roots
            .into_iter()
            .filter_map(|root| self.import_node(&mut source, root))
            .collect()
    }

    fn import_node(&mut self, source: &mut Document, id: NodeId) -> Option<NodeId> {
        let node = source.slot(id)?.clone();
        let imported = self.alloc(node);

        let pending = source.transforms.take(id);
        self.transforms.restore(imported, pending);

        let children = source.children_of(id).to_vec();
        let imported_children: Vec<NodeId> = children
            .into_iter()
            .filter_map(|child| self.import_node(source, child))
            .collect();

        if !imported_children.is_empty() {
            self.attach(Owner::Node(imported), &imported_children);
            Arc::make_mut(&mut self.tree)
                .children
                .insert(imported, imported_children);
        }

        Some(imported)
    }

    fn same_subtrees(&self, ours: &[NodeId], other: &Document, theirs: &[NodeId]) -> bool {
        ours.len() == theirs.len()
            && ours.iter().zip(theirs).all(|(a, b)| {
                match (self.node(*a), other.node(*b)) {
                    (Some(x), Some(y)) => {
                        let (ours, theirs) = (self.children_of(*a), other.children_of(*b));
                        x.same_markup(y) && self.same_subtrees(ours, other, theirs)
                    }
                    _ => false,
                }
            })
    }
}

/// Structural equality: same markup in the same shape. Identity, labels and
/// pending transformations are not compared.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.collapsed == other.collapsed
            && self.same_subtrees(&self.tree.roots, other, &other.tree.roots)
    }
}
