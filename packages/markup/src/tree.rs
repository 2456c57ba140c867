//! Element tree produced by the tokenizer.
//!
//! Nodes live in a flat arena and reference each other by [`MarkupId`], so
//! parent lookup is a plain index read instead of a back-pointer.
//!
//! The markup keeps its source text. Every node the tokenizer could trace
//! back to the input remembers the byte range it came from, and literal
//! serialization copies those ranges instead of re-encoding decoded values.

use std::ops::Range;

use crate::serializer::{self, Whitespace};
use crate::WHITESPACE_PRESERVING_ELEMENTS;

/// Index of a node inside its [`Markup`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkupId(pub(crate) usize);

impl MarkupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One attribute as written on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name with the casing used in the source.
    pub name: String,
    /// Decoded value.
    pub value: String,
    /// Written as a bare name, without `=`.
    pub valueless: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            valueless: false,
        }
    }

    /// Case-insensitive name comparison, the way HTML matches attribute names.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-cased tag name.
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Written as `<tag/>` in the source.
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupKind {
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone)]
pub(crate) struct MarkupData {
    pub(crate) kind: MarkupKind,
    pub(crate) parent: Option<MarkupId>,
    pub(crate) children: Vec<MarkupId>,
    /// Source of the start tag for elements, of the whole node otherwise.
    pub(crate) raw: Option<Range<usize>>,
    /// Source of the end tag; `None` when the source never closed the element.
    pub(crate) raw_close: Option<Range<usize>>,
}

/// A parsed markup tree.
#[derive(Debug, Clone, Default)]
pub struct Markup {
    pub(crate) nodes: Vec<MarkupData>,
    pub(crate) roots: Vec<MarkupId>,
    pub(crate) source: String,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_source(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    /// The text this markup was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> impl Iterator<Item = MarkupNode<'_>> + '_ {
        self.roots.iter().map(move |id| MarkupNode { markup: self, id: *id })
    }

    pub fn get(&self, id: MarkupId) -> Option<MarkupNode<'_>> {
        (id.0 < self.nodes.len()).then_some(MarkupNode { markup: self, id })
    }

    /// Every node in allocation order. A parent always comes before its children.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = MarkupNode<'_>> + '_ {
        (0..self.nodes.len()).map(move |index| MarkupNode {
            markup: self,
            id: MarkupId(index),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The doctype name, if the markup starts with (or contains) a doctype.
    pub fn doctype(&self) -> Option<&str> {
        self.roots().find_map(|node| match node.kind() {
            MarkupKind::Doctype(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Serializes every top-level node.
    pub fn to_html(&self, whitespace: Whitespace) -> String {
        let mut output = String::new();
        for root in self.roots() {
            serializer::write_node(&root, whitespace, &mut output);
        }
        output
    }

    pub(crate) fn push(&mut self, kind: MarkupKind, parent: Option<MarkupId>) -> MarkupId {
        let id = MarkupId(self.nodes.len());
        self.nodes.push(MarkupData {
            kind,
            parent,
            children: Vec::new(),
            raw: None,
            raw_close: None,
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    /// Last child of `parent` (or last root when `parent` is `None`).
    pub(crate) fn last_child(&self, parent: Option<MarkupId>) -> Option<MarkupId> {
        match parent {
            Some(parent) => self.nodes[parent.0].children.last().copied(),
            None => self.roots.last().copied(),
        }
    }

    pub(crate) fn kind_mut(&mut self, id: MarkupId) -> &mut MarkupKind {
        &mut self.nodes[id.0].kind
    }

    pub(crate) fn raw_range(&self, id: MarkupId) -> Option<Range<usize>> {
        self.nodes[id.0].raw.clone()
    }

    pub(crate) fn set_raw(&mut self, id: MarkupId, range: Range<usize>) {
        self.nodes[id.0].raw = Some(range);
    }

    pub(crate) fn set_raw_close(&mut self, id: MarkupId, range: Range<usize>) {
        self.nodes[id.0].raw_close = Some(range);
    }
}

/// Borrowed handle to one node of a [`Markup`] tree.
#[derive(Clone, Copy)]
pub struct MarkupNode<'a> {
    markup: &'a Markup,
    id: MarkupId,
}

impl std::fmt::Debug for MarkupNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupNode")
            .field("id", &self.id)
            .field("kind", self.kind())
            .finish()
    }
}

impl<'a> MarkupNode<'a> {
    fn data(&self) -> &'a MarkupData {
        &self.markup.nodes[self.id.0]
    }

    pub fn id(&self) -> MarkupId {
        self.id
    }

    pub fn markup(&self) -> &'a Markup {
        self.markup
    }

    pub fn kind(&self) -> &'a MarkupKind {
        &self.data().kind
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind(), MarkupKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind(), MarkupKind::Text(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind(), MarkupKind::Comment(_))
    }

    pub fn is_doctype(&self) -> bool {
        matches!(self.kind(), MarkupKind::Doctype(_))
    }

    /// Tag name for elements.
    pub fn name(&self) -> Option<&'a str> {
        match self.kind() {
            MarkupKind::Element(element) => Some(element.name.as_str()),
            _ => None,
        }
    }

    /// Attributes in source order; empty for anything but elements.
    pub fn attributes(&self) -> &'a [Attribute] {
        match self.kind() {
            MarkupKind::Element(element) => &element.attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes()
            .iter()
            .find(|attribute| attribute.is(name))
            .map(|attribute| attribute.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Content of a text or comment node.
    pub fn text(&self) -> Option<&'a str> {
        match self.kind() {
            MarkupKind::Text(text) | MarkupKind::Comment(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Source text of the start tag for elements, of the whole node otherwise.
    pub fn raw(&self) -> Option<&'a str> {
        let range = self.data().raw.clone()?;
        self.markup.source.get(range)
    }

    /// Source text of an element's end tag.
    pub fn raw_close(&self) -> Option<&'a str> {
        let range = self.data().raw_close.clone()?;
        self.markup.source.get(range)
    }

    pub fn parent(&self) -> Option<MarkupNode<'a>> {
        self.data().parent.map(|id| MarkupNode {
            markup: self.markup,
            id,
        })
    }

    /// Parent first, then its parent, up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = MarkupNode<'a>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = MarkupNode<'a>> + 'a {
        let markup = self.markup;
        self.data()
            .children
            .iter()
            .map(move |id| MarkupNode { markup, id: *id })
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    /// All descendants in depth-first pre-order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'a> {
        let mut stack: Vec<MarkupId> = self.data().children.clone();
        stack.reverse();
        Descendants {
            markup: self.markup,
            stack,
        }
    }

    /// True for whitespace-only text outside of whitespace-preserving elements.
    pub fn is_blank_text(&self) -> bool {
        match self.kind() {
            MarkupKind::Text(text) => {
                text.bytes().all(|byte| byte.is_ascii_whitespace())
                    && !self.ancestors().any(|ancestor| {
                        ancestor
                            .name()
                            .map(|name| WHITESPACE_PRESERVING_ELEMENTS.contains(&name))
                            .unwrap_or(false)
                    })
            }
            _ => false,
        }
    }

    /// Serializes this node and its subtree.
    pub fn to_html(&self, whitespace: Whitespace) -> String {
        let mut output = String::new();
        serializer::write_node(self, whitespace, &mut output);
        output
    }
}

/// Iterator returned by [`MarkupNode::descendants`].
pub struct Descendants<'a> {
    markup: &'a Markup,
    stack: Vec<MarkupId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = MarkupNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = MarkupNode {
            markup: self.markup,
            id,
        };
        self.stack
            .extend(self.markup.nodes[id.0].children.iter().rev().copied());
        Some(node)
    }
}
