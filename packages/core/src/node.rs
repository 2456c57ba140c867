//! Nodes: the structured units of a [`Document`](crate::Document).

use serde::Serialize;

use crate::attributes::Attributes;
use crate::labels::{LabelValue, Labels};

/// Tags that never get a closing tag.
pub const SELF_CLOSING: &[&str] = &["area", "base", "br", "hr", "img", "input", "link", "meta"];

/// Tags that take user input inside a form.
pub const FORM_INPUTS: &[&str] = &["input", "select", "textarea", "button"];

/// Form inputs that carry no `value` attribute of their own.
pub const VALUELESS: &[&str] = &["select"];

/// Identity of a node inside a document arena.
///
/// Ids survive `clone`, `duplicate` and `extract`: a node found on a template
/// is addressed by the same id on every document derived from it. Nodes
/// created after a fork get ids only the creating side accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    pub(crate) lineage: u32,
    pub(crate) index: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.lineage, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An element, rendered as open tag, attributes, children and close tag.
    Element,
    /// Pre-rendered markup emitted verbatim.
    Literal,
}

/// One retained unit of markup.
///
/// Rendering a node concatenates `tag_open_start`, the attributes,
/// `tag_open_end`, the rendered children and `tag_close`. A literal keeps its
/// whole markup in `tag_open_start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    kind: NodeKind,
    tag_open_start: String,
    attributes: Attributes,
    tag_open_end: String,
    tag_close: String,
    significance: Vec<String>,
    labels: Labels,
}

impl Node {
    /// An element node closed the way `tag` is closed in HTML.
    pub fn element(tag: &str, attributes: Attributes) -> Self {
        Self {
            kind: NodeKind::Element,
            tag_open_start: format!("<{tag}"),
            attributes,
            tag_open_end: ">".to_string(),
            tag_close: if Self::is_self_closing(tag) {
                String::new()
            } else {
                format!("</{tag}>")
            },
            significance: Vec::new(),
            labels: Labels::new(),
        }
    }

    /// A node emitting `html` verbatim.
    pub fn literal(html: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Literal,
            tag_open_start: html.into(),
            attributes: Attributes::new(),
            tag_open_end: String::new(),
            tag_close: String::new(),
            significance: Vec::new(),
            labels: Labels::new(),
        }
    }

    pub fn with_significance(mut self, significance: Vec<String>) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn is_self_closing(tag: &str) -> bool {
        SELF_CLOSING.contains(&tag)
    }

    pub fn is_form_input(tag: &str) -> bool {
        FORM_INPUTS.contains(&tag)
    }

    pub fn is_valueless(tag: &str) -> bool {
        VALUELESS.contains(&tag)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_literal(&self) -> bool {
        self.kind == NodeKind::Literal
    }

    /// Tag name of an element node.
    pub fn tagname(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Element => self.tag_open_start.strip_prefix('<'),
            NodeKind::Literal => None,
        }
    }

    pub fn tag_open_start(&self) -> &str {
        &self.tag_open_start
    }

    pub fn tag_open_end(&self) -> &str {
        &self.tag_open_end
    }

    pub fn tag_close(&self) -> &str {
        &self.tag_close
    }

    /// Markup of a literal node.
    pub fn literal_html(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Literal => Some(&self.tag_open_start),
            NodeKind::Element => None,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Significance types this node was matched with when parsed.
    pub fn significance(&self) -> &[String] {
        &self.significance
    }

    pub fn is_significant(&self, significance: &str) -> bool {
        self.significance.iter().any(|name| name == significance)
    }

    pub fn has_significance(&self) -> bool {
        !self.significance.is_empty()
    }

    /// True when the node matches any of `types`.
    pub fn is_significant_in(&self, types: &[&str]) -> bool {
        types.iter().any(|name| self.is_significant(name))
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut Labels {
        &mut self.labels
    }

    pub fn label(&self, name: &str) -> Option<&LabelValue> {
        self.labels.get(name)
    }

    pub fn is_labeled(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    /// Equal markup, ignoring significance and labels.
    pub(crate) fn same_markup(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.tag_open_start == other.tag_open_start
            && self.attributes == other.attributes
            && self.tag_open_end == other.tag_open_end
            && self.tag_close == other.tag_close
    }
}
