//! Building documents from HTML.
//!
//! The markup tree is walked one level at a time. Anything that is neither
//! significant nor holds a significant descendant is serialized once into a
//! literal node and never looked at again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stringdoc_markup::{Attribute, Markup, MarkupKind, MarkupNode, Whitespace};
use tracing::{debug, instrument};

use crate::attributes::Attributes;
use crate::document::{Document, Mode};
use crate::labels::{LabelValue, Labels};
use crate::node::{Node, NodeId};
use crate::significance::{self, directive_name, SignificanceRegistry};

/// Attributes mirrored into `data-*` attributes.
const DATA_ATTRS: &[&str] = &[
    "ui",
    "config",
    "binding",
    "endpoint",
    "endpoint-action",
    "version",
];

/// Attributes turned into labels.
const LABEL_ATTRS: &[&str] = &[
    "ui",
    "config",
    "mode",
    "version",
    "include",
    "exclude",
    "endpoint",
    "endpoint-action",
    "prototype",
    "binding",
];

/// Attributes only meaningful at parse time.
const DELETED_ATTRS: &[&str] = &["include", "exclude", "prototype"];

/// Ancestor tags that contribute to a binding's channel.
pub const SEMANTIC_TAGS: &[&str] = &[
    "article", "aside", "details", "footer", "form", "header", "main", "nav", "section", "summary",
];

/// Name of the container used when a container comment names none.
pub const DEFAULT_CONTAINER: &str = "default";

fn label_name(attribute: &str) -> &str {
    match attribute {
        "ui" => "component",
        other => other,
    }
}

fn short_name(attribute: &str) -> &str {
    match attribute {
        "binding" => "b",
        "endpoint" => "e",
        "endpoint-action" => "e-a",
        "version" => "v",
        other => other,
    }
}

/// Options for parsing HTML into a [`Document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// How the parsed document applies edits.
    pub mode: Mode,
    /// Keep whitespace-only text everywhere, not just in `pre`, `textarea`,
    /// `script` and `style`.
    pub preserve_whitespace: bool,
}

/// Builds documents from HTML with a fixed set of significance types.
#[derive(Debug, Clone)]
pub struct Parser {
    registry: Arc<SignificanceRegistry>,
    options: ParseOptions,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser using the current process-wide registry.
    pub fn new() -> Self {
        Self {
            registry: significance::registry(),
            options: ParseOptions::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<SignificanceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<SignificanceRegistry> {
        &self.registry
    }

    #[instrument(skip(self, html), fields(bytes = html.len(), mode = ?self.options.mode))]
    pub fn parse(&self, html: &str) -> Document {
        let markup = stringdoc_markup::parse(html);
        let analysis = Analysis::new(&markup, &self.registry);

        let mut document = Document::empty(self.options.mode);
        self.build(markup.roots(), &analysis, &mut document, None);

        debug!(
            markup_nodes = markup.len(),
            retained = analysis.retained_count(),
            "Document built"
        );
        document
    }

    fn whitespace(&self) -> Whitespace {
        if self.options.preserve_whitespace {
            Whitespace::Preserve
        } else {
            Whitespace::DropBlank
        }
    }

    fn build<'a>(
        &self,
        level: impl Iterator<Item = MarkupNode<'a>>,
        analysis: &Analysis,
        document: &mut Document,
        parent: Option<NodeId>,
    ) {
        let mut elements = Vec::new();

        for markup_node in level {
            if !self.options.preserve_whitespace && markup_node.is_blank_text() {
                continue;
            }

            let index = markup_node.id().index();
            let significance = &analysis.significance[index];

            if significance.is_empty() && !analysis.retained[index] {
                let html = markup_node.to_html(self.whitespace());
                if !html.is_empty() {
                    document.push_node(Node::literal(html), parent);
                }
                continue;
            }

            match markup_node.kind() {
                MarkupKind::Element(element) => {
                    let node = if significance.is_empty() {
                        let mut attributes = Attributes::new();
                        for attribute in &element.attributes {
                            copy_attribute(attribute, &mut attributes);
                        }
                        Node::element(&element.name, attributes)
                    } else {
                        significant_element(&markup_node, significance.clone())
                    };

                    let id = document.push_node(node, parent);
                    elements.push((id, markup_node));
                }
                MarkupKind::Comment(text) => {
                    let name = directive_name(text);
                    let labels = significance
                        .iter()
                        .map(|ty| {
                            let label = if name.is_empty() && ty == "container" {
                                DEFAULT_CONTAINER
                            } else {
                                name
                            };
                            (ty.clone(), LabelValue::from(label))
                        })
                        .collect();

                    let node = Node::literal(markup_node.to_html(Whitespace::Preserve))
                        .with_significance(significance.clone())
                        .with_labels(labels);
                    document.push_node(node, parent);
                }
                MarkupKind::Text(_) | MarkupKind::Doctype(_) => {
                    let node = Node::literal(markup_node.to_html(Whitespace::Preserve))
                        .with_significance(significance.clone());
                    document.push_node(node, parent);
                }
            }
        }

        for (id, element) in elements {
            self.build(element.children(), analysis, document, Some(id));
        }
    }
}

/// Significance of every markup node, plus whether it must be kept.
struct Analysis {
    significance: Vec<Vec<String>>,
    retained: Vec<bool>,
}

impl Analysis {
    fn new(markup: &Markup, registry: &SignificanceRegistry) -> Self {
        let significance: Vec<Vec<String>> = markup
            .iter()
            .map(|node| registry.find_significance(&node))
            .collect();

        // Children always follow their parent, so one reverse pass settles
        // every subtree before its root is looked at.
        let mut retained = vec![false; markup.len()];
        for node in markup.iter().rev() {
            let index = node.id().index();
            retained[index] = !significance[index].is_empty()
                || node.children().any(|child| retained[child.id().index()]);
        }

        Self {
            significance,
            retained,
        }
    }

    fn retained_count(&self) -> usize {
        self.retained.iter().filter(|retained| **retained).count()
    }
}

fn significant_element(element: &MarkupNode<'_>, significance: Vec<String>) -> Node {
    let mut attributes = Attributes::new();
    let mut labels = Labels::new();

    for attribute in element.attributes() {
        let key = attribute.name.to_ascii_lowercase();
        let key = key.as_str();
        let value = attribute.value.as_str();

        if LABEL_ATTRS.contains(&key) {
            labels.set(label_name(key), value);
        }

        if DELETED_ATTRS.contains(&key) {
            continue;
        }

        if DATA_ATTRS.contains(&key) {
            attributes.set(format!("data-{}", short_name(key)), value);
        } else {
            copy_attribute(attribute, &mut attributes);
        }
    }

    if let Some(binding) = labels.get("binding").and_then(LabelValue::as_str) {
        let binding = binding.to_string();
        derive_channel(element, &binding, &mut attributes, &mut labels);
    }

    let tag = element.name().unwrap_or_default();
    Node::element(tag, attributes)
        .with_significance(significance)
        .with_labels(labels)
}

/// Copies a source attribute with its name as written, bare if it had no value.
fn copy_attribute(attribute: &Attribute, attributes: &mut Attributes) {
    if attribute.valueless {
        attributes.set_bare(attribute.name.as_str());
    } else {
        attributes.set(attribute.name.as_str(), attribute.value.as_str());
    }
}

/// Splits `name.prop:seg1:seg2` into its binding, prop and channel parts.
fn derive_channel(
    element: &MarkupNode<'_>,
    binding: &str,
    attributes: &mut Attributes,
    labels: &mut Labels,
) {
    let mut parts = binding.split(':');
    let head = parts.next().unwrap_or_default();

    let mut channel = semantic_channel(element);
    channel.extend(parts.map(str::to_string));

    match head.split_once('.') {
        Some((name, prop)) => {
            labels.set("binding", name);
            labels.set("binding_prop", prop);
        }
        None => {
            labels.set("binding", head);
        }
    }

    attributes.set("data-b", head);

    let combined = channel.join(":");
    labels.set("channel", channel.clone());
    labels.set("combined_channel", combined.as_str());

    if !channel.is_empty() {
        attributes.set("data-c", combined);
    }
}

/// Semantic tag names from the outermost ancestor down to `element` itself.
fn semantic_channel(element: &MarkupNode<'_>) -> Vec<String> {
    let mut channel: Vec<String> = std::iter::once(*element)
        .chain(element.ancestors())
        .filter_map(|node| node.name())
        .filter(|name| SEMANTIC_TAGS.contains(name))
        .map(str::to_string)
        .collect();
    channel.reverse();
    channel
}
