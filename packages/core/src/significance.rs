//! # Significance
//!
//! A significance type is a named predicate over parsed markup. Elements that
//! match one (or contain one that does) are kept as structured [`Node`]s;
//! everything else is rendered to a literal once, at parse time.
//!
//! The process-wide registry starts with the built-in types and only ever
//! grows. [`Parser`](crate::Parser) takes a snapshot of it when constructed.
//!
//! [`Node`]: crate::Node

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use stringdoc_markup::MarkupNode;
use tracing::debug;

use crate::error::{Result, StringDocError};

pub type Predicate = Arc<dyn Fn(&MarkupNode<'_>) -> bool + Send + Sync>;

/// A named predicate.
#[derive(Clone)]
pub struct SignificanceType {
    name: String,
    predicate: Predicate,
}

impl SignificanceType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, node: &MarkupNode<'_>) -> bool {
        (self.predicate)(node)
    }
}

impl std::fmt::Debug for SignificanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SignificanceType").field(&self.name).finish()
    }
}

/// Ordered table of significance types.
#[derive(Debug, Clone, Default)]
pub struct SignificanceRegistry {
    types: Vec<SignificanceType>,
}

impl SignificanceRegistry {
    /// A registry with no types; nothing parsed with it is retained.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, predicate) in builtin_types() {
            registry.types.push(SignificanceType {
                name: name.to_string(),
                predicate,
            });
        }
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<()>
    where
        F: Fn(&MarkupNode<'_>) -> bool + Send + Sync + 'static,
    {
        let name = name.into();

        if name.is_empty() {
            return Err(StringDocError::EmptySignificanceName);
        }

        if self.contains(&name) {
            return Err(StringDocError::DuplicateSignificance(name));
        }

        debug!(name = %name, "Registered significance type");
        self.types.push(SignificanceType {
            name,
            predicate: Arc::new(predicate),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|ty| ty.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|ty| ty.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of every type `node` matches, in registration order.
    pub fn find_significance(&self, node: &MarkupNode<'_>) -> Vec<String> {
        self.types
            .iter()
            .filter(|ty| ty.matches(node))
            .map(|ty| ty.name.clone())
            .collect()
    }

    pub fn is_significant(&self, node: &MarkupNode<'_>) -> bool {
        self.types.iter().any(|ty| ty.matches(node))
    }

    /// True if any descendant of `node` is significant.
    pub fn contains_significant_child(&self, node: &MarkupNode<'_>) -> bool {
        node.descendants().any(|child| self.is_significant(&child))
    }
}

static REGISTRY: LazyLock<RwLock<Arc<SignificanceRegistry>>> =
    LazyLock::new(|| RwLock::new(Arc::new(SignificanceRegistry::builtin())));

/// Registers a significance type in the process-wide registry.
///
/// Documents parsed by parsers created afterwards see the new type.
pub fn significant<F>(name: impl Into<String>, predicate: F) -> Result<()>
where
    F: Fn(&MarkupNode<'_>) -> bool + Send + Sync + 'static,
{
    let mut guard = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let mut registry = SignificanceRegistry::clone(&guard);
    registry.register(name, predicate)?;
    *guard = Arc::new(registry);
    Ok(())
}

/// Snapshot of the process-wide registry.
pub fn registry() -> Arc<SignificanceRegistry> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn builtin_types() -> Vec<(&'static str, Predicate)> {
    vec![
        ("binding", predicate(is_binding)),
        ("scope", predicate(|node| is_binding(node) && has_nested_binding(node))),
        ("prop", predicate(|node| is_binding(node) && !has_nested_binding(node))),
        (
            "multipart_binding",
            predicate(|node| {
                node.attribute("binding")
                    .and_then(|binding| binding.split(':').next())
                    .is_some_and(|name| name.contains('.'))
            }),
        ),
        ("container", predicate(|node| is_directive(node, "@container"))),
        ("partial", predicate(|node| is_directive(node, "@include"))),
        ("component", predicate(|node| node.has_attribute("ui"))),
        (
            "form",
            predicate(|node| node.name() == Some("form") && node.has_attribute("binding")),
        ),
        ("prototype", predicate(|node| node.has_attribute("prototype"))),
        ("mode", predicate(|node| node.has_attribute("mode"))),
        ("endpoint", predicate(|node| node.has_attribute("endpoint"))),
        (
            "endpoint_action",
            predicate(|node| node.has_attribute("endpoint-action")),
        ),
        ("html", predicate(|node| node.name() == Some("html"))),
        ("head", predicate(|node| node.name() == Some("head"))),
        ("body", predicate(|node| node.name() == Some("body"))),
        ("title", predicate(|node| node.name() == Some("title"))),
        ("meta", predicate(|node| node.name() == Some("meta"))),
    ]
}

fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&MarkupNode<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

fn is_binding(node: &MarkupNode<'_>) -> bool {
    node.is_element() && node.has_attribute("binding")
}

fn has_nested_binding(node: &MarkupNode<'_>) -> bool {
    node.descendants().any(|child| is_binding(&child))
}

fn is_directive(node: &MarkupNode<'_>, directive: &str) -> bool {
    node.is_comment()
        && node
            .text()
            .is_some_and(|text| text.trim_start().starts_with(directive))
}

/// Name following the directive of a significant comment, e.g. `sidebar` in
/// `<!-- @container sidebar -->`.
pub(crate) fn directive_name(comment: &str) -> &str {
    let Some(start) = comment.find('@') else {
        return "";
    };

    let rest = &comment[start..];
    let rest = rest.trim_start_matches(|c: char| !c.is_whitespace());
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}
