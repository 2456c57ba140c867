//! # StringDoc Markup
//!
//! Thin adapter between raw HTML and the stringdoc engine.
//!
//! ```text
//! HTML text ──► html5ever tokenizer ──► TreeSink ──► Markup (element tree)
//! ```
//!
//! The engine never sees tokens. It walks a [`Markup`] tree through
//! [`MarkupNode`] handles, which provide:
//! - element / text / comment / doctype discrimination
//! - ordered attribute enumeration
//! - child enumeration and parent lookup
//! - literal serialization of whole subtrees
//!
//! No HTML5 tree-construction rules are applied: implied `<html>`, `<head>`
//! and `<body>` elements are never synthesized, so a fragment such as
//! `<div>foo</div>` round-trips as-is.

pub mod serializer;
pub mod tokenizer;
pub mod tree;

#[cfg(test)]
mod tests_tree;

pub use serializer::{escape_attribute, escape_text, Whitespace};
pub use tokenizer::parse;
pub use tree::{Attribute, ElementData, Markup, MarkupId, MarkupKind, MarkupNode};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is emitted without escaping.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Elements inside which whitespace-only text is significant.
pub const WHITESPACE_PRESERVING_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}
