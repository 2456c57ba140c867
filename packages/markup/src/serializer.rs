//! Literal serialization of markup subtrees.

use crate::tree::{ElementData, MarkupKind, MarkupNode};
use crate::{is_raw_text_element, is_void_element};

/// How whitespace-only text is treated while serializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    /// Emit every text node as parsed.
    Preserve,
    /// Skip whitespace-only text outside of `pre`, `textarea`, `script` and `style`.
    #[default]
    DropBlank,
}

pub(crate) fn write_node(node: &MarkupNode<'_>, whitespace: Whitespace, output: &mut String) {
    match node.kind() {
        MarkupKind::Element(element) => {
            let traced = match node.raw() {
                Some(raw) => {
                    output.push_str(raw);
                    true
                }
                None => {
                    write_start_tag(element, node.has_children(), output);
                    false
                }
            };

            if is_void_element(&element.name) || (element.self_closing && !node.has_children()) {
                return;
            }

            for child in node.children() {
                write_node(&child, whitespace, output);
            }

            match node.raw_close() {
                Some(raw) => output.push_str(raw),
                // Left open in the source
                None if traced => {}
                None => {
                    output.push_str("</");
                    output.push_str(&element.name);
                    output.push('>');
                }
            }
        }
        MarkupKind::Text(text) => {
            if whitespace == Whitespace::DropBlank && node.is_blank_text() {
                return;
            }

            if let Some(raw) = node.raw() {
                output.push_str(raw);
                return;
            }

            let raw = node
                .parent()
                .and_then(|parent| parent.name())
                .map(is_raw_text_element)
                .unwrap_or(false);

            if raw {
                output.push_str(text);
            } else {
                output.push_str(&escape_text(text));
            }
        }
        MarkupKind::Comment(text) => match node.raw() {
            Some(raw) => output.push_str(raw),
            None => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
        },
        MarkupKind::Doctype(name) => match node.raw() {
            Some(raw) => output.push_str(raw),
            None => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        },
    }
}

fn write_start_tag(element: &ElementData, has_children: bool, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);
    for attribute in &element.attributes {
        output.push(' ');
        output.push_str(&attribute.name);
        if attribute.valueless && attribute.value.is_empty() {
            continue;
        }
        output.push_str("=\"");
        output.push_str(&escape_attribute(&attribute.value));
        output.push('"');
    }

    if element.self_closing && !has_children && !is_void_element(&element.name) {
        output.push_str("/>");
    } else {
        output.push('>');
    }
}

/// Escapes text content.
pub fn escape_text(text: &str) -> String {
    if !text.contains(['&', '<', '>']) {
        return text.to_string();
    }

    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes an attribute value for use inside double quotes.
///
/// Single quotes are left alone: they cannot end a double-quoted value.
pub fn escape_attribute(value: &str) -> String {
    if !value.contains(['&', '<', '>', '"']) {
        return value.to_string();
    }

    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
