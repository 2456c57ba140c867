//! # StringDoc
//!
//! A document engine for HTML templates that keeps only the *significant*
//! parts of the markup addressable (bindings, containers, components, forms)
//! and folds everything else into literal strings when parsing.
//!
//! ## Overview
//!
//! ```text
//! HTML → Parser (significance registry) → Document
//!      → traversal / mutation / transformations
//!      → render → HTML
//! ```
//!
//! A template is parsed once and kept pristine. Each render works on a
//! [`Document::duplicate`], so concurrent renders never see each other's edits.
//!
//! ```
//! use stringdoc::{Document, Priority, Transformed};
//!
//! let mut doc =
//!     Document::parse(r#"<article binding="post"><h1 binding="title">x</h1></article>"#);
//! let title = doc.find_first_significant_node("prop").unwrap();
//! doc.transform(title, Priority::Default, |_, _| Ok(Transformed::Delete));
//!
//! assert_eq!(doc.render(), r#"<article data-b="post" data-c="article"></article>"#);
//! ```

pub mod attributes;
pub mod document;
pub mod error;
pub mod labels;
pub mod mutation;
pub mod node;
pub mod parser;
pub mod render;
pub mod significance;
pub mod transform;
pub mod traversal;


#[cfg(test)]
mod tests_traversal;


#[cfg(test)]
mod tests_rendering;


pub use attributes::Attributes;
pub use document::{Document, Mode};
pub use error::{Result, StringDocError};
pub use labels::{LabelValue, Labels};
pub use mutation::Insertable;
pub use node::{Node, NodeId, NodeKind};
pub use parser::{ParseOptions, Parser, DEFAULT_CONTAINER, SEMANTIC_TAGS};
pub use render::{ErrorHandler, RenderOptions};
pub use significance::{registry, significant, SignificanceRegistry, SignificanceType};
pub use transform::{AttributesTransformation, Env, Priority, Transformation, Transformed};
pub use traversal::Walk;

// Re-exported so predicates can be written without depending on the markup crate.
pub use stringdoc_markup::{MarkupKind, MarkupNode};
