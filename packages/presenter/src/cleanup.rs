//! Cleanup passes run after data has been bound to a document.

use stringdoc::{Document, NodeId};
use tracing::{debug, instrument};

use crate::versioned_view::DEFAULT_VERSION;

/// Removes `nodes` and returns how many were still attached.
fn remove_all(document: &mut Document, nodes: Vec<NodeId>) -> usize {
    let mut removed = 0;
    for node in nodes {
        if document.contains(document.resolve(node)) {
            document.remove_node(node);
            removed += 1;
        }
    }
    removed
}

/// Removes every significant node labeled with a version other than the default.
#[instrument(skip(document))]
pub fn remove_unused_versions(document: &mut Document) -> usize {
    let unused: Vec<NodeId> = document
        .each()
        .filter(|id| {
            document.node(*id).is_some_and(|node| {
                node.has_significance()
                    && node
                        .label("version")
                        .is_some_and(|version| *version != DEFAULT_VERSION)
            })
        })
        .collect();

    let removed = remove_all(document, unused);
    debug!(removed, "Removed unused versions");
    removed
}

/// Removes every binding that was not labeled `used`.
#[instrument(skip(document))]
pub fn remove_unused_bindings(document: &mut Document) -> usize {
    let unused: Vec<NodeId> = document
        .each_significant_node("binding")
        .filter(|id| document.node(*id).is_some_and(|node| !node.is_labeled("used")))
        .collect();

    let removed = remove_all(document, unused);
    debug!(removed, "Removed unused bindings");
    removed
}

/// Removes the nodes whose `mode` label names a mode other than `mode`.
#[instrument(skip(document))]
pub fn place_in_mode(document: &mut Document, mode: &str) -> usize {
    let elsewhere: Vec<NodeId> = document
        .each_significant_node("mode")
        .filter(|id| {
            document
                .node(*id)
                .and_then(|node| node.label("mode"))
                .is_some_and(|label| *label != mode)
        })
        .collect();

    let removed = remove_all(document, elsewhere);
    debug!(removed, "Placed in mode");
    removed
}

/// Runs the cleanup that follows a render: unused bindings (skipped while
/// rendering a prototype), then unused versions.
pub fn cleanup_unused_nodes(document: &mut Document, prototype: bool) -> usize {
    let mut removed = 0;
    if !prototype {
        removed += remove_unused_bindings(document);
    }
    removed + remove_unused_versions(document)
}
