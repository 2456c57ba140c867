//! # Versioned Views
//!
//! A template can hold several alternatives for the same binding, told apart
//! by their `version` attribute:
//!
//! ```html
//! <p binding="notice">You have messages</p>
//! <p binding="notice" version="empty">Nothing here</p>
//! ```
//!
//! A [`VersionedView`] tracks such a group. Using a version strips its
//! `version` label, marks it `used` and removes every other alternative.
//! Node ids are resolved on each call, so the same view works on mutable and
//! immutable documents.

use stringdoc::{Document, NodeId};
use tracing::{debug, instrument};

use crate::error::{PresenterError, Result};

/// Version of a node without a `version` label.
pub const DEFAULT_VERSION: &str = "default";

/// Version label of `node`, or [`DEFAULT_VERSION`].
pub fn version_of(document: &Document, node: NodeId) -> &str {
    document
        .node(document.resolve(node))
        .and_then(|node| node.label("version"))
        .and_then(|label| label.as_str())
        .unwrap_or(DEFAULT_VERSION)
}

#[derive(Debug, Clone)]
pub struct VersionedView {
    versions: Vec<NodeId>,
    working: Option<NodeId>,
    used: bool,
}

impl VersionedView {
    /// Groups `versions`; the working version is the default one, else the first.
    pub fn new(document: &Document, versions: Vec<NodeId>) -> Result<Self> {
        let versions: Vec<NodeId> = versions
            .into_iter()
            .map(|id| document.resolve(id))
            .collect();

        if versions.is_empty() {
            return Err(PresenterError::NoVersions);
        }

        if let Some(detached) = versions.iter().find(|id| !document.contains(**id)) {
            return Err(PresenterError::DetachedNode(*detached));
        }

        let working = versions
            .iter()
            .find(|id| version_of(document, **id) == DEFAULT_VERSION)
            .or_else(|| versions.first())
            .copied();

        Ok(Self {
            versions,
            working,
            used: false,
        })
    }

    /// Groups the siblings bound to `name` that share a parent with the first one.
    pub fn for_binding(document: &Document, name: &str) -> Result<Self> {
        let found = document.find_significant_nodes_with_name_without_descending("binding", name);
        let Some(first) = found.first() else {
            return Err(PresenterError::UnknownBinding(name.to_string()));
        };

        let parent = document.parent_of(*first);
        let siblings = found
            .iter()
            .copied()
            .filter(|id| document.parent_of(*id) == parent)
            .collect();

        Self::new(document, siblings)
    }

    /// The versions still in the group.
    pub fn versions(&self) -> &[NodeId] {
        &self.versions
    }

    /// The version that will be presented, if any is left.
    pub fn working(&self) -> Option<NodeId> {
        self.working
    }

    pub fn is_versioned(&self) -> bool {
        self.versions.len() > 1
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn has_version(&self, document: &Document, version: &str) -> bool {
        self.versioned(document, version).is_some()
    }

    /// The node of `version`, resolved to its current id.
    pub fn versioned(&self, document: &Document, version: &str) -> Option<NodeId> {
        self.versions
            .iter()
            .map(|id| document.resolve(*id))
            .find(|id| version_of(document, *id) == version)
    }

    /// Keeps `version` and removes every other version from `document`.
    ///
    /// If `version` does not exist, every version is removed.
    #[instrument(skip(self, document), fields(versions = self.versions.len()))]
    pub fn use_version(&mut self, document: &mut Document, version: &str) -> &mut Self {
        self.used = true;

        let Some(chosen) = self.versioned(document, version) else {
            debug!(version, "Version not found, removing all versions");
            for id in self.versions.drain(..) {
                document.remove_node(id);
            }
            self.working = None;
            return self;
        };

        for id in &self.versions {
            if document.resolve(*id) != chosen {
                document.remove_node(*id);
            }
        }

        document
            .delete_node_label(chosen, "version")
            .set_node_label(chosen, "used", true);

        let chosen = document.resolve(chosen);
        self.versions = vec![chosen];
        self.working = Some(chosen);
        self
    }

    /// Uses the working version chosen when the group was built.
    pub fn use_default(&mut self, document: &mut Document) -> &mut Self {
        let version = self
            .working
            .map(|id| version_of(document, id).to_string())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        self.use_version(document, &version)
    }
}
