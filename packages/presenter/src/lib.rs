//! # StringDoc Presenter
//!
//! Presentation helpers that sit on top of a parsed [`stringdoc::Document`]
//! and only use its public operations:
//!
//! - [`VersionedView`] picks one of several alternative versions of a binding
//!   and removes the others.
//! - [`cleanup`] removes what a render left unused: bindings nobody marked as
//!   used, non-default versions, and nodes meant for another mode.

pub mod cleanup;
pub mod error;
pub mod versioned_view;

pub use cleanup::{
    cleanup_unused_nodes, place_in_mode, remove_unused_bindings, remove_unused_versions,
};
pub use error::{PresenterError, Result};
pub use versioned_view::{version_of, VersionedView, DEFAULT_VERSION};
