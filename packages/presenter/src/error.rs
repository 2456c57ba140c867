use stringdoc::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PresenterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresenterError {
    #[error("A versioned view needs at least one version")]
    NoVersions,

    #[error("Node {0} is not part of the document")]
    DetachedNode(NodeId),

    #[error("No binding named {0}")]
    UnknownBinding(String),
}
