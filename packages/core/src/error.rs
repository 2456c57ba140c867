//! Error types for the engine
//!
//! Only programming errors surface here. Missing mutation targets are
//! silent no-ops and transformation failures are contained by the renderer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StringDocError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StringDocError {
    #[error("Significance already registered: {0}")]
    DuplicateSignificance(String),

    #[error("Significance name must not be empty")]
    EmptySignificanceName,
}
