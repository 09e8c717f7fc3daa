//! Failure taxonomy surfaced by the loaders.
use thiserror::Error;

/// Why a remote resource could not be loaded.
///
/// The message is user-facing and is what a screen shows verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ResourceUnavailable(String),
    #[error("{0}")]
    MalformedResponse(String),
}

impl LoadError {
    /// Return the user-facing message carried by the error.
    pub fn message(&self) -> &str {
        match self {
            LoadError::NotFound(msg)
            | LoadError::ResourceUnavailable(msg)
            | LoadError::MalformedResponse(msg) => msg,
        }
    }

    /// Stable identifier for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::NotFound(_) => "not_found",
            LoadError::ResourceUnavailable(_) => "resource_unavailable",
            LoadError::MalformedResponse(_) => "malformed_response",
        }
    }
}
