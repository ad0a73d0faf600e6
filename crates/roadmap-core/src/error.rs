//! Error types for the roadmap core.

use thiserror::Error;

/// Title validation errors.
///
/// These are caller mistakes: surfaced immediately, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    /// The display text is shown to end users verbatim.
    #[error("Max {max} characters please.")]
    TitleTooLong { len: usize, max: usize },

    #[error("malformed feature id: {0}")]
    MalformedId(String),
}

/// Errors resolving a voter identity from a caller origin token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("missing origin token")]
    Missing,

    #[error("origin token is empty after normalization")]
    Empty,
}
