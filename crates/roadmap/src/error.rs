//! Error types for the engine.

use roadmap_core::{FeatureId, IdentityError, ValidationError};
use roadmap_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad title. The message is shown to the caller as is.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or unusable voter token.
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// No feature with this id.
    #[error("feature not found: {0}")]
    NotFound(FeatureId),

    /// Storage failed or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl EngineError {
    /// Whether the caller may retry. Only storage failures qualify; vote,
    /// release and flush are safe to repeat, create may duplicate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StoreUnavailable(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
