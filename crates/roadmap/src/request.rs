//! Boundary payloads.
//!
//! Whatever transport sits in front of the engine decodes caller input into
//! these structs. Validation happens here, before anything reaches the store.

use serde::{Deserialize, Serialize};

use roadmap_core::{FeatureId, IdentityResolver, Title, VoterId};

use crate::error::Result;

/// A caller asking for a new feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    /// Caller origin token, e.g. a forwarded-for header value.
    #[serde(default)]
    pub origin: Option<String>,
}

/// A caller voting for an existing feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub feature_id: FeatureId,
    #[serde(default)]
    pub origin: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    pub title: Title,
    pub creator: VoterId,
}

impl CreateRequest {
    pub fn new(title: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            origin: Some(origin.into()),
        }
    }

    /// Check the title and resolve the creator identity.
    pub fn validate(&self, resolver: &IdentityResolver) -> Result<ValidatedCreate> {
        let title = Title::parse(self.title.as_str())?;
        let creator = resolver.resolve(self.origin.as_deref())?;
        Ok(ValidatedCreate { title, creator })
    }
}

impl VoteRequest {
    pub fn new(feature_id: FeatureId, origin: impl Into<String>) -> Self {
        Self {
            feature_id,
            origin: Some(origin.into()),
        }
    }

    /// Resolve the voter identity.
    pub fn voter(&self, resolver: &IdentityResolver) -> Result<VoterId> {
        Ok(resolver.resolve(self.origin.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use roadmap_core::{IdentityError, ValidationError};

    #[test]
    fn test_validate_ok() {
        let req = CreateRequest::new("Hello World.", "::ffff:10.1.2.3");
        let valid = req.validate(&IdentityResolver::default()).unwrap();
        assert_eq!(valid.title.as_str(), "Hello World.");
        assert_eq!(valid.creator.as_str(), "10.1.2.3");
    }

    #[test]
    fn test_validate_title_before_identity() {
        let req = CreateRequest {
            title: "x".repeat(151),
            origin: None,
        };
        let err = req.validate(&IdentityResolver::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::TitleTooLong { .. })
        ));
    }

    #[test]
    fn test_missing_origin() {
        let req = CreateRequest {
            title: "Dark mode".into(),
            origin: None,
        };
        let err = req.validate(&IdentityResolver::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidIdentity(IdentityError::Missing)
        ));
    }

    #[test]
    fn test_vote_request_decodes_hex_id() {
        let json = r#"{"feature_id":"0101010101010101010101010101010a","origin":"10.0.0.9"}"#;
        let req: VoteRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.feature_id.to_hex(), "0101010101010101010101010101010a");
        let voter = req.voter(&IdentityResolver::default()).unwrap();
        assert_eq!(voter.as_str(), "10.0.0.9");
    }

    #[test]
    fn test_vote_request_rejects_bad_id() {
        let json = r#"{"feature_id":"nope"}"#;
        assert!(serde_json::from_str::<VoteRequest>(json).is_err());
    }
}
