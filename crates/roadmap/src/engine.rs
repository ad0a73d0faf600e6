//! The Engine: ranking and deduplicated voting over a [`Store`].
//!
//! The engine holds no feature state of its own. Every call re-reads the
//! store, and every mutation is one of the store's atomic primitives, so any
//! number of engine calls may run concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use roadmap_core::{
    assemble, rank, Feature, FeatureId, IdentityMode, IdentityResolver, RankedFeature, Title,
    VoterId,
};
use roadmap_store::Store;

use crate::error::{EngineError, Result};
use crate::request::{CreateRequest, VoteRequest};

/// Configuration for the Engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on any single store call.
    pub op_timeout: Duration,
    /// How origin tokens become voter identities.
    pub identity_mode: IdentityMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
            identity_mode: IdentityMode::Plain,
        }
    }
}

/// The main Engine struct.
///
/// Provides a unified API for:
/// - Creating feature requests (auto-voted by their creator)
/// - Voting, idempotently per voter identity
/// - Releasing features
/// - Reading the ranked list
/// - Flushing all state
pub struct Engine<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Origin token normalization.
    resolver: IdentityResolver,
    /// Configuration.
    config: EngineConfig,
}

impl<S: Store> Engine<S> {
    /// Create a new engine instance.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create an engine over a store that is shared with other owners.
    pub fn from_shared(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            resolver: IdentityResolver::new(config.identity_mode),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize a caller origin token into a voter identity.
    pub fn resolve_identity(&self, token: Option<&str>) -> Result<VoterId> {
        Ok(self.resolver.resolve(token)?)
    }

    /// Await a store call, giving up after `op_timeout`.
    ///
    /// A write that times out may still land; it is atomic in the store, so
    /// it is either fully applied or not at all.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = roadmap_store::Result<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(_) => {
                warn!(op, timeout = ?self.config.op_timeout, "store call timed out");
                Err(EngineError::StoreUnavailable(format!(
                    "{} timed out after {:?}",
                    op, self.config.op_timeout
                )))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ranking Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a feature. The creator's vote is recorded in the same step, so
    /// the feature is never visible with a score of zero.
    pub async fn create_feature(&self, title: &str, creator: &VoterId) -> Result<Feature> {
        let title = Title::parse(title)?;
        self.create_titled(&title, creator).await
    }

    async fn create_titled(&self, title: &Title, creator: &VoterId) -> Result<Feature> {
        let feature = self
            .bounded(
                "create_feature",
                self.store.create_feature_with_vote(title, creator),
            )
            .await?;

        info!(feature_id = %feature.id(), score = feature.score(), "feature created");
        Ok(feature)
    }

    /// Vote for a feature.
    ///
    /// Voting twice with the same identity is a successful no-op that returns
    /// the unchanged feature.
    pub async fn vote(&self, id: &FeatureId, voter: &VoterId) -> Result<Feature> {
        let outcome = self
            .bounded("vote", self.store.add_voter(id, voter))
            .await?
            .ok_or(EngineError::NotFound(*id))?;

        debug!(
            feature_id = %id,
            score = outcome.score(),
            already_voted = outcome.already_voted,
            "vote recorded"
        );
        Ok(outcome.feature)
    }

    /// Mark a feature as released. Idempotent.
    pub async fn release(&self, id: &FeatureId) -> Result<Feature> {
        self.set_released(id, true).await
    }

    /// Set or clear the released flag.
    pub async fn set_released(&self, id: &FeatureId, released: bool) -> Result<Feature> {
        let feature = self
            .bounded("set_released", self.store.set_released(id, released))
            .await?
            .ok_or(EngineError::NotFound(*id))?;

        info!(feature_id = %id, released, "release flag set");
        Ok(feature)
    }

    /// Get a single feature.
    pub async fn get_feature(&self, id: &FeatureId) -> Result<Feature> {
        self.bounded("get_feature", self.store.get_feature(id))
            .await?
            .ok_or(EngineError::NotFound(*id))
    }

    /// All features by descending score, ties by ascending creation order.
    pub async fn ranked_list(&self) -> Result<Vec<Feature>> {
        let features = self
            .bounded("list_features", self.store.list_features())
            .await?;
        debug!(count = features.len(), "ranking features");
        Ok(rank(features))
    }

    /// The ranked list in client-facing shape, with positions.
    pub async fn snapshot(&self) -> Result<Vec<RankedFeature>> {
        Ok(assemble(self.ranked_list().await?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Wipe every feature and reset the creation order. Idempotent.
    pub async fn flush_all(&self) -> Result<()> {
        self.bounded("flush_all", self.store.flush_all()).await?;
        info!("all features flushed");
        Ok(())
    }

    /// Number of stored features.
    pub async fn feature_count(&self) -> Result<usize> {
        self.bounded("feature_count", self.store.feature_count())
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Boundary Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a create request from the boundary layer.
    pub async fn submit(&self, request: &CreateRequest) -> Result<Feature> {
        let valid = request.validate(&self.resolver)?;
        self.create_titled(&valid.title, &valid.creator).await
    }

    /// Handle a vote request from the boundary layer.
    pub async fn cast(&self, request: &VoteRequest) -> Result<Feature> {
        let voter = request.voter(&self.resolver)?;
        self.vote(&request.feature_id, &voter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roadmap_core::{ValidationError, VoteOutcome};
    use roadmap_store::MemoryStore;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(MemoryStore::new(), EngineConfig::default())
    }

    fn voter(s: &str) -> VoterId {
        VoterId::from_normalized(s)
    }

    #[tokio::test]
    async fn test_create_auto_votes() {
        let engine = engine();
        let f = engine.create_feature("Dark mode", &voter("a")).await.unwrap();

        assert_eq!(f.score(), 1);
        assert!(f.has_voted(&voter("a")));
        assert!(!f.is_released());
    }

    #[tokio::test]
    async fn test_create_rejects_long_title() {
        let engine = engine();
        let err = engine
            .create_feature(&"x".repeat(151), &voter("a"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::TitleTooLong { .. })
        ));
        assert_eq!(engine.feature_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_creator_vote_again_is_noop() {
        let engine = engine();
        let f = engine.create_feature("Dark mode", &voter("a")).await.unwrap();
        let again = engine.vote(&f.id(), &voter("a")).await.unwrap();
        assert_eq!(again.score(), 1);
    }

    #[tokio::test]
    async fn test_vote_unknown_feature() {
        let engine = engine();
        engine.create_feature("Dark mode", &voter("a")).await.unwrap();
        let before = engine.snapshot().await.unwrap();

        let missing = FeatureId::from_bytes([0xee; 16]);
        let err = engine.vote(&missing, &voter("b")).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(id) if id == missing));

        assert_eq!(engine.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_release_twice() {
        let engine = engine();
        let f = engine.create_feature("Dark mode", &voter("a")).await.unwrap();

        assert!(engine.release(&f.id()).await.unwrap().is_released());
        assert!(engine.release(&f.id()).await.unwrap().is_released());

        let unreleased = engine.set_released(&f.id(), false).await.unwrap();
        assert!(!unreleased.is_released());
    }

    #[tokio::test]
    async fn test_release_unknown_feature() {
        let engine = engine();
        let missing = FeatureId::from_bytes([0xee; 16]);
        assert!(matches!(
            engine.release(&missing).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.get_feature(&missing).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_and_cast_resolve_identity() {
        let engine = engine();
        let f = engine
            .submit(&CreateRequest::new("Hello World.", "::ffff:127.0.0.1"))
            .await
            .unwrap();

        // Same caller behind a proxy: still the same identity.
        let same = engine
            .cast(&VoteRequest::new(f.id(), "127.0.0.1, 10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(same.score(), 1);

        let other = engine
            .cast(&VoteRequest::new(f.id(), "127.0.0.2"))
            .await
            .unwrap();
        assert_eq!(other.score(), 2);
    }

    #[tokio::test]
    async fn test_cast_without_origin() {
        let engine = engine();
        let f = engine.create_feature("Dark mode", &voter("a")).await.unwrap();
        let request = VoteRequest {
            feature_id: f.id(),
            origin: None,
        };
        assert!(matches!(
            engine.cast(&request).await,
            Err(EngineError::InvalidIdentity(_))
        ));
    }

    #[tokio::test]
    async fn test_hashed_identities() {
        let engine = Engine::new(
            MemoryStore::new(),
            EngineConfig {
                identity_mode: IdentityMode::Hashed,
                ..EngineConfig::default()
            },
        );
        let f = engine
            .submit(&CreateRequest::new("Dark mode", "192.0.2.1"))
            .await
            .unwrap();

        let stored = f.voters().iter().next().unwrap();
        assert_ne!(stored.as_str(), "192.0.2.1");

        let again = engine
            .cast(&VoteRequest::new(f.id(), "192.0.2.1"))
            .await
            .unwrap();
        assert_eq!(again.score(), 1);
    }

    /// A store whose votes never come back in time.
    struct SlowVotes(MemoryStore);

    #[async_trait]
    impl Store for SlowVotes {
        async fn create_feature(&self, title: &Title) -> roadmap_store::Result<Feature> {
            self.0.create_feature(title).await
        }

        async fn create_feature_with_vote(
            &self,
            title: &Title,
            creator: &VoterId,
        ) -> roadmap_store::Result<Feature> {
            self.0.create_feature_with_vote(title, creator).await
        }

        async fn get_feature(&self, id: &FeatureId) -> roadmap_store::Result<Option<Feature>> {
            self.0.get_feature(id).await
        }

        async fn list_features(&self) -> roadmap_store::Result<Vec<Feature>> {
            self.0.list_features().await
        }

        async fn feature_count(&self) -> roadmap_store::Result<usize> {
            self.0.feature_count().await
        }

        async fn add_voter(
            &self,
            _id: &FeatureId,
            _voter: &VoterId,
        ) -> roadmap_store::Result<Option<VoteOutcome>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set_released(
            &self,
            id: &FeatureId,
            released: bool,
        ) -> roadmap_store::Result<Option<Feature>> {
            self.0.set_released(id, released).await
        }

        async fn flush_all(&self) -> roadmap_store::Result<()> {
            self.0.flush_all().await
        }
    }

    #[tokio::test]
    async fn test_timeout_surfaces_store_unavailable() {
        let engine = Engine::new(
            SlowVotes(MemoryStore::new()),
            EngineConfig {
                op_timeout: Duration::from_millis(20),
                ..EngineConfig::default()
            },
        );
        let f = engine.create_feature("Dark mode", &voter("a")).await.unwrap();

        let err = engine.vote(&f.id(), &voter("b")).await.unwrap_err();
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
        assert!(err.is_retryable());

        // Nothing half-applied.
        assert_eq!(engine.get_feature(&f.id()).await.unwrap().score(), 1);
    }
}
