//! Store trait: the abstract interface for feature persistence.
//!
//! This trait allows the engine to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use roadmap_core::{Feature, FeatureId, Title, VoteOutcome, VoterId};

use crate::error::Result;

/// The Store trait: async interface for feature persistence.
///
/// The store owns the canonical feature records. Every mutation goes through
/// one of the primitives below, each of which is atomic on its own.
///
/// # Design Notes
///
/// - **Set-union voting**: `add_voter` inserts into the voter set or does
///   nothing. Check and increment happen in one step inside the store.
/// - **Creation order**: allocated from a counter that only grows. It is
///   reset by `flush_all` and nothing else.
/// - **Snapshots**: `list_features` reads every feature in one consistent view.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Feature Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a feature with no voters.
    ///
    /// Allocates the id and the creation order.
    async fn create_feature(&self, title: &Title) -> Result<Feature>;

    /// Create a feature with `creator` already in its voter set.
    ///
    /// Creation and vote happen in a single step, so no reader can observe
    /// the new feature with a score of zero.
    async fn create_feature_with_vote(&self, title: &Title, creator: &VoterId) -> Result<Feature>;

    /// Get a feature by id.
    async fn get_feature(&self, id: &FeatureId) -> Result<Option<Feature>>;

    /// List all features, in no particular order.
    async fn list_features(&self) -> Result<Vec<Feature>>;

    /// Number of stored features.
    async fn feature_count(&self) -> Result<usize>;

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add `voter` to the feature's voter set.
    ///
    /// # Returns
    /// - `None` if the feature does not exist.
    /// - `already_voted = true` with the unchanged feature if `voter` is
    ///   already in the set.
    /// - `already_voted = false` with the updated feature otherwise.
    async fn add_voter(&self, id: &FeatureId, voter: &VoterId) -> Result<Option<VoteOutcome>>;

    /// Set the released flag. Returns `None` if the feature does not exist.
    async fn set_released(&self, id: &FeatureId, released: bool) -> Result<Option<Feature>>;

    /// Delete every feature and reset the creation-order counter.
    async fn flush_all(&self) -> Result<()>;
}

/// Shared handles forward to the underlying store.
#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn create_feature(&self, title: &Title) -> Result<Feature> {
        (**self).create_feature(title).await
    }

    async fn create_feature_with_vote(&self, title: &Title, creator: &VoterId) -> Result<Feature> {
        (**self).create_feature_with_vote(title, creator).await
    }

    async fn get_feature(&self, id: &FeatureId) -> Result<Option<Feature>> {
        (**self).get_feature(id).await
    }

    async fn list_features(&self) -> Result<Vec<Feature>> {
        (**self).list_features().await
    }

    async fn feature_count(&self) -> Result<usize> {
        (**self).feature_count().await
    }

    async fn add_voter(&self, id: &FeatureId, voter: &VoterId) -> Result<Option<VoteOutcome>> {
        (**self).add_voter(id, voter).await
    }

    async fn set_released(&self, id: &FeatureId, released: bool) -> Result<Option<Feature>> {
        (**self).set_released(id, released).await
    }

    async fn flush_all(&self) -> Result<()> {
        (**self).flush_all().await
    }
}
