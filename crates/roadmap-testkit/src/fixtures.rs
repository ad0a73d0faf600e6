//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use roadmap::{CreateRequest, Engine, EngineConfig, Feature, FeatureId, VoteRequest};
use roadmap_store::{MemoryStore, SqliteStore, Store};

/// The origin token of numbered caller `n`.
///
/// Distinct numbers always give distinct identities.
pub fn origin(n: usize) -> String {
    format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff)
}

/// A test fixture with an engine over a store.
pub struct TestFixture<S: Store = MemoryStore> {
    pub engine: Engine<S>,
}

impl TestFixture<MemoryStore> {
    /// Engine over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl TestFixture<SqliteStore> {
    /// Engine over a fresh in-memory SQLite database.
    pub fn sqlite() -> Self {
        let store = SqliteStore::open_memory().expect("in-memory sqlite");
        Self::with_store(store)
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestFixture<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            engine: Engine::new(store, EngineConfig::default()),
        }
    }

    /// Create a feature as caller `creator`.
    pub async fn create(&self, title: &str, creator: usize) -> Feature {
        self.engine
            .submit(&CreateRequest::new(title, origin(creator)))
            .await
            .expect("create feature")
    }

    /// Vote as caller `voter`.
    pub async fn vote(&self, id: FeatureId, voter: usize) -> Feature {
        self.engine
            .cast(&VoteRequest::new(id, origin(voter)))
            .await
            .expect("vote")
    }

    /// Create features in order, each followed by `extra` votes from
    /// callers that are not the creator.
    ///
    /// Caller 0 creates everything; extra votes come from callers 1..=extra.
    pub async fn seed(&self, features: &[(&str, usize)]) -> Vec<FeatureId> {
        let mut ids = Vec::with_capacity(features.len());
        for (title, extra) in features {
            let feature = self.create(title, 0).await;
            for voter in 1..=*extra {
                self.vote(feature.id(), voter).await;
            }
            ids.push(feature.id());
        }
        ids
    }

    /// Ranked `(title, score)` pairs.
    pub async fn ranked_titles(&self) -> Vec<(String, u64)> {
        self.engine
            .snapshot()
            .await
            .expect("snapshot")
            .into_iter()
            .map(|row| (row.title.into_inner(), row.score))
            .collect()
    }
}
