//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use roadmap_core::{CreatedOrder, Feature, FeatureId, Title, VoteOutcome, VoterId};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// operation takes the lock once, which makes each one atomic.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Features indexed by id.
    features: HashMap<FeatureId, Feature>,

    /// Next creation order to hand out.
    next_order: CreatedOrder,
}

impl MemoryStoreInner {
    fn insert_new(&mut self, title: &Title) -> &mut Feature {
        let mut id = FeatureId::generate();
        while self.features.contains_key(&id) {
            id = FeatureId::generate();
        }

        let order = self.next_order;
        self.next_order = order.next();

        self.features
            .entry(id)
            .or_insert_with(|| Feature::new(id, title.clone(), order))
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                features: HashMap::new(),
                next_order: CreatedOrder::FIRST,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_feature(&self, title: &Title) -> Result<Feature> {
        let mut inner = self.write()?;
        Ok(inner.insert_new(title).clone())
    }

    async fn create_feature_with_vote(&self, title: &Title, creator: &VoterId) -> Result<Feature> {
        let mut inner = self.write()?;
        let feature = inner.insert_new(title);
        feature.add_voter(creator.clone());
        Ok(feature.clone())
    }

    async fn get_feature(&self, id: &FeatureId) -> Result<Option<Feature>> {
        let inner = self.read()?;
        Ok(inner.features.get(id).cloned())
    }

    async fn list_features(&self) -> Result<Vec<Feature>> {
        let inner = self.read()?;
        Ok(inner.features.values().cloned().collect())
    }

    async fn feature_count(&self) -> Result<usize> {
        Ok(self.read()?.features.len())
    }

    async fn add_voter(&self, id: &FeatureId, voter: &VoterId) -> Result<Option<VoteOutcome>> {
        let mut inner = self.write()?;

        let Some(feature) = inner.features.get_mut(id) else {
            return Ok(None);
        };

        let added = feature.add_voter(voter.clone());
        debug!(feature_id = %id, score = feature.score(), added, "memory add_voter");

        Ok(Some(VoteOutcome {
            already_voted: !added,
            feature: feature.clone(),
        }))
    }

    async fn set_released(&self, id: &FeatureId, released: bool) -> Result<Option<Feature>> {
        let mut inner = self.write()?;
        Ok(inner.features.get_mut(id).map(|feature| {
            feature.set_released(released);
            feature.clone()
        }))
    }

    async fn flush_all(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.features.clear();
        inner.next_order = CreatedOrder::FIRST;
        Ok(())
    }
}
