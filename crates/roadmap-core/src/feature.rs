//! Feature: a submitted request and the identities that voted for it.

use std::collections::BTreeSet;

use crate::identity::VoterId;
use crate::types::{CreatedOrder, FeatureId};
use crate::validation::Title;

/// A feature request.
///
/// The score is derived from the voter set, so `score() == voters().len()`
/// holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    id: FeatureId,
    title: Title,
    released: bool,
    created_order: CreatedOrder,
    voters: BTreeSet<VoterId>,
}

impl Feature {
    /// A freshly created feature: unreleased, no voters.
    pub fn new(id: FeatureId, title: Title, created_order: CreatedOrder) -> Self {
        Self {
            id,
            title,
            released: false,
            created_order,
            voters: BTreeSet::new(),
        }
    }

    /// Rebuild a feature from persisted parts.
    pub fn restore(
        id: FeatureId,
        title: Title,
        created_order: CreatedOrder,
        released: bool,
        voters: BTreeSet<VoterId>,
    ) -> Self {
        Self {
            id,
            title,
            released,
            created_order,
            voters,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Number of distinct voters.
    pub fn score(&self) -> u64 {
        self.voters.len() as u64
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn created_order(&self) -> CreatedOrder {
        self.created_order
    }

    pub fn voters(&self) -> &BTreeSet<VoterId> {
        &self.voters
    }

    pub fn has_voted(&self, voter: &VoterId) -> bool {
        self.voters.contains(voter)
    }

    /// Add a voter. Returns `false` if the identity had already voted.
    ///
    /// For storage backends applying a vote under their own lock. Callers
    /// outside a store go through `Store::add_voter`, which is atomic.
    pub fn add_voter(&mut self, voter: VoterId) -> bool {
        self.voters.insert(voter)
    }

    /// For storage backends; everyone else uses `Store::set_released`.
    pub fn set_released(&mut self, released: bool) {
        self.released = released;
    }
}

/// Result of the store's atomic voter-add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// The identity had already voted; nothing changed.
    pub already_voted: bool,
    /// The feature as it stands after the add.
    pub feature: Feature,
}

impl VoteOutcome {
    /// Score after the add.
    pub fn score(&self) -> u64 {
        self.feature.score()
    }
}
