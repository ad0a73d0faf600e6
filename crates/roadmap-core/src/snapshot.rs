//! Client-facing view of the ranked list.
//!
//! Positions are never stored. They are computed on read from the ranked
//! sequence, because every vote can move them.

use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::types::FeatureId;
use crate::validation::Title;

/// One row of the ranked list as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub id: FeatureId,
    pub title: Title,
    pub score: u64,
    pub released: bool,
    /// 0-based rank at the time of the read.
    pub position: usize,
}

/// Convert an already-ranked sequence into client rows.
pub fn assemble(ranked: impl IntoIterator<Item = Feature>) -> Vec<RankedFeature> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(position, feature)| RankedFeature {
            id: feature.id(),
            score: feature.score(),
            released: feature.is_released(),
            title: feature.title().clone(),
            position,
        })
        .collect()
}
