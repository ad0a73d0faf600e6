//! Priority ordering.
//!
//! Features rank by descending score. Equal scores fall back to ascending
//! creation order, so the earlier request stays ahead. The id is a last resort
//! that only matters if two records somehow share a creation order; it keeps
//! the comparator total so the same input always sorts the same way.

use std::cmp::Ordering;

use crate::feature::Feature;

/// Total order used for the ranked list.
pub fn ranking_order(a: &Feature, b: &Feature) -> Ordering {
    b.score()
        .cmp(&a.score())
        .then_with(|| a.created_order().cmp(&b.created_order()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sort features into ranked order.
pub fn rank(mut features: Vec<Feature>) -> Vec<Feature> {
    features.sort_by(ranking_order);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::VoterId;
    use crate::types::{CreatedOrder, FeatureId};
    use crate::validation::Title;
    use proptest::prelude::*;

    fn feature(order: u64, votes: u64) -> Feature {
        let mut f = Feature::new(
            FeatureId::from_bytes([order as u8; 16]),
            Title::parse(format!("feature {order}")).unwrap(),
            CreatedOrder::from_raw(order),
        );
        for v in 0..votes {
            f.add_voter(VoterId::from_normalized(format!("voter-{v}")));
        }
        f
    }

    fn orders(features: &[Feature]) -> Vec<u64> {
        features.iter().map(|f| f.created_order().as_raw()).collect()
    }

    #[test]
    fn test_ties_keep_creation_order() {
        let ranked = rank(vec![feature(3, 1), feature(1, 1), feature(2, 1)]);
        assert_eq!(orders(&ranked), vec![1, 2, 3]);
    }

    #[test]
    fn test_higher_score_ranks_first() {
        let ranked = rank(vec![feature(1, 1), feature(2, 1), feature(3, 2)]);
        assert_eq!(orders(&ranked), vec![3, 1, 2]);

        let ranked = rank(vec![feature(1, 1), feature(2, 3), feature(3, 2)]);
        assert_eq!(orders(&ranked), vec![2, 3, 1]);
    }

    #[test]
    fn test_released_does_not_affect_order() {
        let mut released = feature(2, 1);
        released.set_released(true);
        let ranked = rank(vec![released, feature(1, 1)]);
        assert_eq!(orders(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn test_rank_is_independent_of_input_order(
            votes in prop::collection::vec(0u64..6, 0..20),
            seed in any::<u64>(),
        ) {
            let features: Vec<Feature> = votes
                .iter()
                .enumerate()
                .map(|(i, v)| feature(i as u64 + 1, *v))
                .collect();

            let mut shuffled = features.clone();
            // Deterministic rotation + reversal stands in for a shuffle.
            if !shuffled.is_empty() {
                let k = (seed as usize) % shuffled.len();
                shuffled.rotate_left(k);
            }
            if seed % 2 == 0 {
                shuffled.reverse();
            }

            let a = rank(features);
            let b = rank(shuffled);
            prop_assert_eq!(orders(&a), orders(&b));

            for pair in a.windows(2) {
                prop_assert!(pair[0].score() >= pair[1].score());
                if pair[0].score() == pair[1].score() {
                    prop_assert!(pair[0].created_order() < pair[1].created_order());
                }
            }
        }
    }
}
