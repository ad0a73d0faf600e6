//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use roadmap_core::MAX_TITLE_CHARS;

/// Generate a valid title (1..=150 characters, not blank).
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 .,!?'-]{0,149}".prop_map(String::from)
}

/// Generate a title that is one to fifty characters too long.
pub fn overlong_title() -> impl Strategy<Value = String> {
    (1usize..=50).prop_map(|extra| "x".repeat(MAX_TITLE_CHARS + extra))
}

/// Generate an IPv4 origin token, optionally forwarded through proxies.
pub fn origin_token() -> impl Strategy<Value = String> {
    (
        any::<[u8; 4]>(),
        prop::collection::vec(any::<[u8; 4]>(), 0..3),
        any::<bool>(),
    )
        .prop_map(|(client, proxies, mapped)| {
            let mut token = if mapped {
                format!("::ffff:{}.{}.{}.{}", client[0], client[1], client[2], client[3])
            } else {
                format!("{}.{}.{}.{}", client[0], client[1], client[2], client[3])
            };
            for p in proxies {
                token.push_str(&format!(", {}.{}.{}.{}", p[0], p[1], p[2], p[3]));
            }
            token
        })
}

/// One vote: caller `voter` votes for the `feature`-th created feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteEvent {
    pub feature: usize,
    pub voter: usize,
}

/// A sequence of creations followed by votes, with plenty of repeats.
#[derive(Debug, Clone)]
pub struct VoteScript {
    /// Creator caller of each feature, in creation order.
    pub creators: Vec<usize>,
    pub votes: Vec<VoteEvent>,
}

impl VoteScript {
    /// Distinct voter sets per feature, creator included.
    pub fn expected_voters(&self) -> Vec<BTreeSet<usize>> {
        let mut sets: Vec<BTreeSet<usize>> = self
            .creators
            .iter()
            .map(|c| BTreeSet::from([*c]))
            .collect();
        for vote in &self.votes {
            sets[vote.feature].insert(vote.voter);
        }
        sets
    }

    /// Expected score of each feature, in creation order.
    pub fn expected_scores(&self) -> Vec<u64> {
        self.expected_voters()
            .iter()
            .map(|s| s.len() as u64)
            .collect()
    }

    /// Expected ranking as indices into creation order.
    pub fn expected_ranking(&self) -> Vec<usize> {
        let scores = self.expected_scores();
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|a, b| scores[*b].cmp(&scores[*a]).then(a.cmp(b)));
        order
    }
}

impl Arbitrary for VoteScript {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        // Small voter pool so duplicate votes are common.
        prop::collection::vec(0usize..8, 1..6)
            .prop_flat_map(|creators| {
                let features = creators.len();
                let votes = prop::collection::vec(
                    (0..features, 0usize..8).prop_map(|(feature, voter)| VoteEvent { feature, voter }),
                    0..40,
                );
                (Just(creators), votes)
            })
            .prop_map(|(creators, votes)| VoteScript { creators, votes })
            .boxed()
    }
}
