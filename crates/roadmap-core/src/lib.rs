//! # Roadmap Core
//!
//! Pure primitives for the roadmap engine: feature requests, voter identities,
//! ranking and snapshot assembly.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over the feature data model.
//!
//! ## Key Types
//!
//! - [`Feature`] - A submitted feature request and the set of identities that voted for it
//! - [`FeatureId`] - Random 128-bit identifier, never reused
//! - [`CreatedOrder`] - Opaque creation sequence used as the ranking tie-break
//! - [`Title`] - A validated feature title (1..=150 characters)
//! - [`VoterId`] - A normalized voter identity derived from a caller origin token
//!
//! ## Ranking
//!
//! Features rank by descending score, ties broken by ascending creation order.
//! See [`ranking`] for the comparator and [`snapshot`] for the client-facing shape.

pub mod error;
pub mod feature;
pub mod identity;
pub mod ranking;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use error::{IdentityError, ValidationError};
pub use feature::{Feature, VoteOutcome};
pub use identity::{IdentityMode, IdentityResolver, VoterId};
pub use ranking::{rank, ranking_order};
pub use snapshot::{assemble, RankedFeature};
pub use types::{CreatedOrder, FeatureId};
pub use validation::{Title, MAX_TITLE_CHARS};
