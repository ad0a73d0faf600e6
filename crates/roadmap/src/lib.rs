//! # Roadmap
//!
//! Feature requests ranked by popularity. Users submit requests, vote on
//! them and see them ordered by how many distinct voters each has.
//!
//! ## Overview
//!
//! - **Create**: a new feature starts with its creator's vote (score 1)
//! - **Vote**: one vote per (feature, voter identity); repeats are no-ops
//! - **Release**: a flag marking a feature as shipped; does not move it
//! - **Rank**: descending score, ties broken by creation order
//! - **Flush**: wipe everything, for operators and test isolation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roadmap::{CreateRequest, Engine, EngineConfig, VoteRequest};
//! use roadmap::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("roadmap.db").unwrap();
//!     let engine = Engine::new(store, EngineConfig::default());
//!
//!     let feature = engine
//!         .submit(&CreateRequest::new("Dark mode", "203.0.113.7"))
//!         .await
//!         .unwrap();
//!
//!     engine
//!         .cast(&VoteRequest::new(feature.id(), "198.51.100.2"))
//!         .await
//!         .unwrap();
//!
//!     for row in engine.snapshot().await.unwrap() {
//!         println!("{} {} ({})", row.position, row.title, row.score);
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `roadmap::core` - Data model, identity resolution, ranking
//! - `roadmap::store` - Storage abstraction and SQLite

pub mod engine;
pub mod error;
pub mod request;

// Re-export component crates
pub use roadmap_core as core;
pub use roadmap_store as store;

// Re-export main types for convenience
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, Result};
pub use request::{CreateRequest, ValidatedCreate, VoteRequest};

// Re-export commonly used core types
pub use roadmap_core::{
    Feature, FeatureId, IdentityMode, RankedFeature, Title, VoterId, MAX_TITLE_CHARS,
};
