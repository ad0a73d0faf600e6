//! # Roadmap Store
//!
//! Storage abstraction for the roadmap engine. Provides a trait-based interface
//! for feature persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts feature storage behind the [`Store`] trait,
//! allowing the engine to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roadmap_core::{Title, VoterId};
//! use roadmap_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("roadmap.db").unwrap();
//!
//!     let title = Title::parse("Dark mode").unwrap();
//!     let creator = VoterId::from_normalized("203.0.113.7");
//!     let feature = store.create_feature_with_vote(&title, &creator).await.unwrap();
//!     assert_eq!(feature.score(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent votes**: Adding the same voter twice reports `already_voted`
//! - **Atomic create-and-vote**: A new feature is never visible with score 0
//! - **Monotonic creation order**: Reset only by `flush_all`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
