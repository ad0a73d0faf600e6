//! # Roadmap Testkit
//!
//! Testing utilities for the roadmap engine.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an engine wired to a store plus numbered caller origins
//! - **Generators**: Proptest strategies for titles, origins and vote scripts
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use roadmap_testkit::generators::VoteScript;
//!
//! proptest! {
//!     #[test]
//!     fn scores_match_model(script: VoteScript) {
//!         let expected = script.expected_scores();
//!         // replay script against an engine and compare
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use roadmap_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let ids = fixture.seed(&[("Dark mode", 2), ("Offline sync", 0)]).await;
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{origin, TestFixture};
pub use generators::{VoteEvent, VoteScript};
