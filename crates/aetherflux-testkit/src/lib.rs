//! # AetherFlux Testkit
//!
//! Testing utilities for the AetherFlux ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed blocks with their expected canonical bytes and hashes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Cheap hashers, a failure-injecting store, temp directories
//!
//! ## Golden Vectors
//!
//! ```rust
//! use aetherflux_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, _, hash) in verify_all_vectors() {
//!     assert!(matches, "{} hashed to {}", name, hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use aetherflux_core::Sha256Hasher;
//! use aetherflux_testkit::generators::{block_from_params, BlockParams};
//!
//! proptest! {
//!     #[test]
//!     fn hash_is_deterministic(params: BlockParams) {
//!         let b1 = block_from_params(&params, &Sha256Hasher);
//!         let b2 = block_from_params(&params, &Sha256Hasher);
//!         prop_assert_eq!(b1.hash(), b2.hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use aetherflux_core::Difficulty;
//! use aetherflux_testkit::fixtures::{mined_chain, ToyHasher};
//!
//! let blocks = mined_chain(3, Difficulty::new(2).unwrap(), &ToyHasher);
//! assert!(blocks[2].hash().starts_with("00"));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{mined_chain, rich_metadata, FailingStore, TempChainDir, ToyHasher, UnstableHasher};
pub use generators::{block_from_params, BlockParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
