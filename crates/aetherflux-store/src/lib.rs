//! # AetherFlux Store
//!
//! Chain persistence for the AetherFlux ledger. Provides a trait-based
//! interface for whole-chain snapshots with JSON file, SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - The async trait for loading and saving a chain
//! - [`JsonFileStore`] - Pretty-printed JSON file, the default layout
//! - [`SqliteStore`] - One canonical CBOR record per row
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aetherflux_store::{ChainStore, JsonFileStore, SqliteStore};
//!
//! async fn example() {
//!     // The default file in the working directory
//!     let store = JsonFileStore::default();
//!     let chain = store.load().await.unwrap();
//!
//!     // Or a SQLite database
//!     let store = SqliteStore::open("aetherflux.db").unwrap();
//!     if let Some(blocks) = chain {
//!         store.save(&blocks).await.unwrap();
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic snapshots**: a failed save never leaves a partial chain behind
//! - **Encoding checks only**: stores reject undecodable data as
//!   [`StoreError::Corrupt`]; hash linkage is the ledger's concern

pub mod error;
pub mod json_file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use json_file::{JsonFileStore, DEFAULT_CHAIN_FILE};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::ChainStore;
