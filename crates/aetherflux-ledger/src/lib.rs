//! # AetherFlux Ledger
//!
//! An append-only, hash-linked ledger of knowledge entries. Entries are
//! queued, sealed into blocks by a proof-of-work search, and persisted after
//! every append.
//!
//! ## Key Concepts
//!
//! - **Entry**: A topic, content, free-form metadata and links to earlier
//!   blocks, waiting in a FIFO queue.
//! - **Block**: An entry sealed with the previous block's hash and a nonce
//!   whose hash carries the required zero prefix. Never edited.
//! - **Chain**: Starts at a fixed genesis block and only grows by validated
//!   appends.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aetherflux_ledger::{Ledger, LedgerConfig, MineOutcome};
//! use aetherflux_ledger::core::Metadata;
//! use aetherflux_ledger::store::JsonFileStore;
//!
//! async fn example() {
//!     // Open (or create) the chain file in the working directory
//!     let ledger = Ledger::open(JsonFileStore::default(), LedgerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     // Queue an entry
//!     ledger
//!         .submit_entry("Gravity", "Mass curves spacetime.", Metadata::new(), vec![0])
//!         .await
//!         .unwrap();
//!
//!     // Mine it
//!     if let MineOutcome::Mined { index, hash, .. } = ledger.mine_next().await.unwrap() {
//!         println!("block {} sealed as {}", index, hash);
//!     }
//!
//!     ledger.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `aetherflux_ledger::core` - Blocks, hashing, proof-of-work, validation
//! - `aetherflux_ledger::store` - Chain persistence

pub mod config;
pub mod error;
pub mod ledger;

// Re-export component crates
pub use aetherflux_core as core;
pub use aetherflux_store as store;

// Re-export main types for convenience
pub use config::{LedgerConfig, LinkPolicy};
pub use error::{LedgerError, Result};
pub use ledger::{CancelHandle, Ledger, MineOutcome};

// Re-export commonly used core types
pub use aetherflux_core::{
    Block, BlockBuilder, Difficulty, Entry, EntryDraft, EntryId, HashAlgorithm, Metadata,
};
