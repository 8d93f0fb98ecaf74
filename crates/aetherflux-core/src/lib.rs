//! # AetherFlux Core
//!
//! Pure primitives for the AetherFlux ledger: blocks, canonical hashing,
//! proof-of-work, validation, and the pending-entry queue.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over the ledger's data structures.
//!
//! ## Key Types
//!
//! - [`Block`] - A sealed ledger record with a self-describing content hash
//! - [`Candidate`] - An unsealed block whose nonce is still being searched
//! - [`Chain`] - A non-empty, hash-linked sequence of blocks
//! - [`Entry`] - A knowledge entry waiting in the [`EntryQueue`]
//! - [`Difficulty`] - Required count of leading zero hex characters
//!
//! ## Canonicalization
//!
//! Blocks are hashed over deterministic CBOR. See the [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod chain;
pub mod entry;
pub mod error;
pub mod hasher;
pub mod pow;
pub mod queue;
pub mod types;
pub mod validation;

pub use block::{Block, BlockBuilder, Candidate, GENESIS_CONTENT, GENESIS_PREVIOUS_HASH, GENESIS_TOPIC};
pub use canonical::{canonical_block_bytes, canonical_record_bytes, decode_block_record, NonceTemplate};
pub use chain::{Chain, ChainFault};
pub use entry::{parse_link_list, parse_metadata, Entry, EntryDraft, Metadata};
pub use error::{CoreError, IntegrityViolation, PowError, ValidationError};
pub use hasher::{Blake3Hasher, ContentHasher, HashAlgorithm, Sha256Hasher};
pub use pow::{solve, Solution, CANCEL_CHECK_INTERVAL};
pub use queue::EntryQueue;
pub use types::{now_secs, Difficulty, EntryId};
pub use validation::{validate_append, validate_genesis, validate_links};
