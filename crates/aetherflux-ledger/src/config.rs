//! Ledger configuration.

use aetherflux_core::{Difficulty, HashAlgorithm};

/// How entry links are checked on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Links are stored as given.
    #[default]
    Unchecked,
    /// Every link must name a block already in the chain.
    ExistingBlocks,
}

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of every mined hash.
    pub difficulty: Difficulty,
    /// Hash function used for block hashes.
    pub hash_algorithm: HashAlgorithm,
    /// Link checking on submission.
    pub link_policy: LinkPolicy,
    /// Put an entry back at the head of the queue when its block is rejected.
    /// Otherwise the entry is dropped.
    pub requeue_on_reject: bool,
    /// Re-verify hashes, linkage and work when loading a stored chain.
    pub verify_on_load: bool,
    /// Refuse entries whose topic is empty or whitespace.
    pub require_topic: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::DEFAULT,
            hash_algorithm: HashAlgorithm::Sha256,
            link_policy: LinkPolicy::Unchecked,
            requeue_on_reject: true,
            verify_on_load: true,
            require_topic: false,
        }
    }
}

impl LedgerConfig {
    /// Default configuration at another difficulty.
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }
}
