//! Block: a sealed ledger record.
//!
//! A block is immutable once sealed. The only mutable form is [`Candidate`],
//! which exists while the proof-of-work search is still choosing a nonce.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_block_bytes, NonceTemplate};
use crate::entry::{Entry, Metadata};
use crate::hasher::ContentHasher;
use crate::types::now_secs;

/// Topic of the genesis block.
pub const GENESIS_TOPIC: &str = "Genesis";

/// Content of the genesis block.
pub const GENESIS_CONTENT: &str = "Origin of AetherFlux";

/// `previous_hash` sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A sealed block.
///
/// `hash` covers every other field, including `nonce`. Field order here is the
/// order used by the JSON snapshot format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: f64,
    pub(crate) topic: String,
    pub(crate) content: String,
    pub(crate) metadata: Metadata,
    pub(crate) links: Vec<u64>,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
}

impl Block {
    /// Build the genesis block at the given time.
    pub fn genesis(timestamp: f64, hasher: &dyn ContentHasher) -> Self {
        BlockBuilder::new(0, GENESIS_PREVIOUS_HASH)
            .timestamp(timestamp)
            .topic(GENESIS_TOPIC)
            .content(GENESIS_CONTENT)
            .seal(hasher)
    }

    /// Position of the block in its chain.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Seconds since the Unix epoch at which the block was built.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Indices of blocks this block refers to.
    pub fn links(&self) -> &[u64] {
        &self.links
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The stored hash. Use [`Block::compute_hash`] to recompute it.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Check if this is the genesis position.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Check if this block links to the block at `index`.
    pub fn references(&self, index: u64) -> bool {
        self.links.contains(&index)
    }

    /// Recompute the hash from the block's fields (excluding `hash`).
    pub fn compute_hash(&self, hasher: &dyn ContentHasher) -> String {
        hasher.digest_hex(&canonical_block_bytes(self))
    }

    /// Copy this block's fields into a fresh candidate.
    ///
    /// The block itself is untouched.
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            block: self.clone(),
        }
    }
}

/// A block whose nonce is still open.
///
/// The hash is kept in step with the nonce at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    block: Block,
}

impl Candidate {
    /// Read-only view of the block as it would be sealed now.
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn nonce(&self) -> u64 {
        self.block.nonce
    }

    pub fn hash(&self) -> &str {
        &self.block.hash
    }

    /// Set the nonce and recompute the hash.
    pub fn set_nonce(&mut self, nonce: u64, hasher: &dyn ContentHasher) {
        self.block.nonce = nonce;
        self.block.hash = self.block.compute_hash(hasher);
    }

    /// Record a nonce whose hash the caller already computed over
    /// [`NonceTemplate`] bytes.
    pub(crate) fn set_solution(&mut self, nonce: u64, hash: String) {
        self.block.nonce = nonce;
        self.block.hash = hash;
    }

    /// Split canonical bytes around the nonce for fast re-hashing.
    pub fn nonce_template(&self) -> NonceTemplate {
        NonceTemplate::new(&self.block)
    }

    /// Freeze the candidate into a block.
    pub fn seal(self) -> Block {
        self.block
    }
}

impl AsRef<Block> for Candidate {
    fn as_ref(&self) -> &Block {
        &self.block
    }
}

/// Builder for blocks.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    index: u64,
    timestamp: f64,
    topic: String,
    content: String,
    metadata: Metadata,
    links: Vec<u64>,
    previous_hash: String,
    nonce: u64,
}

impl BlockBuilder {
    /// Start a block at `index` linked to `previous_hash`.
    ///
    /// The timestamp defaults to now and the nonce to 0.
    pub fn new(index: u64, previous_hash: impl Into<String>) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            topic: String::new(),
            content: String::new(),
            metadata: Metadata::new(),
            links: Vec::new(),
            previous_hash: previous_hash.into(),
            nonce: 0,
        }
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn links(mut self, links: Vec<u64>) -> Self {
        self.links = links;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Take topic, content, metadata and links from a pending entry.
    pub fn entry(self, entry: &Entry) -> Self {
        self.topic(entry.topic.clone())
            .content(entry.content.clone())
            .metadata(entry.metadata.clone())
            .links(entry.links.clone())
    }

    /// Build a candidate, hashing it at the current nonce.
    pub fn build(self, hasher: &dyn ContentHasher) -> Candidate {
        let mut block = Block {
            index: self.index,
            timestamp: self.timestamp,
            topic: self.topic,
            content: self.content,
            metadata: self.metadata,
            links: self.links,
            previous_hash: self.previous_hash,
            nonce: self.nonce,
            hash: String::new(),
        };
        block.hash = block.compute_hash(hasher);
        Candidate { block }
    }

    /// Build and seal in one step.
    pub fn seal(self, hasher: &dyn ContentHasher) -> Block {
        self.build(hasher).seal()
    }
}
