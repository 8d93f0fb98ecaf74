//! Content hashing for blocks.
//!
//! Every block hash is a 256-bit digest of the block's canonical bytes,
//! rendered as lowercase hex. The digest function sits behind
//! [`ContentHasher`] so a ledger can pick SHA-256 or BLAKE3, and tests can
//! plug in something cheaper.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// A hash function producing lowercase hex digests.
pub trait ContentHasher: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Digest `data` and return it as lowercase hex.
    fn digest_hex(&self, data: &[u8]) -> String;
}

/// SHA-256, the ledger's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn digest_hex(&self, data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

/// BLAKE3 with a 32-byte output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn digest_hex(&self, data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }
}

/// Selectable built-in hash algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Instantiate the hasher for this algorithm.
    pub fn hasher(self) -> Arc<dyn ContentHasher> {
        match self {
            HashAlgorithm::Sha256 => Arc::new(Sha256Hasher),
            HashAlgorithm::Blake3 => Arc::new(Blake3Hasher),
        }
    }
}
