//! Error types for the AetherFlux core.

use thiserror::Error;

/// Core errors that can occur while encoding, decoding, or configuring.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed block record: {0}")]
    MalformedRecord(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("record is not in canonical form")]
    NonCanonical,

    #[error("difficulty {0} exceeds the 64 hex characters of a digest")]
    InvalidDifficulty(u32),

    #[error("a chain must contain at least the genesis block")]
    EmptyChain,
}

/// Validation errors for submitted entries.
///
/// Raised before anything is queued; no state changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("topic must not be blank")]
    BlankTopic,

    #[error("link {link} does not reference an existing block (chain length {chain_len})")]
    DanglingLink { link: u64, chain_len: u64 },
}

/// Reasons a candidate block is refused by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("stale tip: candidate links to {got}, tip is {expected}")]
    StaleTip { expected: String, got: String },

    #[error("insufficient work: proof {proof} lacks {difficulty} leading zeros")]
    InsufficientWork { difficulty: u32, proof: String },

    #[error("hash mismatch: proof {proof}, recomputed {computed}")]
    HashMismatch { proof: String, computed: String },

    #[error("index mismatch: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },

    #[error("malformed genesis block: {0}")]
    MalformedGenesis(String),
}

/// Reasons the nonce search stopped without a solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("nonce space exhausted")]
    NonceSpaceExhausted,
}
