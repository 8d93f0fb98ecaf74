//! Error types for the Ledger.

use aetherflux_core::{ChainFault, CoreError, IntegrityViolation, PowError, ValidationError};
use aetherflux_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A submitted entry was rejected before queueing.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A block was refused by the chain.
    #[error("chain integrity violation: {0}")]
    ChainIntegrity(#[from] IntegrityViolation),

    /// The in-memory chain failed re-verification.
    #[error("chain verification failed at {0}")]
    Verification(#[from] ChainFault),

    /// Loading or saving the chain failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The nonce search ended without a solution.
    #[error("proof-of-work search failed: {0}")]
    Search(PowError),

    /// Core encoding or configuration error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The blocking search task panicked or was aborted.
    #[error("mining worker failed: {0}")]
    Worker(String),
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
