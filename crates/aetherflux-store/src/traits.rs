//! ChainStore trait: the abstract interface for chain persistence.
//!
//! The ledger persists whole-chain snapshots. Implementations include a JSON
//! file (default), SQLite, and in-memory (for tests).

use async_trait::async_trait;
use aetherflux_core::Block;

use crate::error::Result;

/// Async interface for loading and saving chain snapshots.
///
/// # Design Notes
///
/// - **Snapshot semantics**: `save` replaces whatever was stored before. A
///   failed `save` leaves the previous snapshot readable.
/// - **No verification**: stores check encoding only. Hash linkage and
///   proof-of-work are verified by the caller.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Load the stored chain, ordered by index.
    ///
    /// Returns `None` when nothing has been saved yet, and an error when
    /// something was saved but cannot be decoded.
    async fn load(&self) -> Result<Option<Vec<Block>>>;

    /// Replace the stored chain with `chain`.
    async fn save(&self, chain: &[Block]) -> Result<()>;

    /// Short name used in logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: ChainStore + ?Sized> ChainStore for std::sync::Arc<S> {
    async fn load(&self) -> Result<Option<Vec<Block>>> {
        (**self).load().await
    }

    async fn save(&self, chain: &[Block]) -> Result<()> {
        (**self).save(chain).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
