//! In-memory implementation of the ChainStore trait.
//!
//! This is primarily for testing. It has the same snapshot semantics as the
//! file and SQLite stores but keeps everything in memory.

use std::sync::RwLock;

use async_trait::async_trait;
use aetherflux_core::Block;

use crate::error::{Result, StoreError};
use crate::traits::ChainStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Option<Vec<Block>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `chain`.
    pub fn with_chain(chain: Vec<Block>) -> Self {
        Self {
            inner: RwLock::new(Some(chain)),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {}", e))
}

#[async_trait]
impl ChainStore for MemoryStore {
    async fn load(&self) -> Result<Option<Vec<Block>>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.clone())
    }

    async fn save(&self, chain: &[Block]) -> Result<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        *inner = Some(chain.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
