//! SQLite implementation of the ChainStore trait.
//!
//! Each block is stored as its canonical CBOR record, keyed by index. Uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use aetherflux_core::{canonical_record_bytes, decode_block_record, Block};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::ChainStore;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    label: String,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let label = format!("sqlite:{}", path.as_ref().display());
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            label,
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            label: "sqlite::memory:".to_string(),
        })
    }

    /// Run `f` against the connection on a blocking worker.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("label", &self.label).finish()
    }
}

fn read_blocks(conn: &Connection) -> Result<Option<Vec<Block>>> {
    let mut stmt = conn.prepare("SELECT idx, hash, record FROM blocks ORDER BY idx")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Vec<u8>>(2)?,
        ))
    })?;

    let mut blocks = Vec::new();
    for row in rows {
        let (idx, hash, record) = row?;

        let block = decode_block_record(&record)
            .map_err(|e| StoreError::Corrupt(format!("row {}: {}", idx, e)))?;

        if idx < 0 || block.index() != idx as u64 || block.index() != blocks.len() as u64 {
            return Err(StoreError::Corrupt(format!(
                "row {} holds block {} at position {}",
                idx,
                block.index(),
                blocks.len()
            )));
        }

        if block.hash() != hash {
            return Err(StoreError::Corrupt(format!(
                "row {}: hash column {} disagrees with record hash {}",
                idx,
                hash,
                block.hash()
            )));
        }

        blocks.push(block);
    }

    if blocks.is_empty() {
        Ok(None)
    } else {
        Ok(Some(blocks))
    }
}

fn write_blocks(conn: &mut Connection, chain: &[Block]) -> Result<()> {
    let tx = conn.transaction()?;
    {
        tx.execute(
            "DELETE FROM blocks WHERE idx >= ?1",
            params![chain.len() as i64],
        )?;

        let mut stmt =
            tx.prepare("INSERT OR REPLACE INTO blocks (idx, hash, record) VALUES (?1, ?2, ?3)")?;
        for block in chain {
            let idx = i64::try_from(block.index()).map_err(|_| {
                StoreError::Serialization(format!("block index {} out of range", block.index()))
            })?;
            stmt.execute(params![idx, block.hash(), canonical_record_bytes(block)])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[async_trait]
impl ChainStore for SqliteStore {
    async fn load(&self) -> Result<Option<Vec<Block>>> {
        self.with_conn(|conn| read_blocks(conn)).await
    }

    async fn save(&self, chain: &[Block]) -> Result<()> {
        let chain = chain.to_vec();
        let blocks = chain.len();
        self.with_conn(move |conn| write_blocks(conn, &chain)).await?;
        tracing::debug!(store = %self.label, blocks, "chain rows written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
