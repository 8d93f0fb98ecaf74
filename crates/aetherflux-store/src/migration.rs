//! SQLite schema versioning.
//!
//! The schema version lives in `PRAGMA user_version`. Each step moves the
//! schema from version N to N+1; all pending steps and the version bump
//! commit together.

use rusqlite::{Connection, Transaction};

use crate::error::{Result, StoreError};

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the database schema up to [`CURRENT_VERSION`].
///
/// Safe to call on every open. A database written by a newer build is
/// refused rather than guessed at.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;

    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {} is newer than supported version {}",
            found, CURRENT_VERSION
        )));
    }
    if found == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in found + 1..=CURRENT_VERSION {
        upgrade_to(&tx, step)?;
        tracing::debug!(version = step, "applied schema migration");
    }
    tx.pragma_update(None, "user_version", CURRENT_VERSION)?;
    tx.commit()?;

    Ok(())
}

/// Version recorded in the database file; 0 for a fresh file.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn upgrade_to(tx: &Transaction<'_>, version: u32) -> Result<()> {
    match version {
        1 => {
            // One row per block, keyed by chain position.
            tx.execute_batch(
                "CREATE TABLE blocks (
                    idx    INTEGER PRIMARY KEY,
                    hash   TEXT NOT NULL,
                    record BLOB NOT NULL
                );
                CREATE INDEX idx_blocks_hash ON blocks(hash);",
            )?;
            Ok(())
        }
        other => Err(StoreError::Migration(format!(
            "no migration to schema version {}",
            other
        ))),
    }
}
