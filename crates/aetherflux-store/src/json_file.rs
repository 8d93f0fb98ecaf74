//! JSON file implementation of the ChainStore trait.
//!
//! The chain is kept as one pretty-printed JSON array of block objects. Writes
//! go to a temporary file in the same directory which is synced and then
//! renamed over the target, so readers see either the old or the new
//! snapshot, never a partial one.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aetherflux_core::Block;
use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};
use crate::traits::ChainStore;

/// File name used when no path is configured.
pub const DEFAULT_CHAIN_FILE: &str = "aetherflux_chain.json";

/// Store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`DEFAULT_CHAIN_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_CHAIN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_FILE)
    }
}

fn read_chain(path: &Path) -> Result<Option<Vec<Block>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let blocks: Vec<Block> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;

    if blocks.is_empty() {
        return Err(StoreError::Corrupt(format!(
            "{}: chain file holds no blocks",
            path.display()
        )));
    }

    Ok(Some(blocks))
}

fn write_chain(path: &Path, chain: &[Block]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    // Dropping the temp file on any error below removes it.
    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, chain)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    // Flush the directory entry where the platform allows it.
    if let Ok(dir_file) = File::open(&dir) {
        let _ = dir_file.sync_all();
    }

    Ok(())
}

#[async_trait]
impl ChainStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Vec<Block>>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_chain(&path))
            .await
            .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }

    async fn save(&self, chain: &[Block]) -> Result<()> {
        let path = self.path.clone();
        let chain = chain.to_vec();
        let blocks = chain.len();
        tokio::task::spawn_blocking(move || write_chain(&path, &chain))
            .await
            .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))??;

        tracing::debug!(path = %self.path.display(), blocks, "chain file written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aetherflux_core::{BlockBuilder, Sha256Hasher};
    use proptest::prelude::*;
    use serde_json::{json, Number, Value};

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn chain() -> Vec<Block> {
        let genesis = Block::genesis(1_700_000_000.123, &Sha256Hasher);
        let metadata = json!({
            "author": "Zoë",
            "ratio": 1.0,
            "count": 3,
            "nested": {"deep": [1, 2.5, {"k": null}]}
        });
        let next = BlockBuilder::new(1, genesis.hash())
            .timestamp(1_700_000_001.5)
            .topic("Ångström")
            .content("光の速さ")
            .metadata(metadata.as_object().cloned().unwrap())
            .links(vec![0])
            .nonce(77)
            .seal(&Sha256Hasher);
        vec![genesis, next]
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_is_exact() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        let blocks = chain();

        store.save(&blocks).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, blocks);

        // Integer and float metadata stay distinct.
        assert!(loaded[1].metadata()["count"].is_u64());
        assert!(loaded[1].metadata()["ratio"].is_f64());
        assert_eq!(loaded[1].compute_hash(&Sha256Hasher), blocks[1].hash());
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        store.save(&chain()).await.unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let first = &value[0];
        assert_eq!(first["index"], json!(0));
        assert_eq!(first["previous_hash"], json!("0"));
        assert_eq!(first["topic"], json!("Genesis"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_and_untouched() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), b"[{\"index\": 0,").unwrap();

        assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
        assert_eq!(fs::read(store.path()).unwrap(), b"[{\"index\": 0,");
    }

    #[tokio::test]
    async fn test_missing_field_is_corrupt() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        let mut value = serde_json::to_value(chain()).unwrap();
        value[1].as_object_mut().unwrap().remove("nonce");
        fs::write(store.path(), value.to_string()).unwrap();

        assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_empty_array_is_corrupt() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), b"[]").unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        store.save(&chain()).await.unwrap();
        store.save(&chain()[..1]).await.unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(DEFAULT_CHAIN_FILE)]);
        assert_eq!(store.load().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_snapshot() {
        let dir = tempdir();
        let store = JsonFileStore::in_dir(dir.path());
        let blocks = chain();
        store.save(&blocks).await.unwrap();

        // A directory where the temp file's rename target should be.
        let blocked = JsonFileStore::new(dir.path().join("sub"));
        fs::create_dir(blocked.path()).unwrap();
        fs::write(blocked.path().join("keep"), b"x").unwrap();
        assert!(blocked.save(&blocks).await.is_err());

        assert_eq!(store.load().await.unwrap().unwrap(), blocks);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            any::<u64>().prop_map(|n| json!(n)),
            any::<f64>().prop_filter_map("finite", |f| Number::from_f64(f).map(Value::Number)),
            "\\PC{0,12}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_file_keeps_exact_values(
            fields in prop::collection::btree_map("\\PC{1,8}", scalar(), 0..8),
            timestamp in 0.0f64..4.0e9,
        ) {
            let dir = tempdir();
            let path = dir.path().join(DEFAULT_CHAIN_FILE);
            let genesis = Block::genesis(timestamp, &Sha256Hasher);
            let next = BlockBuilder::new(1, genesis.hash())
                .timestamp(timestamp + 0.001)
                .metadata(fields.into_iter().collect())
                .seal(&Sha256Hasher);
            let blocks = vec![genesis, next];

            write_chain(&path, &blocks).unwrap();
            let loaded = read_chain(&path).unwrap().unwrap();

            prop_assert_eq!(&loaded, &blocks);
            prop_assert_eq!(loaded[1].compute_hash(&Sha256Hasher), blocks[1].hash());
        }
    }
}
