//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: cheap hashers, a store that can be
//! told to fail, temporary chain directories, and pre-mined chains.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use aetherflux_core::{pow, Block, BlockBuilder, ContentHasher, Difficulty, Metadata};
use aetherflux_store::{
    ChainStore, JsonFileStore, MemoryStore, Result as StoreResult, SqliteStore, StoreError,
};

/// A fast, non-cryptographic hasher for tests that mine many blocks.
///
/// FNV-1a over the input with a final mix, widened to 256 bits with four
/// seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyHasher;

impl ToyHasher {
    const SEEDS: [u64; 4] = [
        0xcbf2_9ce4_8422_2325,
        0x8422_2325_cbf2_9ce4,
        0x9e37_79b9_7f4a_7c15,
        0x7f4a_7c15_9e37_79b9,
    ];

    fn fnv1a(seed: u64, data: &[u8]) -> u64 {
        let mut h = data.iter().fold(seed, |hash, &b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^ (h >> 33)
    }
}

impl ContentHasher for ToyHasher {
    fn name(&self) -> &'static str {
        "toy"
    }

    fn digest_hex(&self, data: &[u8]) -> String {
        Self::SEEDS
            .iter()
            .map(|&seed| format!("{:016x}", Self::fnv1a(seed, data)))
            .collect()
    }
}

/// A hasher that never gives the same digest twice.
///
/// Digests count up from zero, so early ones carry long zero prefixes and
/// every recomputation disagrees with the last. Mining with it always fails
/// validation with a hash mismatch.
#[derive(Debug, Default)]
pub struct UnstableHasher {
    counter: AtomicU64,
}

impl ContentHasher for UnstableHasher {
    fn name(&self) -> &'static str {
        "unstable"
    }

    fn digest_hex(&self, _data: &[u8]) -> String {
        format!("{:064x}", self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

/// A store wrapper whose loads and saves can be made to fail.
#[derive(Debug, Default)]
pub struct FailingStore<S = MemoryStore> {
    inner: S,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    saves: AtomicU64,
}

impl<S: ChainStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_saves: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            saves: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Number of saves that reached the inner store.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ChainStore> ChainStore for FailingStore<S> {
    async fn load(&self) -> StoreResult<Option<Vec<Block>>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected load failure",
            )));
        }
        self.inner.load().await
    }

    async fn save(&self, chain: &[Block]) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected save failure",
            )));
        }
        self.inner.save(chain).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("failing({})", self.inner.describe())
    }
}

/// A temporary directory holding chain files.
///
/// Removed when dropped.
pub struct TempChainDir {
    dir: TempDir,
}

impl TempChainDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the default chain file inside the directory.
    pub fn json_path(&self) -> PathBuf {
        self.json_store().path().to_path_buf()
    }

    pub fn json_store(&self) -> JsonFileStore {
        JsonFileStore::in_dir(self.dir.path())
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.dir.path().join("aetherflux.db")
    }

    pub fn sqlite_store(&self) -> StoreResult<SqliteStore> {
        SqliteStore::open(self.sqlite_path())
    }
}

/// Metadata with nesting, mixed number kinds and non-ASCII text.
pub fn rich_metadata(i: u64) -> Metadata {
    let value = json!({
        "source": format!("séance-{}", i),
        "weight": i as f64 + 0.25,
        "count": i,
        "offset": -(i as i64) - 1,
        "tags": ["α", "β", {"γ": [i, null, true]}],
        "nested": {"level1": {"level2": {"level3": ["深い", 1.5e-7]}}}
    });
    value.as_object().cloned().unwrap_or_default()
}

/// Mine a valid chain of `len` blocks (genesis included) with rich contents.
pub fn mined_chain(len: usize, difficulty: Difficulty, hasher: &dyn ContentHasher) -> Vec<Block> {
    let cancel = AtomicBool::new(false);
    let mut blocks = vec![Block::genesis(1_736_870_400.0, hasher)];

    for i in 1..len as u64 {
        let tip = &blocks[blocks.len() - 1];
        let mut candidate = BlockBuilder::new(i, tip.hash())
            .timestamp(1_736_870_400.0 + i as f64 * 1.125)
            .topic(format!("Thème {}", i))
            .content(format!("Entry {}: 知識", i))
            .metadata(rich_metadata(i))
            .links((0..i).step_by(2).collect())
            .build(hasher);
        match pow::solve(&mut candidate, difficulty, hasher, &cancel) {
            Ok(_) => blocks.push(candidate.seal()),
            Err(e) => panic!("fixture search failed: {}", e),
        }
    }

    blocks
}
