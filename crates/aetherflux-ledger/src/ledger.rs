//! The Ledger: owner of the chain, the entry queue and the miner.
//!
//! One mining cycle at a time holds the miner lock from popping an entry
//! through committing its block. Readers use the chain lock and only wait for
//! the final swap of a commit, never for a nonce search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use aetherflux_core::{
    pow, validate_links, Block, BlockBuilder, Chain, ContentHasher, Entry, EntryDraft, EntryId,
    EntryQueue, Metadata, PowError,
};
use aetherflux_store::{ChainStore, StoreError};

use crate::config::{LedgerConfig, LinkPolicy};
use crate::error::{LedgerError, Result};

/// Result of one mining cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A block was sealed, persisted and appended.
    Mined {
        index: u64,
        hash: String,
        nonce: u64,
        attempts: u64,
    },
    /// The queue was empty.
    NoEntries,
    /// The search was cancelled; the entry is back at the head of the queue.
    Cancelled,
}

/// Stops an in-flight nonce search.
///
/// The flag is cleared when a mining cycle starts, so a cancel only affects
/// the search running at the time (or the next one to start checking).
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Ask the running search to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Submitting knowledge entries
/// - Mining queued entries into blocks
/// - Appending externally built blocks
/// - Querying and persisting the chain
pub struct Ledger<S: ChainStore> {
    store: Arc<S>,
    hasher: Arc<dyn ContentHasher>,
    config: LedgerConfig,
    /// Held for a whole mining cycle and by every other chain writer.
    mining: Mutex<()>,
    chain: RwLock<Chain>,
    queue: Mutex<EntryQueue>,
    cancel: CancelHandle,
}

impl<S: ChainStore> Ledger<S> {
    /// Open a ledger on `store`, creating and persisting genesis if the store
    /// is empty.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        let hasher = config.hash_algorithm.hasher();
        Self::open_with_hasher(store, config, hasher).await
    }

    /// Like [`Ledger::open`] with a caller-supplied hash function.
    /// `config.hash_algorithm` is ignored.
    pub async fn open_with_hasher(
        store: S,
        config: LedgerConfig,
        hasher: Arc<dyn ContentHasher>,
    ) -> Result<Self> {
        let store = Arc::new(store);

        let chain = match load_chain(store.as_ref(), &config, hasher.as_ref()).await? {
            Some(chain) => {
                tracing::info!(
                    store = %store.describe(),
                    blocks = chain.len(),
                    tip = %chain.tip().hash(),
                    "loaded chain"
                );
                chain
            }
            None => {
                let genesis = Block::genesis(aetherflux_core::now_secs(), hasher.as_ref());
                store.save(std::slice::from_ref(&genesis)).await?;
                tracing::info!(
                    store = %store.describe(),
                    hash = %genesis.hash(),
                    "created genesis block"
                );
                Chain::from_genesis(genesis)
            }
        };

        Ok(Self {
            store,
            hasher,
            config,
            mining: Mutex::new(()),
            chain: RwLock::new(chain),
            queue: Mutex::new(EntryQueue::new()),
            cancel: CancelHandle::default(),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn hasher(&self) -> &dyn ContentHasher {
        self.hasher.as_ref()
    }

    /// Handle for cancelling the running search from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue a knowledge entry for mining.
    pub async fn submit_entry(
        &self,
        topic: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
        links: Vec<u64>,
    ) -> Result<EntryId> {
        self.submit(EntryDraft::new(topic, content, metadata, links))
            .await
    }

    /// Queue a parsed submission.
    pub async fn submit(&self, draft: EntryDraft) -> Result<EntryId> {
        if self.config.require_topic {
            draft.require_topic()?;
        }

        if self.config.link_policy == LinkPolicy::ExistingBlocks {
            let chain_len = self.chain.read().await.len() as u64;
            validate_links(&draft.links, chain_len)?;
        }

        let entry = Entry::from_draft(draft);
        let entry_id = entry.entry_id;

        let mut queue = self.queue.lock().await;
        queue.enqueue(entry);
        tracing::debug!(%entry_id, queued = queue.len(), "entry submitted");

        Ok(entry_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mining
    // ─────────────────────────────────────────────────────────────────────────

    /// Mine the oldest queued entry into a block.
    pub async fn mine_next(&self) -> Result<MineOutcome> {
        let _miner = self.mining.lock().await;
        self.cancel.reset();

        let next = self.queue.lock().await.pop_front();
        let entry = match next {
            Some(entry) => entry,
            None => return Ok(MineOutcome::NoEntries),
        };

        let candidate = {
            let chain = self.chain.read().await;
            BlockBuilder::new(chain.len() as u64, chain.tip().hash())
                .entry(&entry)
                .build(self.hasher.as_ref())
        };
        let index = candidate.block().index();
        let difficulty = self.config.difficulty;

        tracing::debug!(
            index,
            entry_id = %entry.entry_id,
            %difficulty,
            "searching for nonce"
        );

        let hasher = Arc::clone(&self.hasher);
        let cancel = self.cancel.flag();
        let joined = tokio::task::spawn_blocking(move || {
            let mut candidate = candidate;
            let result = pow::solve(&mut candidate, difficulty, hasher.as_ref(), &cancel);
            (candidate, result)
        })
        .await;

        let (candidate, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                self.queue.lock().await.requeue(entry);
                return Err(LedgerError::Worker(e.to_string()));
            }
        };

        let solution = match result {
            Ok(solution) => solution,
            Err(PowError::Cancelled { attempts }) => {
                tracing::info!(index, attempts, "nonce search cancelled, entry requeued");
                self.queue.lock().await.requeue(entry);
                return Ok(MineOutcome::Cancelled);
            }
            Err(e) => {
                self.reject(entry, &e.to_string()).await;
                return Err(LedgerError::Search(e));
            }
        };

        match self.commit(candidate.seal(), &solution.hash).await {
            Ok(()) => {
                tracing::info!(
                    index,
                    hash = %solution.hash,
                    nonce = solution.nonce,
                    attempts = solution.attempts,
                    "block mined"
                );
                Ok(MineOutcome::Mined {
                    index,
                    hash: solution.hash,
                    nonce: solution.nonce,
                    attempts: solution.attempts,
                })
            }
            Err(LedgerError::ChainIntegrity(violation)) => {
                self.reject(entry, &violation.to_string()).await;
                Err(LedgerError::ChainIntegrity(violation))
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "commit failed, entry requeued");
                self.queue.lock().await.requeue(entry);
                Err(e)
            }
        }
    }

    /// Validate and append a block built elsewhere.
    ///
    /// Returns `false` without changing anything if the block does not extend
    /// the tip with valid work. Storage failures are errors.
    pub async fn append_block(&self, candidate: Block, proof: &str) -> Result<bool> {
        let _miner = self.mining.lock().await;
        let index = candidate.index();

        match self.commit(candidate, proof).await {
            Ok(()) => {
                tracing::info!(index, hash = %proof, "block appended");
                Ok(true)
            }
            Err(LedgerError::ChainIntegrity(violation)) => {
                tracing::warn!(index, %violation, "block rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Validate against the tip, persist the extended chain, then swap it in.
    ///
    /// Callers hold the miner lock.
    async fn commit(&self, block: Block, proof: &str) -> Result<()> {
        let mut next = self.chain.read().await.clone();
        next.append(block, proof, self.config.difficulty, self.hasher.as_ref())?;
        self.store.save(next.blocks()).await?;
        *self.chain.write().await = next;
        Ok(())
    }

    async fn reject(&self, entry: Entry, reason: &str) {
        if self.config.requeue_on_reject {
            tracing::warn!(entry_id = %entry.entry_id, reason, "block rejected, entry requeued");
            self.queue.lock().await.requeue(entry);
        } else {
            tracing::warn!(entry_id = %entry.entry_id, reason, "block rejected, entry dropped");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Full ordered copy of the chain.
    pub async fn snapshot(&self) -> Vec<Block> {
        self.chain.read().await.blocks().to_vec()
    }

    /// Alias for [`Ledger::snapshot`].
    pub async fn get_chain(&self) -> Vec<Block> {
        self.snapshot().await
    }

    pub async fn tip(&self) -> Block {
        self.chain.read().await.tip().clone()
    }

    /// Number of blocks, genesis included.
    pub async fn len(&self) -> usize {
        self.chain.read().await.len()
    }

    /// Get the block at `index`.
    pub async fn block(&self, index: u64) -> Option<Block> {
        self.chain.read().await.get(index).cloned()
    }

    /// Blocks whose links reference `index`.
    pub async fn backlinks(&self, index: u64) -> Vec<Block> {
        self.chain.read().await.backlinks(index).cloned().collect()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Queued entries, oldest first.
    pub async fn pending(&self) -> Vec<Entry> {
        self.queue.lock().await.iter().cloned().collect()
    }

    /// Re-verify the in-memory chain.
    pub async fn verify(&self) -> Result<()> {
        let chain = self.chain.read().await;
        chain.verify(self.config.difficulty, self.hasher.as_ref())?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Write the current chain to the store.
    pub async fn save(&self) -> Result<()> {
        let _miner = self.mining.lock().await;
        let blocks = self.snapshot().await;
        self.store.save(&blocks).await?;
        Ok(())
    }

    /// Replace the in-memory chain with the stored one.
    ///
    /// The queue is left as is.
    pub async fn reload(&self) -> Result<()> {
        let _miner = self.mining.lock().await;
        let chain = load_chain(self.store.as_ref(), &self.config, self.hasher.as_ref())
            .await?
            .ok_or_else(|| StoreError::Corrupt("store holds no chain".to_string()))?;

        tracing::info!(blocks = chain.len(), "chain reloaded");
        *self.chain.write().await = chain;
        Ok(())
    }

    /// Persist the chain and close the ledger.
    ///
    /// Taking `self` means no mining cycle can still be running; cancel a
    /// search through a [`CancelHandle`] before dropping the last borrow.
    /// Entries still queued are discarded.
    pub async fn shutdown(self) -> Result<()> {
        let blocks = self.chain.read().await.blocks().to_vec();
        self.store.save(&blocks).await?;

        let pending = self.queue.lock().await.len();
        if pending > 0 {
            tracing::warn!(pending, "discarding pending entries on shutdown");
        }
        tracing::info!(blocks = blocks.len(), "ledger shut down");
        Ok(())
    }
}

/// Load and check a stored chain.
///
/// Anything stored that fails decoding or verification is reported as
/// corrupt rather than replaced.
async fn load_chain<S: ChainStore + ?Sized>(
    store: &S,
    config: &LedgerConfig,
    hasher: &dyn ContentHasher,
) -> Result<Option<Chain>> {
    let blocks = match store.load().await? {
        Some(blocks) => blocks,
        None => return Ok(None),
    };

    let chain = Chain::from_blocks(blocks).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    if config.verify_on_load {
        chain
            .verify(config.difficulty, hasher)
            .map_err(|fault| StoreError::Corrupt(fault.to_string()))?;
    }

    Ok(Some(chain))
}
