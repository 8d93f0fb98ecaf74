//! End-to-end ledger behaviour over real stores.

use std::fs;
use std::sync::Arc;

use aetherflux_ledger::core::{
    parse_link_list, parse_metadata, pow, BlockBuilder, ContentHasher, Difficulty,
    IntegrityViolation, Sha256Hasher,
};
use aetherflux_ledger::store::{ChainStore, JsonFileStore, MemoryStore, StoreError};
use aetherflux_ledger::{
    Block, EntryDraft, Ledger, LedgerConfig, LedgerError, Metadata, MineOutcome,
};
use aetherflux_testkit::{FailingStore, TempChainDir, ToyHasher, UnstableHasher};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config(zeros: u32) -> LedgerConfig {
    LedgerConfig::with_difficulty(Difficulty::new(zeros).unwrap())
}

fn toy() -> Arc<dyn ContentHasher> {
    Arc::new(ToyHasher)
}

#[tokio::test]
async fn test_fresh_storage_scenario() {
    init_tracing();
    let dir = TempChainDir::new().unwrap();
    let ledger = Ledger::open_with_hasher(dir.json_store(), config(3), toy())
        .await
        .unwrap();

    // Fresh storage holds only genesis, already on disk.
    let chain = ledger.get_chain().await;
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].index(), 0);
    assert_eq!(chain[0].previous_hash(), "0");
    assert!(dir.json_path().exists());

    ledger
        .submit_entry("T", "C", Metadata::new(), vec![])
        .await
        .unwrap();
    assert_eq!(ledger.queue_len().await, 1);

    match ledger.mine_next().await.unwrap() {
        MineOutcome::Mined { index, hash, .. } => {
            assert_eq!(index, 1);
            assert!(hash.starts_with("000"));
        }
        other => panic!("expected a mined block, got {:?}", other),
    }

    let chain = ledger.get_chain().await;
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].previous_hash(), chain[0].hash());
    assert_eq!(ledger.queue_len().await, 0);

    assert_eq!(ledger.mine_next().await.unwrap(), MineOutcome::NoEntries);

    // The file on disk matches memory.
    let stored = dir.json_store().load().await.unwrap().unwrap();
    assert_eq!(stored, chain);
}

#[tokio::test]
async fn test_every_mined_hash_has_prefix() {
    let ledger = Ledger::open_with_hasher(MemoryStore::new(), config(3), toy())
        .await
        .unwrap();
    let genesis = ledger.tip().await;

    for i in 0..6 {
        ledger
            .submit_entry(format!("topic {}", i), "body", Metadata::new(), vec![0])
            .await
            .unwrap();
    }

    let mut previous = genesis.hash().to_string();
    while let MineOutcome::Mined { index, hash, .. } = ledger.mine_next().await.unwrap() {
        assert!(hash.starts_with("000"), "block {} hash {}", index, hash);
        let block = ledger.block(index).await.unwrap();
        assert_eq!(block.previous_hash(), previous);
        previous = hash;
    }

    assert_eq!(ledger.len().await, 7);
    assert_eq!(ledger.backlinks(0).await.len(), 6);
    assert!(ledger.verify().await.is_ok());
}

#[tokio::test]
async fn test_corrupt_file_fails_open_and_is_untouched() {
    let dir = TempChainDir::new().unwrap();
    let garbage = b"{\"not\": \"a chain\"";
    fs::write(dir.json_path(), garbage).unwrap();

    let err = Ledger::open_with_hasher(dir.json_store(), config(1), toy())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LedgerError::Persistence(StoreError::Corrupt(_))));
    assert_eq!(fs::read(dir.json_path()).unwrap(), garbage);
}

#[tokio::test]
async fn test_tampered_hash_fails_open() {
    let dir = TempChainDir::new().unwrap();
    {
        let ledger = Ledger::open_with_hasher(dir.json_store(), config(1), toy())
            .await
            .unwrap();
        ledger
            .submit_entry("T", "C", Metadata::new(), vec![])
            .await
            .unwrap();
        ledger.mine_next().await.unwrap();
        ledger.shutdown().await.unwrap();
    }

    let text = fs::read_to_string(dir.json_path()).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    value[1]["hash"] = serde_json::json!(format!("0{}", "a".repeat(63)));
    fs::write(dir.json_path(), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    let tampered = fs::read(dir.json_path()).unwrap();

    let err = Ledger::open_with_hasher(dir.json_store(), config(1), toy())
        .await
        .err()
        .unwrap();
    match err {
        LedgerError::Persistence(StoreError::Corrupt(reason)) => {
            assert!(reason.contains("block 1"), "unexpected reason: {}", reason)
        }
        other => panic!("expected a corrupt store, got {:?}", other),
    }
    assert_eq!(fs::read(dir.json_path()).unwrap(), tampered);
}

#[tokio::test]
async fn test_save_failure_leaves_state_intact() {
    let store = Arc::new(FailingStore::new(MemoryStore::new()));
    let ledger = Ledger::open_with_hasher(Arc::clone(&store), config(2), toy())
        .await
        .unwrap();
    let id = ledger
        .submit_entry("T", "C", Metadata::new(), vec![])
        .await
        .unwrap();

    store.set_fail_saves(true);
    let err = ledger.mine_next().await.unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
    assert_eq!(ledger.len().await, 1);
    assert_eq!(ledger.pending().await[0].entry_id, id);

    store.set_fail_saves(false);
    assert!(matches!(
        ledger.mine_next().await.unwrap(),
        MineOutcome::Mined { index: 1, .. }
    ));
    assert_eq!(store.inner().load().await.unwrap().unwrap().len(), 2);
}

#[tokio::test]
async fn test_append_block_save_failure_is_an_error() {
    let store = Arc::new(FailingStore::new(MemoryStore::new()));
    let ledger = Ledger::open_with_hasher(Arc::clone(&store), config(1), toy())
        .await
        .unwrap();
    let tip = ledger.tip().await;

    let mut candidate = BlockBuilder::new(1, tip.hash())
        .topic("external")
        .build(ledger.hasher());
    let solution = pow::solve(
        &mut candidate,
        ledger.config().difficulty,
        ledger.hasher(),
        &Default::default(),
    )
    .unwrap();
    let block = candidate.seal();

    store.set_fail_saves(true);
    assert!(ledger.append_block(block.clone(), &solution.hash).await.is_err());
    assert_eq!(ledger.len().await, 1);

    store.set_fail_saves(false);
    assert!(ledger.append_block(block, &solution.hash).await.unwrap());
    assert_eq!(ledger.len().await, 2);
}

#[tokio::test]
async fn test_rejected_block_requeues_entry() {
    let ledger =
        Ledger::open_with_hasher(MemoryStore::new(), config(1), Arc::new(UnstableHasher::default()))
            .await
            .unwrap();
    ledger
        .submit_entry("T", "C", Metadata::new(), vec![])
        .await
        .unwrap();

    let err = ledger.mine_next().await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ChainIntegrity(IntegrityViolation::HashMismatch { .. })
    ));
    assert_eq!(ledger.len().await, 1);
    assert_eq!(ledger.queue_len().await, 1);
}

#[tokio::test]
async fn test_rejected_block_drops_entry_when_configured() {
    let mut cfg = config(1);
    cfg.requeue_on_reject = false;
    let ledger =
        Ledger::open_with_hasher(MemoryStore::new(), cfg, Arc::new(UnstableHasher::default()))
            .await
            .unwrap();
    ledger
        .submit_entry("T", "C", Metadata::new(), vec![])
        .await
        .unwrap();

    assert!(ledger.mine_next().await.is_err());
    assert_eq!(ledger.queue_len().await, 0);
    assert_eq!(ledger.len().await, 1);
}

#[tokio::test]
async fn test_stale_block_rejected_regardless_of_proof() {
    let ledger = Ledger::open_with_hasher(MemoryStore::new(), config(2), toy())
        .await
        .unwrap();
    let genesis = ledger.tip().await;

    // Mine a block on genesis, then advance the chain underneath it.
    let mut candidate = BlockBuilder::new(1, genesis.hash())
        .topic("late")
        .build(ledger.hasher());
    let solution = pow::solve(
        &mut candidate,
        ledger.config().difficulty,
        ledger.hasher(),
        &Default::default(),
    )
    .unwrap();

    ledger
        .submit_entry("first", "C", Metadata::new(), vec![])
        .await
        .unwrap();
    ledger.mine_next().await.unwrap();

    assert!(!ledger.append_block(candidate.seal(), &solution.hash).await.unwrap());
    assert_eq!(ledger.len().await, 2);
}

#[tokio::test]
async fn test_form_submission_helpers() {
    let ledger = Ledger::open_with_hasher(MemoryStore::new(), config(1), toy())
        .await
        .unwrap();

    let metadata = parse_metadata(r#"{"source": "field notes", "page": 12}"#).unwrap();
    let links = parse_link_list("0, x, 0");
    let draft = EntryDraft::new("Mosses", "They prefer shade.", metadata, links);
    ledger.submit(draft).await.unwrap();
    ledger.mine_next().await.unwrap();

    let block = ledger.block(1).await.unwrap();
    assert_eq!(block.links(), &[0, 0]);
    assert_eq!(block.metadata()["page"], serde_json::json!(12));

    // An untouched form submits empty fields; they are queued like any other.
    ledger.submit(EntryDraft::default()).await.unwrap();
    ledger.mine_next().await.unwrap();
    let blank = ledger.block(2).await.unwrap();
    assert_eq!(blank.topic(), "");
    assert!(blank.metadata().is_empty());
}

#[tokio::test]
async fn test_restart_resumes_chain() {
    let dir = TempChainDir::new().unwrap();
    let before: Vec<Block> = {
        let ledger = Ledger::open_with_hasher(dir.json_store(), config(2), toy())
            .await
            .unwrap();
        for topic in ["one", "two"] {
            ledger
                .submit_entry(topic, "C", Metadata::new(), vec![])
                .await
                .unwrap();
            ledger.mine_next().await.unwrap();
        }
        ledger
            .submit_entry("never mined", "C", Metadata::new(), vec![])
            .await
            .unwrap();
        let chain = ledger.snapshot().await;
        ledger.shutdown().await.unwrap();
        chain
    };

    let ledger = Ledger::open_with_hasher(dir.json_store(), config(2), toy())
        .await
        .unwrap();
    assert_eq!(ledger.snapshot().await, before);
    assert_eq!(ledger.queue_len().await, 0);

    ledger
        .submit_entry("three", "C", Metadata::new(), vec![2])
        .await
        .unwrap();
    assert!(matches!(
        ledger.mine_next().await.unwrap(),
        MineOutcome::Mined { index: 3, .. }
    ));
}

#[tokio::test]
async fn test_default_file_name_and_sha256() {
    let dir = TempChainDir::new().unwrap();
    let store = JsonFileStore::in_dir(dir.path());
    assert!(store.path().ends_with("aetherflux_chain.json"));

    let ledger = Ledger::open(store, config(1)).await.unwrap();
    let genesis = ledger.tip().await;
    assert_eq!(genesis.compute_hash(&Sha256Hasher), genesis.hash());
}
