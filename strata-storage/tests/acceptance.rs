//! Acceptance tests for strata-storage.
//!
//! These tests drive the block store end to end:
//! 1. Chain linkage: every stored block points at the stored hash below it
//! 2. Round trip: stored blocks decode to identical bytes, compressed or not
//! 3. Sharding: a 1KB shard threshold rolls over to shard 2, history stays readable
//! 4. Restart: shards written by one run are rediscovered by the next

use std::sync::Arc;

use tempfile::TempDir;

use strata_core::serialization::serialize;
use strata_core::{
    Action, Address, Block, BlockBody, BlockFooter, BlockHeader, Endorsement, Envelope, Hash256,
    KeyPair, Receipt, SealedEnvelope, Signature, ZERO_HASH,
};
use strata_storage::{
    ArtifactKind, BlockDao, CountingMetrics, DbConfig, IndexMode, KvIndexer, MemoryBackend,
    MemoryShardFactory, RocksShardFactory, ShardFactory, StorageError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn producer() -> KeyPair {
    KeyPair::from_seed(&[0x51; 32])
}

fn actions(height: u64, count: u64) -> Vec<SealedEnvelope> {
    let sender = KeyPair::from_seed(&[0x52; 32]);
    (0..count)
        .map(|i| {
            let action = Action::Transfer {
                recipient: Address([0x07; 20]),
                amount: u128::from(height * 1_000 + i),
                payload: b"acceptance".to_vec(),
            };
            Envelope::new(height * 100 + i + 1, 50_000, 2, action).seal(&sender)
        })
        .collect()
}

fn build_block(height: u64, prev_hash: Hash256, action_count: u64) -> Block {
    let body = BlockBody::new(actions(height, action_count));
    let mut header = BlockHeader {
        version: BlockHeader::VERSION,
        height,
        timestamp: 1_700_000_000 + height * 5,
        prev_hash,
        tx_root: body.tx_root(),
        delta_state_digest: [height as u8; 32],
        receipt_root: ZERO_HASH,
        producer: producer().public_key(),
        signature: Signature::empty(),
    };
    header.sign(&producer());
    let hash = header.hash();
    let endorser = KeyPair::from_seed(&[0x53; 32]);
    let footer = BlockFooter {
        commit_time: header.timestamp + 1,
        endorsements: vec![Endorsement::new(&endorser, &hash, header.timestamp + 1)],
    };
    Block::new(header, body, footer)
}

fn append_blocks<F: ShardFactory>(dao: &BlockDao<F>, count: u64, action_count: u64) -> Vec<Block> {
    let mut prev_hash = dao.get_tip_hash().unwrap();
    let first = dao.get_tip_height().unwrap() + 1;
    (first..first + count)
        .map(|height| {
            let block = build_block(height, prev_hash, action_count);
            dao.put_block(&block).unwrap();
            prev_hash = block.hash();
            block
        })
        .collect()
}

fn rocks_config(dir: &TempDir) -> DbConfig {
    DbConfig {
        db_path: dir.path().join("chain.db"),
        num_retries: 2,
        ..DbConfig::default()
    }
}

// ============================================================================
// Test 1: Chain linkage
// ============================================================================

#[test]
fn test_prev_hash_links_to_stored_hash() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let dao = BlockDao::open_rocks(rocks_config(&dir));
    dao.start().unwrap();

    append_blocks(&dao, 10, 2);

    let tip = dao.get_tip_height().unwrap();
    assert_eq!(tip, 10);
    for height in 1..=tip {
        let block = dao.get_block_by_height(height).unwrap();
        assert_eq!(block.prev_hash(), dao.get_block_hash(height - 1).unwrap());
        assert_eq!(block.hash(), dao.get_block_hash(height).unwrap());
    }
    assert_eq!(dao.get_tip_hash().unwrap(), dao.get_block_hash(tip).unwrap());
    dao.stop().unwrap();
}

#[test]
fn test_start_fails_on_unusable_directory() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let not_a_dir = dir.path().join("plain-file");
    std::fs::write(&not_a_dir, b"not a directory").unwrap();

    let config = DbConfig {
        db_path: not_a_dir.join("chain.db"),
        num_retries: 1,
        ..DbConfig::default()
    };
    let dao = BlockDao::open_rocks(config);
    assert!(matches!(dao.start(), Err(StorageError::Io(_))));
}

// ============================================================================
// Test 2: Round trip
// ============================================================================

#[test]
fn test_round_trip_with_and_without_compression() {
    init_tracing();
    for compress_block in [false, true] {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(CountingMetrics::new());
        let config = DbConfig {
            compress_block,
            ..rocks_config(&dir)
        };
        let dao = BlockDao::open_rocks(config).with_metrics(metrics.clone());
        dao.start().unwrap();

        for block in append_blocks(&dao, 5, 3) {
            let loaded = dao.get_block(&block.hash()).unwrap();
            assert_eq!(serialize(&loaded).unwrap(), serialize(&block).unwrap());
        }

        let expected = if compress_block { 5 } else { 0 };
        assert_eq!(metrics.observations("compress_header"), expected);
        assert_eq!(metrics.observations("decompress_body"), expected);
        assert_eq!(metrics.misses(ArtifactKind::Footer), 5);
        dao.stop().unwrap();
    }
}

#[test]
fn test_rejected_and_deleted_blocks() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let dao = BlockDao::open_rocks(rocks_config(&dir));
    dao.start().unwrap();

    assert!(matches!(dao.delete_tip_block(), Err(StorageError::CannotDeleteGenesis)));

    let blocks = append_blocks(&dao, 3, 1);
    let duplicate = build_block(3, blocks[1].hash(), 0);
    assert!(matches!(
        dao.put_block(&duplicate),
        Err(StorageError::AlreadyExists { height: 3, tip: 3 })
    ));
    assert_eq!(dao.get_tip_hash().unwrap(), blocks[2].hash());

    dao.delete_tip_block().unwrap();
    assert_eq!(dao.get_tip_height().unwrap(), 2);
    assert_eq!(dao.get_tip_hash().unwrap(), blocks[1].hash());
    assert!(dao.get_block_by_height(3).unwrap_err().is_not_exist());

    // The freed height accepts a different block
    dao.put_block(&duplicate).unwrap();
    assert_eq!(dao.get_block_by_height(3).unwrap(), duplicate);
    dao.stop().unwrap();
}

#[test]
fn test_receipts_through_action_index() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = DbConfig {
        index_mode: IndexMode::BlockAndActions,
        ..rocks_config(&dir)
    };
    let indexer = Arc::new(KvIndexer::new(Arc::new(MemoryBackend::new())));
    let dao = BlockDao::open_rocks(config).with_indexer(indexer);
    dao.start().unwrap();

    for block in append_blocks(&dao, 3, 2) {
        let receipts: Vec<Receipt> = block
            .actions()
            .iter()
            .map(|selp| Receipt::success(block.height(), selp.hash(), 12_345))
            .collect();
        dao.put_receipts(block.height(), &receipts).unwrap();
    }

    let block = dao.get_block_by_height(2).unwrap();
    let action_hash = block.actions()[1].hash();
    let receipt = dao.get_receipt_by_action_hash(&action_hash).unwrap();
    assert_eq!(receipt.block_height, 2);
    assert_eq!(receipt.action_hash, action_hash);
    dao.stop().unwrap();
}

// ============================================================================
// Test 3: Shard rollover
// ============================================================================

#[test]
fn test_shard_rollover_at_one_kilobyte() {
    init_tracing();
    let factory = MemoryShardFactory::new();
    let config = DbConfig {
        split_db_size_bytes: 1024,
        split_db_height: 0,
        ..DbConfig::default()
    };
    let dao = BlockDao::new(factory.clone(), config);
    dao.start().unwrap();

    let mut stored = Vec::new();
    while !factory.exists(2) {
        assert!(stored.len() < 64, "shard 2 never opened");
        stored.extend(append_blocks(&dao, 1, 4));
    }

    let shard1 = factory.shard(1).unwrap();
    let shard2 = factory.shard(2).unwrap();
    let last = stored.last().unwrap();
    assert!(shard2.exists(strata_storage::Namespace::Header, &last.hash()).unwrap());
    assert!(shard1.exists(strata_storage::Namespace::Header, &stored[0].hash()).unwrap());

    for block in &stored {
        assert_eq!(&dao.get_block(&block.hash()).unwrap(), block);
    }
}

// ============================================================================
// Test 4: Restart
// ============================================================================

#[test]
fn test_restart_rediscovers_shards() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = DbConfig {
        split_db_size_bytes: 1,
        split_db_height: 0,
        ..rocks_config(&dir)
    };

    let blocks = {
        let dao = BlockDao::open_rocks(config.clone());
        dao.start().unwrap();
        let blocks = append_blocks(&dao, 3, 2);
        dao.stop().unwrap();
        blocks
    };

    let shards = RocksShardFactory::new(&config.db_path, 1).discover().unwrap();
    assert!(shards.contains(&1));

    let dao = BlockDao::open_rocks(config);
    dao.start().unwrap();
    assert_eq!(dao.get_tip_height().unwrap(), 3);
    assert_eq!(dao.get_tip_hash().unwrap(), blocks[2].hash());
    for block in &blocks {
        assert_eq!(&dao.get_block(&block.hash()).unwrap(), block);
    }

    let next = append_blocks(&dao, 1, 1).remove(0);
    assert_eq!(dao.get_block_by_height(4).unwrap(), next);
    dao.stop().unwrap();
}
