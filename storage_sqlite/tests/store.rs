//! Migrations run cleanly and round-trip get/put for all three keyspaces, against an in-memory
//! (`:memory:`) SQLite connection -- in the same style as the teacher's
//! `dan_layer/storage_sqlite/tests/global_db.rs`.

use parent_chain_tracker::{
    store::ParentChainStore, AccountId, BlockHeight, Commitment, DelegateRecord, DelegateTrees, Hash32, ParentBlock,
    ParentBlockHeader, PersistedTrackerState,
};
use parent_chain_tracker_storage_sqlite::SqliteParentChainStore;

fn h(b: u8) -> Hash32 {
    Hash32::from_bytes([b; 32])
}

fn sample_block(hash: u8, prev: u8, height: u64) -> ParentBlock {
    let commitment = Commitment {
        account: AccountId(h(1)),
        keyblock_hash: h(2),
    };
    ParentBlock {
        header: ParentBlockHeader {
            hash: h(hash),
            prev_hash: h(prev),
            height: BlockHeight(height),
            commitment_hashes: vec![commitment.hash()],
        },
        commitments: vec![commitment],
    }
}

#[tokio::test]
async fn migrations_run_and_missing_keys_are_absent() {
    let store = SqliteParentChainStore::connect(":memory:").unwrap();

    assert!(store.get_parent_state(h(0xAA)).await.unwrap().is_none());
    assert!(store.get_parent_block(h(0xAA)).await.unwrap().is_none());
    assert!(store.get_parent_block_state(h(0xAA)).await.unwrap().is_none());
}

#[tokio::test]
async fn parent_state_round_trips() {
    let store = SqliteParentChainStore::connect(":memory:").unwrap();

    let mut trees = DelegateTrees::empty();
    trees.enter(AccountId(h(3)), DelegateRecord(b"hello".to_vec()));

    let state = PersistedTrackerState {
        pointer: h(0xAA),
        genesis: BlockHeight(0),
        indicator: h(0xBB),
        height: BlockHeight(1),
        cursor: h(0xBB),
        index: 0,
        state: trees,
    };

    store.write_parent_state(h(0xAA), &state).await.unwrap();
    let roundtripped = store.get_parent_state(h(0xAA)).await.unwrap().unwrap();
    assert_eq!(roundtripped, state);
}

#[tokio::test]
async fn parent_state_write_overwrites_last_writer_wins() {
    let store = SqliteParentChainStore::connect(":memory:").unwrap();

    let first = PersistedTrackerState {
        pointer: h(0xAA),
        genesis: BlockHeight(0),
        indicator: h(0xBB),
        height: BlockHeight(1),
        cursor: h(0xBB),
        index: 0,
        state: DelegateTrees::empty(),
    };
    let mut second = first.clone();
    second.indicator = h(0xCC);
    second.height = BlockHeight(2);

    store.write_parent_state(h(0xAA), &first).await.unwrap();
    store.write_parent_state(h(0xAA), &second).await.unwrap();

    let roundtripped = store.get_parent_state(h(0xAA)).await.unwrap().unwrap();
    assert_eq!(roundtripped, second);
}

#[tokio::test]
async fn parent_block_and_block_state_round_trip_together() {
    let store = SqliteParentChainStore::connect(":memory:").unwrap();

    let block = sample_block(0xCC, 0xBB, 4);
    let mut trees = DelegateTrees::empty();
    trees.enter(AccountId(h(9)), DelegateRecord(b"delegate".to_vec()));

    store.write_parent_block(&block, &trees).await.unwrap();

    let roundtripped_block = store.get_parent_block(h(0xCC)).await.unwrap().unwrap();
    assert_eq!(roundtripped_block, block);

    let roundtripped_trees = store.get_parent_block_state(h(0xCC)).await.unwrap().unwrap();
    assert_eq!(roundtripped_trees, trees);
}

#[tokio::test]
async fn parent_block_write_overwrites_by_hash() {
    let store = SqliteParentChainStore::connect(":memory:").unwrap();

    let block = sample_block(0xCC, 0xBB, 4);
    store.write_parent_block(&block, &DelegateTrees::empty()).await.unwrap();
    // Re-processing the same block during a reorg re-derives byte-identical content (P2); the
    // store must accept the overwrite rather than erroring on a duplicate key.
    store.write_parent_block(&block, &DelegateTrees::empty()).await.unwrap();

    let roundtripped = store.get_parent_block(h(0xCC)).await.unwrap().unwrap();
    assert_eq!(roundtripped, block);
}
