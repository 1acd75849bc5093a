//! Shared scaffolding for the integration tests in this directory: a short-hex `Hash32`
//! convention matching the spec scenarios' literal `0xAA`/`0xBB` style, and a harness that starts
//! a tracker instance against in-memory fakes and exposes the same store/announcer/chain handles
//! the running instance uses (so a test can inspect them after `start` takes ownership).

use std::sync::Arc;

use parent_chain_tracker::{
    announcer::mock::RecordingAnnouncer,
    connector::mock::{MockChain, MockConnector},
    store::mock::MockParentChainStore,
    Block, BlockHeight, Hash32, ParentTx, TrackerConfig,
};

/// A 32-byte hash whose every byte is `b`, letting tests spell scenario hashes as `h(0xAA)`.
pub fn h(b: u8) -> Hash32 {
    Hash32::from_bytes([b; 32])
}

pub fn block(hash: u8, prev: u8, height: u64) -> Block {
    block_with_txs(hash, prev, height, Vec::new())
}

pub fn block_with_txs(hash: u8, prev: u8, height: u64, txs: Vec<ParentTx>) -> Block {
    Block {
        hash: h(hash),
        prev_hash: h(prev),
        height: BlockHeight(height),
        txs,
    }
}

/// A fresh, empty chain/store/announcer trio plus the `TrackerConfig` pointing at `pointer`.
pub struct Fixture {
    pub chain: Arc<std::sync::Mutex<MockChain>>,
    pub store: Arc<MockParentChainStore>,
    pub announcer: Arc<RecordingAnnouncer>,
    pub config: TrackerConfig,
}

impl Fixture {
    pub fn new(pointer: u8, genesis: u64) -> Self {
        Self {
            chain: Arc::new(std::sync::Mutex::new(MockChain::default())),
            store: Arc::new(MockParentChainStore::new()),
            announcer: Arc::new(RecordingAnnouncer::new()),
            config: TrackerConfig {
                connector_id: "mock".to_string(),
                connector_args: serde_json::Value::Null,
                pointer_hex: h(pointer).to_hex(),
                genesis: BlockHeight(genesis),
            },
        }
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector::new(self.chain.clone())
    }

    /// Spawns the tracker and blocks until its initial bootstrap + sync has completed and
    /// `drive` is polling the mailbox — every command sent before this point would otherwise
    /// just queue silently in the mailbox rather than being observably processed yet.
    ///
    /// Uses `process_block` rather than `pop` as the synchronization barrier: `pop` would
    /// destructively drain whatever the initial sync just queued, corrupting FIFO-order
    /// assertions a test makes afterward.
    pub async fn start(&self) -> parent_chain_tracker::TrackerHandle {
        let (handle, _join) = parent_chain_tracker::start(
            self.connector(),
            ArcStore(self.store.clone()),
            ArcAnnouncer(self.announcer.clone()),
            self.config.clone(),
        );
        handle
            .process_block(h(0xff))
            .await
            .expect("tracker instance stopped during bootstrap");
        handle
    }
}

/// Thin `Arc`-forwarding wrapper so the harness can retain its own handle to the same store the
/// running tracker instance uses, rather than losing access once `start` takes ownership.
pub struct ArcStore(pub Arc<MockParentChainStore>);

#[async_trait::async_trait]
impl parent_chain_tracker::store::ParentChainStore for ArcStore {
    async fn get_parent_state(
        &self,
        pointer: Hash32,
    ) -> Result<Option<parent_chain_tracker::PersistedTrackerState>, parent_chain_tracker::StoreError> {
        self.0.get_parent_state(pointer).await
    }

    async fn write_parent_state(
        &self,
        pointer: Hash32,
        state: &parent_chain_tracker::PersistedTrackerState,
    ) -> Result<(), parent_chain_tracker::StoreError> {
        self.0.write_parent_state(pointer, state).await
    }

    async fn get_parent_block(
        &self,
        hash: Hash32,
    ) -> Result<Option<parent_chain_tracker::ParentBlock>, parent_chain_tracker::StoreError> {
        self.0.get_parent_block(hash).await
    }

    async fn write_parent_block(
        &self,
        block: &parent_chain_tracker::ParentBlock,
        trees: &parent_chain_tracker::DelegateTrees,
    ) -> Result<(), parent_chain_tracker::StoreError> {
        self.0.write_parent_block(block, trees).await
    }

    async fn get_parent_block_state(
        &self,
        hash: Hash32,
    ) -> Result<Option<parent_chain_tracker::DelegateTrees>, parent_chain_tracker::StoreError> {
        self.0.get_parent_block_state(hash).await
    }
}

/// Round-trips a `process_block` through the running instance's mailbox and back, without
/// touching the pop queue — the non-destructive counterpart to the `pop`-as-barrier trick used
/// by [`Fixture::start`].
pub async fn barrier(handle: &parent_chain_tracker::TrackerHandle) {
    handle.process_block(h(0xff)).await.expect("tracker instance stopped unexpectedly");
}

pub struct ArcAnnouncer(pub Arc<RecordingAnnouncer>);

#[async_trait::async_trait]
impl parent_chain_tracker::announcer::ParentChainAnnouncer for ArcAnnouncer {
    async fn announce(&self, from: Hash32, indicator: Hash32) {
        self.0.announce(from, indicator).await
    }
}
