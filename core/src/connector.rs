//! The connector adapter (§4.6): a consumed interface to the real parent chain. The tracker
//! treats every `on_block` callback delivery as untrusted — validated only by the state
//! machine's own height/hash checks (§4.6).

use async_trait::async_trait;

use crate::{block::Block, error::ConnectorError, hash::Hash32};

/// A handle returned by [`ParentChainConnector::connect`]; `disconnect` is idempotent and takes
/// it back.
pub trait ConnectorHandle: Send + Sync {}

/// Callback invoked by a connector for every new parent-chain top block it observes. Mirrors
/// the teacher's `on_block` installed via `BaseNodeClient`-style connect calls; implementations
/// must be cheap and non-blocking (they typically just forward onto the tracker's own mailbox).
pub type OnBlock = Box<dyn Fn(Block) + Send + Sync>;

#[async_trait]
pub trait ParentChainConnector: Send + Sync {
    type Handle: ConnectorHandle;

    /// Connect to the connector, installing `on_block` to be invoked for every new top.
    async fn connect(&self, args: &serde_json::Value, on_block: OnBlock) -> Result<Self::Handle, ConnectorError>;

    /// Idempotent.
    async fn disconnect(&self, handle: Self::Handle);

    /// Current best tip known to the connector.
    async fn get_top_block(&self) -> Result<Block, ConnectorError>;

    /// Total on hashes the connector has ever produced; fails cleanly otherwise.
    async fn get_block_by_hash(&self, hash: Hash32) -> Result<Block, ConnectorError>;

    /// Submit a transaction; semantics mirror the parent chain.
    async fn send_tx(&self, payload: Vec<u8>) -> Result<(), ConnectorError>;
}

pub mod mock {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::*;

    /// An in-memory, fork-capable parent chain. Tests build one of these, publish blocks onto
    /// it, and hand a [`MockConnector`] wrapping it to the tracker under test.
    #[derive(Default)]
    pub struct MockChain {
        blocks: HashMap<Hash32, Block>,
        tip: Option<Hash32>,
        on_block: Option<OnBlock>,
        pub send_tx_log: Vec<Vec<u8>>,
        pub reject_sends: bool,
    }

    impl MockChain {
        pub fn insert(&mut self, block: Block) {
            self.blocks.insert(block.hash, block);
        }

        /// Publish `hash` as the new tip, inserting `block` if it is not already known, and
        /// invoking the installed `on_block` callback exactly as a real connector would.
        pub fn publish(&mut self, block: Block) {
            let hash = block.hash;
            self.blocks.insert(hash, block.clone());
            self.tip = Some(hash);
            if let Some(cb) = self.on_block.as_ref() {
                cb(block);
            }
        }
    }

    #[derive(Clone)]
    pub struct MockConnector(pub Arc<Mutex<MockChain>>);

    impl MockConnector {
        pub fn new(chain: Arc<Mutex<MockChain>>) -> Self {
            Self(chain)
        }
    }

    pub struct MockHandle;
    impl ConnectorHandle for MockHandle {}

    #[async_trait]
    impl ParentChainConnector for MockConnector {
        type Handle = MockHandle;

        async fn connect(&self, _args: &serde_json::Value, on_block: OnBlock) -> Result<Self::Handle, ConnectorError> {
            self.0.lock().unwrap().on_block = Some(on_block);
            Ok(MockHandle)
        }

        async fn disconnect(&self, _handle: Self::Handle) {
            self.0.lock().unwrap().on_block = None;
        }

        async fn get_top_block(&self) -> Result<Block, ConnectorError> {
            let chain = self.0.lock().unwrap();
            let tip = chain.tip.ok_or(ConnectorError::ConnectionFailed)?;
            chain
                .blocks
                .get(&tip)
                .cloned()
                .ok_or_else(|| ConnectorError::BlockNotFound(tip.to_hex()))
        }

        async fn get_block_by_hash(&self, hash: Hash32) -> Result<Block, ConnectorError> {
            self.0
                .lock()
                .unwrap()
                .blocks
                .get(&hash)
                .cloned()
                .ok_or_else(|| ConnectorError::BlockNotFound(hash.to_hex()))
        }

        async fn send_tx(&self, payload: Vec<u8>) -> Result<(), ConnectorError> {
            let mut chain = self.0.lock().unwrap();
            if chain.reject_sends {
                return Err(ConnectorError::SendTxRejected("rejected by mock connector".to_string()));
            }
            chain.send_tx_log.push(payload);
            Ok(())
        }
    }
}
