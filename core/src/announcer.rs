//! The process-wide announcement bus (§6): `announce(from, indicator_hash)` is called exactly
//! once per successful entry into `synced`, happens-after every write issued during that sync
//! (§5).

use async_trait::async_trait;
use log::*;
use tokio::sync::broadcast;

use crate::hash::Hash32;

const LOG_TARGET: &str = "parent_chain_tracker::announcer";

#[async_trait]
pub trait ParentChainAnnouncer: Send + Sync {
    async fn announce(&self, from: Hash32, indicator: Hash32);
}

/// A new confirmed tip, as broadcast to downstream subscribers (the "parent manager" of §1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentChainTip {
    pub from: Hash32,
    pub indicator: Hash32,
}

/// A `broadcast`-channel-backed announcer, for wiring multiple trackers into one process the
/// way the teacher wires `EpochManagerEvent` through a `broadcast::channel` (see
/// `EpochManagerService::spawn`).
#[derive(Clone)]
pub struct BroadcastAnnouncer {
    tx: broadcast::Sender<ParentChainTip>,
}

impl BroadcastAnnouncer {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<ParentChainTip>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParentChainTip> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl ParentChainAnnouncer for BroadcastAnnouncer {
    async fn announce(&self, from: Hash32, indicator: Hash32) {
        if self.tx.send(ParentChainTip { from, indicator }).is_err() {
            debug!(target: LOG_TARGET, "Announced {indicator} but no subscribers were listening");
        }
    }
}

pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Records every `announce` call for assertions in tests (P1, P5).
    #[derive(Default)]
    pub struct RecordingAnnouncer {
        pub calls: Mutex<Vec<ParentChainTip>>,
    }

    impl RecordingAnnouncer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ParentChainTip> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ParentChainAnnouncer for RecordingAnnouncer {
        async fn announce(&self, from: Hash32, indicator: Hash32) {
            self.calls.lock().unwrap().push(ParentChainTip { from, indicator });
        }
    }
}
