//! The public surface of this crate (§6): `start`, `send_tx`, `pop`, `process_block`, `publish`,
//! `stop`. A [`TrackerHandle`] is a cheap, cloneable capability over a running tracker's mailbox
//! — the same shape as the teacher's `EpochManagerHandle` (a `Sender` plus `oneshot` replies).

use std::sync::Arc;

use log::*;
use tokio::task::JoinHandle;

use crate::{
    announcer::ParentChainAnnouncer,
    block::{Block, ParentBlock},
    config::TrackerConfig,
    connector::ParentChainConnector,
    error::TrackerError,
    hash::Hash32,
    machine::{Command, Dispatcher, PopResult},
    shutdown::ShutdownTrigger,
    store::ParentChainStore,
};

const LOG_TARGET: &str = "parent_chain_tracker::handle";

/// Error returned to a `pop`/`process_block`/`send_tx` caller when the instance has already
/// stopped and can no longer reply.
#[derive(Debug, thiserror::Error)]
#[error("parent chain tracker instance is no longer running")]
pub struct InstanceStopped;

// `shutdown` is behind an `Arc` so `TrackerHandle` stays cheaply cloneable: only the first
// `stop()` call across all clones actually fires the trigger, subsequent calls are a harmless
// no-op (idempotent, matching `connector.disconnect`'s contract).
#[derive(Clone)]
pub struct TrackerHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Command>,
    shutdown: Arc<ShutdownTrigger>,
}

impl TrackerHandle {
    /// `send_tx(instance, payload, reply_to)`: forward to `connector.send_tx`.
    pub async fn send_tx(&self, payload: Vec<u8>) -> Result<Result<(), TrackerError>, InstanceStopped> {
        let (reply_to, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(Command::SendTx { payload, reply_to })
            .map_err(|_| InstanceStopped)?;
        rx.await.map_err(|_| InstanceStopped)
    }

    /// `process_block(instance, hash, reply_to)`.
    pub async fn process_block(&self, hash: Hash32) -> Result<Option<ParentBlock>, InstanceStopped> {
        let (reply_to, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(Command::ProcessBlock { hash, reply_to })
            .map_err(|_| InstanceStopped)?;
        rx.await.map_err(|_| InstanceStopped)
    }

    /// `pop(instance, reply_to)`.
    pub async fn pop(&self) -> Result<PopResult, InstanceStopped> {
        let (reply_to, rx) = tokio::sync::oneshot::channel();
        self.tx.send(Command::Pop { reply_to }).map_err(|_| InstanceStopped)?;
        rx.await.map_err(|_| InstanceStopped)
    }

    /// `publish(instance, block)`: called by the connector callback only, in production; tests
    /// may also call this directly to simulate a connector push.
    pub fn publish(&self, block: Block) {
        if self.tx.send(Command::Publish(block)).is_err() {
            warn!(target: LOG_TARGET, "Tried to publish {} to a stopped tracker instance", block.hash);
        }
    }

    /// `stop(instance) -> ok`.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// `start(connector_id, args, pointer_hex) -> instance_handle`: constructs and spawns a tracker
/// task, returning a handle to it immediately (the task itself performs connect/init-state/
/// sync-state/prime asynchronously).
pub fn start<C, S, A>(
    connector: C,
    store: S,
    announcer: A,
    config: TrackerConfig,
) -> (TrackerHandle, JoinHandle<Result<(), TrackerError>>)
where
    C: ParentChainConnector + 'static,
    S: ParentChainStore + 'static,
    A: ParentChainAnnouncer + 'static,
{
    let (tx, rx) = Dispatcher::<C, S, A>::channel();
    let dispatcher = Dispatcher::new(Arc::new(connector), Arc::new(store), Arc::new(announcer), config, tx.clone(), rx);
    let (trigger, shutdown) = ShutdownTrigger::new();

    let join = tokio::spawn(async move {
        let result = dispatcher.run(shutdown).await;
        if let Err(ref err) = result {
            error!(target: LOG_TARGET, "Parent chain tracker stopped with error: {err}");
        }
        result
    });

    let handle = TrackerHandle {
        tx,
        shutdown: Arc::new(trigger),
    };
    (handle, join)
}
