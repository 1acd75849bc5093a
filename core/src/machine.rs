//! The three-state traversal/reorg state machine (§4.1) and its dispatcher.
//!
//! There is no explicit "postponed events" queue here, even though §4.4 calls postponement
//! load-bearing. Instead, `fetched`/`migrated` are implemented as a single non-suspending* local
//! loop (`Dispatcher::sync`) that does not poll the mailbox at all while it runs — exactly the
//! loop-vs-self-send equivalence the design note in §9 calls out. Every `publish`/`send_tx`/
//! `process_block`/`pop` sent while that loop is running simply queues up in the mailbox's FIFO
//! buffer in arrival order, and is handled once the loop returns control to
//! [`Dispatcher::drive`] having reached `synced` — which is precisely P5's guarantee, achieved
//! without a second queue to keep in sync with the mailbox's own ordering.
//! (*non-suspending except at the connector/store `.await` points §5 explicitly allows.)

use std::sync::Arc;

use log::*;
use tokio::sync::{mpsc, oneshot};

use crate::{
    block::{genesis_parent_block, process_block, Block, ParentBlock},
    config::TrackerConfig,
    connector::{OnBlock, ParentChainConnector},
    data::Data,
    error::{StoreError, TrackerError},
    hash::Hash32,
    announcer::ParentChainAnnouncer,
    shutdown::ShutdownSignal,
    store::ParentChainStore,
};

const LOG_TARGET: &str = "parent_chain_tracker::machine";

/// Reply to a `pop` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopResult {
    Value(ParentBlock),
    Empty,
}

/// Client-cast and connector-pushed events, each carrying its own `reply_to` where the spec
/// calls for one. `Publish` has no reply — the connector calls it fire-and-forget.
pub(crate) enum Command {
    Publish(Block),
    SendTx {
        payload: Vec<u8>,
        reply_to: oneshot::Sender<Result<(), TrackerError>>,
    },
    ProcessBlock {
        hash: Hash32,
        reply_to: oneshot::Sender<Option<ParentBlock>>,
    },
    Pop {
        reply_to: oneshot::Sender<PopResult>,
    },
}

pub struct Dispatcher<C: ParentChainConnector, S: ParentChainStore, A: ParentChainAnnouncer> {
    connector: Arc<C>,
    store: Arc<S>,
    announcer: Arc<A>,
    config: TrackerConfig,
    data: Data,
    rx: mpsc::UnboundedReceiver<Command>,
    tx: mpsc::UnboundedSender<Command>,
}

impl<C, S, A> Dispatcher<C, S, A>
where
    C: ParentChainConnector + 'static,
    S: ParentChainStore + 'static,
    A: ParentChainAnnouncer + 'static,
{
    pub(crate) fn channel() -> (mpsc::UnboundedSender<Command>, mpsc::UnboundedReceiver<Command>) {
        mpsc::unbounded_channel()
    }

    pub(crate) fn new(
        connector: Arc<C>,
        store: Arc<S>,
        announcer: Arc<A>,
        config: TrackerConfig,
        tx: mpsc::UnboundedSender<Command>,
        rx: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            connector,
            store,
            announcer,
            config,
            // Replaced by `bootstrap` before `drive` ever runs; a tracker is never observable
            // in this placeholder state.
            data: Data::new_at_genesis(Hash32::zero(), crate::hash::BlockHeight::zero(), Default::default()),
            rx,
            tx,
        }
    }

    /// Runs the `init` transition (§4.1) and then the steady-state loop, until `shutdown` fires
    /// or a fatal error (genesis exceeded, a propagated store/connector error) stops the task.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<(), TrackerError> {
        let on_block_tx = self.tx.clone();
        let on_block: OnBlock = Box::new(move |block| {
            if on_block_tx.send(Command::Publish(block)).is_err() {
                warn!(target: LOG_TARGET, "Tracker mailbox closed; dropping connector block push");
            }
        });
        let handle = self
            .connector
            .connect(&self.config.connector_args, on_block)
            .await?;

        let result = self.run_inner(&mut shutdown).await;

        self.connector.disconnect(handle).await;
        result
    }

    async fn run_inner(&mut self, shutdown: &mut ShutdownSignal) -> Result<(), TrackerError> {
        if let Some(first) = self.bootstrap().await? {
            self.sync(first).await?;
        }
        self.drive(shutdown).await
    }

    /// init-state + sync-state + prime (§2, §4.1 "Initial transition"): create the genesis
    /// parent block if the store has no record at `pointer`, load (or start fresh from) the
    /// persisted tracker state, then fetch the connector's current top and fold it in via
    /// `indicate`.
    async fn bootstrap(&mut self) -> Result<Option<Block>, TrackerError> {
        let pointer = self.config.pointer().map_err(|e| {
            TrackerError::Store(StoreError::Backend(anyhow::anyhow!("invalid pointer_hex: {e}")))
        })?;

        if self.store.get_parent_block(pointer).await?.is_none() {
            let genesis_block = self.connector.get_block_by_hash(pointer).await?;
            let (parent_block, trees) = genesis_parent_block(&genesis_block);
            self.store.write_parent_block(&parent_block, &trees).await?;
            let initial = Data::new_at_genesis(pointer, self.config.genesis, trees);
            // §9 Open Question 2: this initial commit is a persisted-only side effect; the
            // in-memory `Data` of the running task is established by the `sync_state` load
            // immediately below, not by this write.
            self.store.write_parent_state(pointer, &initial.to_persisted()).await?;
        }

        let persisted = self
            .store
            .get_parent_state(pointer)
            .await?
            .ok_or_else(|| StoreError::MissingParentState(pointer.to_hex()))?;
        self.data = Data::from_persisted(persisted);

        let top = self.connector.get_top_block().await?;
        if self.data.indicate(&top) {
            Ok(Some(top))
        } else {
            Ok(None)
        }
    }

    /// The steady-state loop (`synced`'s event handling, §4.1): services the mailbox until
    /// shutdown, entering a sync walk (which blocks the loop, see module docs) whenever a
    /// monotonic `publish` arrives.
    async fn drive(&mut self, shutdown: &mut ShutdownSignal) -> Result<(), TrackerError> {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!(target: LOG_TARGET, "Shutdown requested, stopping parent chain tracker");
                    return Ok(());
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await?,
                        None => {
                            debug!(target: LOG_TARGET, "Mailbox closed, stopping parent chain tracker");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) -> Result<(), TrackerError> {
        match cmd {
            Command::Publish(block) => {
                if self.data.indicate(&block) {
                    self.sync(block).await?;
                } else {
                    warn!(
                        target: LOG_TARGET,
                        "Ignoring non-monotonic tip {} at height {} (current height {})",
                        block.hash,
                        block.height,
                        self.data.height
                    );
                }
            },
            Command::SendTx { payload, reply_to } => {
                let result = self.connector.send_tx(payload).await.map_err(TrackerError::from);
                let _ = reply_to.send(result);
            },
            Command::ProcessBlock { hash, reply_to } => {
                let result = self.store.get_parent_block(hash).await?;
                let _ = reply_to.send(result);
            },
            Command::Pop { reply_to } => {
                let result = match self.data.queue.pop_front() {
                    Some(block) => PopResult::Value(block),
                    None => PopResult::Empty,
                };
                let _ = reply_to.send(result);
            },
        }
        Ok(())
    }

    /// `fetched` followed, if needed, by `migrated` (§4.1): walks backward from `first` until it
    /// meets the already-known chain, then performs the `synced`-entry side effects.
    ///
    /// The walk only *discovers* blocks backward; it does not process them in that order. A
    /// block's trees snapshot is derived from `store.get_parent_block_state(block.prev_hash)`
    /// (§4.3 Open Question 3), which is only available once the predecessor itself has been
    /// processed — so a block is processed only after every block beneath it in this sync has
    /// been. `finish_sync` replays the discovered path oldest-first once a known ancestor is
    /// found, which is also the order P6 requires `pop` to hand blocks back in.
    async fn sync(&mut self, first: Block) -> Result<(), TrackerError> {
        let mut path = Vec::new();
        let mut current = first;

        // state `fetched`: linear extension from a new tip.
        loop {
            if current.hash == self.data.cursor {
                return self.finish_sync(path).await;
            }
            if self.data.index == 0 {
                // index == 0 but hash didn't match cursor: a fork exists.
                break;
            }
            let prev_hash = current.prev_hash;
            path.push(current);
            let prev = self.connector.get_block_by_hash(prev_hash).await?;
            self.data.locate();
            current = prev;
        }

        // state `migrated`: backward walk across a fork. `old_probe` walks the already-stored
        // canonical chain backward in lockstep with `current` (the new chain) — both start at
        // the same height, so comparing `current`'s parent against `old_probe`'s stored parent
        // at each step is what actually finds the shared ancestor, however many levels deep the
        // fork goes. A single comparison against `cursor`'s own parent (fixed for the whole
        // walk) would only ever catch a one-level-deep fork.
        let mut old_probe = self.data.cursor;
        loop {
            let prev_hash = current.prev_hash;
            let height = current.height;
            path.push(current);

            let old_probe_block = self
                .store
                .get_parent_block(old_probe)
                .await?
                .ok_or_else(|| TrackerError::MissingAncestor(old_probe.to_hex()))?;
            let db_prev_hash = old_probe_block.header.prev_hash;

            if prev_hash == db_prev_hash {
                return self.finish_sync(path).await;
            }
            if height < self.data.genesis {
                return Err(TrackerError::GenesisExceeded {
                    genesis: self.data.genesis,
                    height,
                });
            }
            let prev = self.connector.get_block_by_hash(prev_hash).await?;
            self.data.locate();
            old_probe = db_prev_hash;
            current = prev;
        }
    }

    /// Processes every block discovered by a backward walk, oldest first, then performs the
    /// `synced`-entry side effects.
    async fn finish_sync(&mut self, path: Vec<Block>) -> Result<(), TrackerError> {
        for block in path.into_iter().rev() {
            self.process_and_store(&block).await?;
        }
        self.enter_synced().await
    }

    /// Run the block processor for `block`, re-deriving the working trees snapshot from the
    /// store rather than trusting any carried `Data.state` (§9 Open Question 3), persist the
    /// result, and push it onto the queue for downstream `pop`.
    async fn process_and_store(&mut self, block: &Block) -> Result<(), TrackerError> {
        let prev_trees = self
            .store
            .get_parent_block_state(block.prev_hash)
            .await?
            .ok_or_else(|| TrackerError::MissingAncestor(block.prev_hash.to_hex()))?;
        let (parent_block, trees) = process_block(block, prev_trees);
        self.store.write_parent_block(&parent_block, &trees).await?;
        self.data.queue.push_back(parent_block);
        Ok(())
    }

    async fn enter_synced(&mut self) -> Result<(), TrackerError> {
        let trees_at_indicator = self
            .store
            .get_parent_block_state(self.data.indicator)
            .await?
            .ok_or_else(|| TrackerError::MissingAncestor(self.data.indicator.to_hex()))?;
        self.data.enter_synced(trees_at_indicator);
        self.store
            .write_parent_state(self.data.pointer, &self.data.to_persisted())
            .await?;
        info!(target: LOG_TARGET, "Parent chain tracker synced to {}", self.data.indicator);
        self.announcer.announce(self.data.pointer, self.data.indicator).await;
        Ok(())
    }
}
