//! The store adapter (§4.5): a consumed interface over three keyspaces. Atomicity is per-key;
//! the tracker never requires a multi-key transaction (recovery correctness relies on I1/I2
//! being re-establishable by replay from any committed state).

use async_trait::async_trait;

use crate::{
    block::{DelegateTrees, ParentBlock},
    data::PersistedTrackerState,
    error::StoreError,
    hash::Hash32,
};

#[async_trait]
pub trait ParentChainStore: Send + Sync {
    async fn get_parent_state(&self, pointer: Hash32) -> Result<Option<PersistedTrackerState>, StoreError>;

    /// Atomic. Callers must pass a [`PersistedTrackerState`] — the type itself guarantees
    /// `queue`/`args` can never be written, since it has no such fields (see data.rs).
    async fn write_parent_state(&self, pointer: Hash32, state: &PersistedTrackerState) -> Result<(), StoreError>;

    /// Total on hashes the tracker has ever persisted.
    async fn get_parent_block(&self, hash: Hash32) -> Result<Option<ParentBlock>, StoreError>;

    /// Atomic. Overwrites permitted (last-writer-wins by hash; the spec requires the overwrite
    /// to be identical content, which holds because the processor is deterministic).
    async fn write_parent_block(&self, block: &ParentBlock, trees: &DelegateTrees) -> Result<(), StoreError>;

    /// Returns the trees snapshot associated with a stored parent block.
    async fn get_parent_block_state(&self, hash: Hash32) -> Result<Option<DelegateTrees>, StoreError>;
}

pub mod mock {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    #[derive(Default)]
    pub struct MockParentChainStore {
        state: Mutex<HashMap<Hash32, PersistedTrackerState>>,
        blocks: Mutex<HashMap<Hash32, (ParentBlock, DelegateTrees)>>,
    }

    impl MockParentChainStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ParentChainStore for MockParentChainStore {
        async fn get_parent_state(&self, pointer: Hash32) -> Result<Option<PersistedTrackerState>, StoreError> {
            Ok(self.state.lock().unwrap().get(&pointer).cloned())
        }

        async fn write_parent_state(&self, pointer: Hash32, state: &PersistedTrackerState) -> Result<(), StoreError> {
            self.state.lock().unwrap().insert(pointer, state.clone());
            Ok(())
        }

        async fn get_parent_block(&self, hash: Hash32) -> Result<Option<ParentBlock>, StoreError> {
            Ok(self.blocks.lock().unwrap().get(&hash).map(|(b, _)| b.clone()))
        }

        async fn write_parent_block(&self, block: &ParentBlock, trees: &DelegateTrees) -> Result<(), StoreError> {
            self.blocks
                .lock()
                .unwrap()
                .insert(block.hash(), (block.clone(), trees.clone()));
            Ok(())
        }

        async fn get_parent_block_state(&self, hash: Hash32) -> Result<Option<DelegateTrees>, StoreError> {
            Ok(self.blocks.lock().unwrap().get(&hash).map(|(_, t)| t.clone()))
        }
    }
}
