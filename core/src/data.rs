//! The tracker's owned state (§3 `Data`) and the cursor/indicator bookkeeping rules (§4.3).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    block::{Block, DelegateTrees, ParentBlock},
    hash::{BlockHeight, Hash32},
};

/// The subset of [`Data`] that is actually written to `parent_state(pointer)`. `queue` is
/// deliberately excluded: it is produced fresh by every sync and must never be persisted (see
/// §4.4 and design note in §9 — persisting it "for safety" would violate P2). `args` (the live
/// connector configuration) is likewise excluded; it is supplied anew by whatever re-starts the
/// tracker, not read back from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTrackerState {
    pub pointer: Hash32,
    pub genesis: BlockHeight,
    pub indicator: Hash32,
    pub height: BlockHeight,
    pub cursor: Hash32,
    pub index: u64,
    pub state: DelegateTrees,
}

/// The tracker's full in-memory state. Single owner: the state-machine task (§5).
#[derive(Clone, Debug)]
pub struct Data {
    pub pointer: Hash32,
    pub genesis: BlockHeight,
    pub indicator: Hash32,
    pub height: BlockHeight,
    pub cursor: Hash32,
    pub index: u64,
    pub state: DelegateTrees,
    pub queue: VecDeque<ParentBlock>,
}

impl Data {
    /// The state a freshly-created tracker starts from: `genesis` is the configured pointer's
    /// own derived parent block, so `indicator == cursor == pointer` and `height == 0`.
    pub fn new_at_genesis(pointer: Hash32, genesis: BlockHeight, genesis_trees: DelegateTrees) -> Self {
        Self {
            pointer,
            genesis,
            indicator: pointer,
            height: BlockHeight::zero(),
            cursor: pointer,
            index: 0,
            state: genesis_trees,
            queue: VecDeque::new(),
        }
    }

    pub fn from_persisted(persisted: PersistedTrackerState) -> Self {
        Self {
            pointer: persisted.pointer,
            genesis: persisted.genesis,
            indicator: persisted.indicator,
            height: persisted.height,
            cursor: persisted.cursor,
            index: persisted.index,
            state: persisted.state,
            queue: VecDeque::new(),
        }
    }

    /// The view of `self` that is safe to hand to `store.write_parent_state`: `queue` (and any
    /// live connector configuration, which this crate never stores inside `Data` to begin with —
    /// see DESIGN.md) are excluded.
    pub fn to_persisted(&self) -> PersistedTrackerState {
        PersistedTrackerState {
            pointer: self.pointer,
            genesis: self.genesis,
            indicator: self.indicator,
            height: self.height,
            cursor: self.cursor,
            index: self.index,
            state: self.state.clone(),
        }
    }

    /// `indicate(Data, B)` (§4.3): called when a *new* tip enters the machine. Returns `false`
    /// (and leaves `self` untouched) only for a strictly decreasing tip; a same-height competing
    /// tip (a same-height fork) is accepted with `index = 0`, matching the formula's own
    /// "`index` must be ≥ 0" requirement.
    #[must_use]
    pub fn indicate(&mut self, new_tip: &Block) -> bool {
        let Some(steps) = new_tip.height.steps_since(self.height) else {
            return false;
        };
        self.height = new_tip.height;
        self.indicator = new_tip.hash;
        self.index = steps;
        true
    }

    /// `locate(Data, _B)` (§4.3): called after a single backward step succeeds.
    pub fn locate(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// On entry into `synced`: the new canonical tip becomes the reference point for the next
    /// reorg detection, and `state` is rewound to the delegate trees snapshot at that tip —
    /// `state` is defined (§3) as the accumulated tree *at the current cursor*, and `cursor`
    /// here is being set to `indicator`, so the snapshot the caller passes in must be the one
    /// associated with `indicator`'s block, not whatever was carried in from bootstrap.
    pub fn enter_synced(&mut self, trees_at_indicator: DelegateTrees) {
        self.cursor = self.indicator;
        self.index = 0;
        self.state = trees_at_indicator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ParentTx;

    fn block(hash: u8, prev: u8, height: u64) -> Block {
        Block {
            hash: Hash32::from_bytes([hash; 32]),
            prev_hash: Hash32::from_bytes([prev; 32]),
            height: BlockHeight(height),
            txs: Vec::<ParentTx>::new(),
        }
    }

    #[test]
    fn indicate_rejects_decreasing_tip_but_accepts_same_height() {
        let mut data = Data::new_at_genesis(Hash32::from_bytes([0xAA; 32]), BlockHeight::zero(), DelegateTrees::empty());
        data.height = BlockHeight(5);

        assert!(!data.indicate(&block(1, 0, 4)));
        assert_eq!(data.height, BlockHeight(5));

        assert!(data.indicate(&block(1, 0, 5)));
        assert_eq!(data.height, BlockHeight(5));
        assert_eq!(data.index, 0);
    }

    #[test]
    fn indicate_sets_height_indicator_and_index() {
        let mut data = Data::new_at_genesis(Hash32::from_bytes([0xAA; 32]), BlockHeight::zero(), DelegateTrees::empty());
        data.height = BlockHeight(1);

        assert!(data.indicate(&block(0xBB, 0xAA, 4)));
        assert_eq!(data.height, BlockHeight(4));
        assert_eq!(data.indicator, Hash32::from_bytes([0xBB; 32]));
        assert_eq!(data.index, 3);
    }

    #[test]
    fn locate_decrements_and_saturates() {
        let mut data = Data::new_at_genesis(Hash32::from_bytes([0xAA; 32]), BlockHeight::zero(), DelegateTrees::empty());
        data.index = 1;
        data.locate();
        assert_eq!(data.index, 0);
        data.locate();
        assert_eq!(data.index, 0);
    }

    #[test]
    fn enter_synced_moves_cursor_to_indicator_and_adopts_its_trees() {
        let mut data = Data::new_at_genesis(Hash32::from_bytes([0xAA; 32]), BlockHeight::zero(), DelegateTrees::empty());
        data.indicate(&block(0xBB, 0xAA, 1));
        data.index = 1;

        let mut trees_at_tip = DelegateTrees::empty();
        trees_at_tip.enter(
            crate::block::AccountId(Hash32::from_bytes([1; 32])),
            crate::block::DelegateRecord(b"at-tip".to_vec()),
        );

        data.enter_synced(trees_at_tip.clone());

        assert_eq!(data.cursor, data.indicator);
        assert_eq!(data.index, 0);
        assert_eq!(data.state, trees_at_tip);
    }
}
