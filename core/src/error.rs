use crate::hash::BlockHeight;

/// Errors surfaced by a [`crate::store::ParentChainStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("parent block {0} not found in store")]
    MissingParentBlock(String),
    #[error("parent state for pointer {0} not found in store")]
    MissingParentState(String),
    #[error("store backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Errors surfaced by a [`crate::connector::ParentChainConnector`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("could not connect to parent chain connector")]
    ConnectionFailed,
    #[error("block {0} not found by connector")]
    BlockNotFound(String),
    #[error("connector rejected transaction: {0}")]
    SendTxRejected(String),
    #[error("connector backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// The tracker's top-level error type. A `TrackerError` surfacing out of the state-machine
/// task's run loop is fatal for that instance: the task terminates and a supervising process
/// is expected to restart it from the last committed `parent_state` (see §7 of the spec).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error("State machine got exceeded genesis entry (genesis: {genesis}, height: {height})")]
    GenesisExceeded { genesis: BlockHeight, height: BlockHeight },
    #[error("store is missing an ancestor required to re-establish invariant I2: {0}")]
    MissingAncestor(String),
}
