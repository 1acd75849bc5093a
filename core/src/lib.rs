//! A per-chain state machine that mirrors an external ("parent") blockchain into a local,
//! canonical, content-addressed store for a hyperchain/sidechain node.
//!
//! For each configured parent chain, one [`handle::start`]ed tracker instance owns a
//! *connector* (an adapter to the real blockchain, [`connector::ParentChainConnector`]), walks
//! blocks backward from the current top until it meets an already-known ancestor, extracts
//! commitment and delegate transactions ([`block`]), persists derived parent blocks together
//! with accumulated delegate trees ([`store::ParentChainStore`]), and advertises the new
//! confirmed tip on a process-wide announcement bus ([`announcer::ParentChainAnnouncer`]).
//!
//! # Glossary
//!
//! - **Parent chain.** The external blockchain this tracker mirrors.
//! - **Commitment.** A parent-chain transaction whose payload references a hyperchain key-block
//!   hash, signalling participation.
//! - **Delegate.** A parent-chain transaction whose payload registers an account as a delegate
//!   in the tracker's delegate tree.
//! - **Indicator.** Hash of the most recent canonical tip after a successful sync.
//! - **Cursor.** Hash currently under inspection during a backward walk.
//! - **Genesis (here).** Not the parent chain's genesis, but the configured lower height bound
//!   below which reorgs are declared fatal.
//! - **Pointer.** Configured hash identifying the tracker's history origin and the key under
//!   which its persisted state lives.

pub mod announcer;
pub mod block;
pub mod config;
pub mod connector;
pub mod data;
pub mod error;
pub mod handle;
mod machine;
pub mod shutdown;
pub mod store;

pub use block::{AccountId, Block, Commitment, DelegateRecord, DelegateTrees, ParentBlock, ParentBlockHeader, ParentTx};
pub use config::TrackerConfig;
pub use data::{Data, PersistedTrackerState};
pub use error::{ConnectorError, StoreError, TrackerError};
pub use handle::{start, InstanceStopped, TrackerHandle};
pub use hash::{BlockHeight, Hash32, Hash32ParseError};
pub use machine::PopResult;

mod hash;
