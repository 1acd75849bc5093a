//! Raw parent-chain blocks as produced by a [`crate::connector::ParentChainConnector`], and the
//! derived, content-addressed parent blocks this crate persists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::hash::{BlockHeight, Hash32};

/// An account identifier as decoded from a commitment or delegate transaction's sender. This
/// crate treats it as an opaque 32-byte value; it never interprets it beyond using it as a map
/// key into [`DelegateTrees`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Hash32);

/// A single parent-chain transaction as the connector hands it to us: a sender account plus an
/// opaque, possibly-unrecognised payload. Decoding the payload is this crate's job, not the
/// connector's (see [`decode_payload`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentTx {
    pub account: AccountId,
    pub payload: Vec<u8>,
}

/// A raw parent-chain block, as returned by `connector.get_block_by_hash`/`get_top_block`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash32,
    pub prev_hash: Hash32,
    pub height: BlockHeight,
    pub txs: Vec<ParentTx>,
}

/// Tag byte for [`decode_payload`]'s wire format. Any other leading byte (or an empty payload)
/// decodes to [`ParentTxPayload::Other`] — recognition is total, never panics.
const TAG_COMMITMENT: u8 = 0x01;
const TAG_DELEGATE: u8 = 0x02;

/// The result of recognising a transaction's payload. Supersedes a pair of `is_commitment`/
/// `is_delegate` predicates with a single tagged-variant decode (see design note in §9 of the
/// spec), so a transaction is parsed exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentTxPayload {
    Commitment { keyblock_hash: Hash32 },
    Delegate { payload: Vec<u8> },
    Other,
}

/// Total: never panics, regardless of how short or malformed `payload` is.
pub fn decode_payload(payload: &[u8]) -> ParentTxPayload {
    match payload.split_first() {
        Some((&TAG_COMMITMENT, rest)) if rest.len() == 32 => {
            let mut buf = [0u8; 32];
            buf.copy_from_slice(rest);
            ParentTxPayload::Commitment {
                keyblock_hash: Hash32::from_bytes(buf),
            }
        },
        Some((&TAG_DELEGATE, rest)) => ParentTxPayload::Delegate { payload: rest.to_vec() },
        _ => ParentTxPayload::Other,
    }
}

/// `(delegate_account, committed_keyblock_hash)`, decoded from a commitment transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub account: AccountId,
    pub keyblock_hash: Hash32,
}

impl Commitment {
    /// Content hash of this commitment, used to populate the parent block header's
    /// `commitment_hashes` list.
    pub fn hash(&self) -> Hash32 {
        let mut hasher = Sha256::new();
        hasher.update(self.account.0.as_bytes());
        hasher.update(self.keyblock_hash.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Hash32::from_bytes(bytes)
    }
}

/// A single delegate registration, as carried by a delegate transaction's payload. Opaque to
/// this crate beyond the raw bytes: downstream consumers interpret delegate payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRecord(pub Vec<u8>);

/// The accumulated `account -> delegate` tree at some point in the parent chain's history.
/// A plain, structurally-shared snapshot: the spec requires byte-identical persisted snapshots
/// (P2) and does not ask for a merkleized/authenticated tree, so a `BTreeMap` gives
/// deterministic iteration order and cheap equality for free.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateTrees(BTreeMap<AccountId, DelegateRecord>);

impl DelegateTrees {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &AccountId) -> Option<&DelegateRecord> {
        self.0.get(account)
    }

    pub fn enter(&mut self, account: AccountId, record: DelegateRecord) {
        self.0.insert(account, record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Content-addressed header of a derived parent block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBlockHeader {
    pub hash: Hash32,
    pub prev_hash: Hash32,
    pub height: BlockHeight,
    pub commitment_hashes: Vec<Hash32>,
}

/// A derived parent block: header plus the commitments extracted from the source block, as
/// persisted under `parent_block(hash)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBlock {
    pub header: ParentBlockHeader,
    pub commitments: Vec<Commitment>,
}

impl ParentBlock {
    pub fn hash(&self) -> Hash32 {
        self.header.hash
    }
}

/// Derive a genesis parent block directly from the connector's block at the configured
/// `pointer`: no predecessor is ever walked to, so there are no commitments to extract beyond
/// whatever the genesis block itself carries.
pub fn genesis_parent_block(genesis: &Block) -> (ParentBlock, DelegateTrees) {
    process_block(genesis, DelegateTrees::empty())
}

/// Pure, deterministic, idempotent (§4.2): partitions `block.txs` by recognised payload tag,
/// builds the header and the commitment list (in transaction order, per P7), and folds delegate
/// registrations into `trees`. Does not touch the store — persistence is the caller's job (the
/// state machine), matching the separation the spec draws between "processor" and "store
/// adapter".
pub fn process_block(block: &Block, mut trees: DelegateTrees) -> (ParentBlock, DelegateTrees) {
    let mut commitments = Vec::new();
    for tx in &block.txs {
        match decode_payload(&tx.payload) {
            ParentTxPayload::Commitment { keyblock_hash } => {
                commitments.push(Commitment {
                    account: tx.account,
                    keyblock_hash,
                });
            },
            ParentTxPayload::Delegate { payload } => {
                trees.enter(tx.account, DelegateRecord(payload));
            },
            ParentTxPayload::Other => {},
        }
    }

    let commitment_hashes = commitments.iter().map(Commitment::hash).collect();
    let header = ParentBlockHeader {
        hash: block.hash,
        prev_hash: block.prev_hash,
        height: block.height,
        commitment_hashes,
    };
    let parent_block = ParentBlock { header, commitments };
    (parent_block, trees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(byte: u8) -> AccountId {
        AccountId(Hash32::from_bytes([byte; 32]))
    }

    #[test]
    fn decode_payload_is_total_on_garbage() {
        assert_eq!(decode_payload(&[]), ParentTxPayload::Other);
        assert_eq!(decode_payload(&[TAG_COMMITMENT]), ParentTxPayload::Other);
        assert_eq!(decode_payload(&[TAG_COMMITMENT, 1, 2, 3]), ParentTxPayload::Other);
        assert_eq!(decode_payload(&[0xff, 1, 2, 3]), ParentTxPayload::Other);
        assert!(matches!(
            decode_payload(&[TAG_DELEGATE]),
            ParentTxPayload::Delegate { payload } if payload.is_empty()
        ));
    }

    #[test]
    fn decode_payload_recognises_commitment_and_delegate() {
        let mut commitment_payload = vec![TAG_COMMITMENT];
        commitment_payload.extend_from_slice(&[7u8; 32]);
        assert_eq!(
            decode_payload(&commitment_payload),
            ParentTxPayload::Commitment {
                keyblock_hash: Hash32::from_bytes([7u8; 32])
            }
        );

        let mut delegate_payload = vec![TAG_DELEGATE];
        delegate_payload.extend_from_slice(b"delegate-blob");
        assert_eq!(
            decode_payload(&delegate_payload),
            ParentTxPayload::Delegate {
                payload: b"delegate-blob".to_vec()
            }
        );
    }

    #[test]
    fn process_block_is_deterministic_and_idempotent() {
        let mut commitment_payload = vec![TAG_COMMITMENT];
        commitment_payload.extend_from_slice(&[9u8; 32]);
        let mut delegate_payload = vec![TAG_DELEGATE];
        delegate_payload.extend_from_slice(b"hello");

        let block = Block {
            hash: Hash32::from_bytes([1u8; 32]),
            prev_hash: Hash32::from_bytes([0u8; 32]),
            height: BlockHeight(1),
            txs: vec![
                ParentTx {
                    account: acct(1),
                    payload: commitment_payload,
                },
                ParentTx {
                    account: acct(2),
                    payload: delegate_payload,
                },
                ParentTx {
                    account: acct(3),
                    payload: vec![0xaa, 0xbb],
                },
            ],
        };

        let (pb1, trees1) = process_block(&block, DelegateTrees::empty());
        let (pb2, trees2) = process_block(&block, DelegateTrees::empty());

        assert_eq!(pb1, pb2);
        assert_eq!(trees1, trees2);
        assert_eq!(pb1.commitments.len(), 1);
        assert_eq!(pb1.header.commitment_hashes.len(), 1);
        assert_eq!(trees1.len(), 1);
        assert_eq!(trees1.get(&acct(2)), Some(&DelegateRecord(b"hello".to_vec())));
    }
}
