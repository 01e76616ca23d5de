use crate::{keccak256, Address, BlockNumber, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// An Ethereum Classic block header.
///
/// Identity is `hash = keccak256(rlp(header))`; nothing about the header is mutable once
/// constructed, which is why [`SealedHeader`] exists to carry the hash alongside it instead of
/// recomputing on every access.
#[derive(Clone, Debug, PartialEq, Eq, RlpDecodable, RlpEncodable, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockHeader {
    /// Hash of the parent block's header.
    pub parent_hash: B256,
    /// Keccak hash of the RLP-encoded list of ommer headers (`uncles`).
    pub ommers_hash: B256,
    /// Address that receives the block reward.
    pub beneficiary: Address,
    /// Root of the state trie after executing this block.
    pub state_root: B256,
    /// Root of the trie of this block's transactions.
    pub transactions_root: B256,
    /// Root of the trie of this block's receipts.
    pub receipts_root: B256,
    /// Bloom filter composed from the logs of every receipt in this block.
    pub logs_bloom: Bloom,
    /// Proof-of-work difficulty target for this block.
    pub difficulty: U256,
    /// Height of this block, counting genesis as zero.
    pub number: BlockNumber,
    /// Maximum gas allowed to be spent by transactions in this block.
    pub gas_limit: u64,
    /// Total gas spent by all transactions in this block.
    pub gas_used: u64,
    /// Unix timestamp this block was sealed at.
    pub timestamp: u64,
    /// Arbitrary byte field, miner-controlled, capped at 32 bytes by consensus rules.
    pub extra_data: Bytes,
    /// Ethash seed hash mixed into the proof-of-work.
    pub mix_hash: B256,
    /// Ethash nonce proving the proof-of-work.
    pub nonce: B64,
}

impl BlockHeader {
    /// `keccak256(rlp(self))` — the header's wire identity.
    pub fn hash_slow(&self) -> B256 {
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(self, &mut buf);
        keccak256(&buf)
    }

    /// Seals the header, pre-computing and freezing its hash.
    pub fn seal_slow(self) -> SealedHeader {
        let hash = self.hash_slow();
        SealedHeader { header: self, hash }
    }

    /// Seals the header with an already-known hash, trusting the caller (e.g. because the hash
    /// came with the header over the wire and will be separately checked).
    pub fn seal(self, hash: B256) -> SealedHeader {
        SealedHeader { header: self, hash }
    }

    /// `true` if this header has no ommers and no transactions, judging solely by the
    /// commitments it carries (an empty-trie transactions root and the canonical empty-list
    /// ommers hash).
    pub fn is_empty(&self) -> bool {
        self.ommers_hash == crate::empty_ommer_hash()
            && self.transactions_root == crate::empty_root_hash()
    }
}

/// A [`BlockHeader`] bundled with its precomputed hash, so hot paths (header chains, the trie
/// scheduler's frontier, the branch resolver) never recompute keccak on every comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedHeader {
    header: BlockHeader,
    hash: B256,
}

impl SealedHeader {
    /// Wraps a header with its hash without verifying it matches — callers that received both
    /// over a channel they trust (e.g. their own RLP decode step) use this to skip the rehash.
    pub fn new_unchecked(header: BlockHeader, hash: B256) -> Self {
        Self { header, hash }
    }

    /// Hash identity of the sealed header.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Borrows the underlying header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Consumes the seal, returning the plain header.
    pub fn unseal(self) -> BlockHeader {
        self.header
    }

    /// Re-derives the hash from the header bytes and checks it against the stored hash —
    /// the check a header must pass before anything downstream trusts `hash()`.
    pub fn is_hash_valid(&self) -> bool {
        self.header.hash_slow() == self.hash
    }
}

impl std::ops::Deref for SealedHeader {
    type Target = BlockHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}
