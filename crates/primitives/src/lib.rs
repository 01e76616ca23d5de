//! Core block, transaction, receipt and chain-weight types used across the sync core.
//!
//! This crate intentionally knows nothing about networking, storage engines or execution —
//! it is the shared vocabulary every other crate in the workspace builds on, the same role
//! `reth-primitives` plays for the rest of that codebase's crates.

mod body;
mod chain_weight;
mod hash;
mod header;
pub mod log;
mod receipt;
mod transaction;

pub use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};

pub use body::{Block, BlockBody};
pub use chain_weight::ChainWeight;
pub use hash::{empty_ommer_hash, empty_root_hash, keccak256};
pub use header::{BlockHeader, SealedHeader};
pub use log::{logs_bloom, Log};
pub use receipt::{receipts_root, PostState, Receipt, ReceiptWithBloom};
pub use transaction::{SignedTransaction, TransactionError, TransactionKind};

/// Block height. Ethereum Classic never reaches values that need more than 64 bits here.
pub type BlockNumber = u64;

/// keccak256 hash of an RLP-encoded list, used to check `ommersHash`/`transactionsRoot` style
/// commitments computed over encoded items rather than over an ordered trie.
pub fn keccak_rlp_list<T: alloy_rlp::Encodable>(items: &[T]) -> B256 {
    let mut buf = Vec::new();
    alloy_rlp::encode_list(items, &mut buf);
    keccak256(&buf)
}

/// Computes the ordered Merkle-Patricia trie root over RLP-encoded leaves, keyed by the RLP
/// encoding of their list index — the construction used for `transactionsRoot` and
/// `receiptsRoot`.
pub fn ordered_trie_root<T: AsRef<[u8]>>(leaves: impl IntoIterator<Item = T>) -> B256 {
    let leaves: Vec<T> = leaves.into_iter().collect();
    alloy_trie::root::ordered_trie_root_with_encoder(&leaves, |item, buf| {
        buf.extend_from_slice(item.as_ref())
    })
}
