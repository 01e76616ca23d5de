use alloy_primitives::B256;
use sha3::{Digest, Keccak256};
use std::sync::OnceLock;

/// Keccak-256 of `bytes` — the universal hash of the wire protocol, the trie, and block/header
/// identity.
pub fn keccak256(bytes: impl AsRef<[u8]>) -> B256 {
    B256::from_slice(Keccak256::digest(bytes.as_ref()).as_slice())
}

/// `keccak256(rlp(empty_list))`, the `ommersHash`/trie-root of an empty RLP list — what a header
/// with no ommers and a genesis transaction trie commit to.
pub fn empty_ommer_hash() -> B256 {
    static CELL: OnceLock<B256> = OnceLock::new();
    *CELL.get_or_init(|| keccak256([0xc0u8]))
}

/// keccak256 of the RLP encoding of an empty byte string — the root of a trie with no entries.
pub fn empty_root_hash() -> B256 {
    static CELL: OnceLock<B256> = OnceLock::new();
    *CELL.get_or_init(|| keccak256([0x80u8]))
}
