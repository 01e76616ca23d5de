use crate::{keccak256, BlockHeader, SealedHeader, SignedTransaction};
use alloy_rlp::Encodable;

/// `body = (transactions, ommers)`. `transactionsRoot` and `ommersHash` in the enclosing header
/// commit to this content.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockBody {
    pub transactions: Vec<SignedTransaction>,
    pub ommers: Vec<BlockHeader>,
}

impl BlockBody {
    /// Computes the ordered Merkle-Patricia trie root over the RLP encoding of each
    /// transaction, in list order — the value a header's `transactionsRoot` must equal.
    pub fn transactions_root(&self) -> alloy_primitives::B256 {
        let encoded: Vec<Vec<u8>> = self
            .transactions
            .iter()
            .map(|tx| {
                let mut buf = Vec::new();
                tx.encode(&mut buf);
                buf
            })
            .collect();
        crate::ordered_trie_root(encoded)
    }

    /// `keccak256(rlp(ommers))` — the value a header's `ommersHash` must equal.
    pub fn ommers_hash(&self) -> alloy_primitives::B256 {
        if self.ommers.is_empty() {
            return crate::empty_ommer_hash();
        }
        let mut buf = Vec::new();
        self.ommers.encode(&mut buf);
        keccak256(&buf)
    }
}

/// `Block = (header, body)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: SealedHeader,
    pub body: BlockBody,
}

impl Block {
    /// Pairs an unsealed header with a body, computing the header's hash.
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header: header.seal_slow(), body }
    }

    /// Checks the universal body-commitment invariant every persisted block must satisfy:
    /// `header.transactionsRoot == MPT_root(body.transactions)` and
    /// `keccak(rlp(body.ommers)) == header.ommersHash`.
    pub fn has_consistent_body(&self) -> bool {
        self.header.transactions_root == self.body.transactions_root()
            && self.header.ommers_hash == self.body.ommers_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TransactionKind, U256};

    fn tx(nonce: u64) -> SignedTransaction {
        SignedTransaction {
            nonce,
            gas_price: U256::from(1u64),
            gas_limit: 21_000,
            to: TransactionKind::Create,
            value: U256::ZERO,
            data: Default::default(),
            v: 27,
            r: U256::from(1u64),
            s: U256::from(1u64),
        }
    }

    #[test]
    fn empty_body_matches_well_known_empty_roots() {
        let body = BlockBody::default();
        assert_eq!(body.transactions_root(), crate::empty_root_hash());
        assert_eq!(body.ommers_hash(), crate::empty_ommer_hash());
    }

    #[test]
    fn transactions_root_changes_with_content() {
        let empty = BlockBody::default();
        let with_tx = BlockBody { transactions: vec![tx(0)], ommers: vec![] };
        assert_ne!(empty.transactions_root(), with_tx.transactions_root());
    }

    #[test]
    fn consistent_body_detection() {
        let body = BlockBody { transactions: vec![tx(0)], ommers: vec![] };
        let mut header = BlockHeader {
            transactions_root: body.transactions_root(),
            ommers_hash: body.ommers_hash(),
            ..Default::default()
        };
        let block = Block::new(header.clone(), body.clone());
        assert!(block.has_consistent_body());

        header.transactions_root = crate::empty_root_hash();
        let bad_block = Block::new(header, body);
        assert!(!bad_block.has_consistent_body());
    }
}
