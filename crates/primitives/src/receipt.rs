use crate::{log::logs_bloom, Bloom, Log, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

/// The post-execution outcome of a transaction: either the state root after execution
/// (pre-Byzantium) or a boolean success status (post-Byzantium, EIP-658).
///
/// Which variant a given block uses is a protocol-version fact, not something the receipt
/// itself can tell you in isolation — see [`Receipt::with_state_root`]/[`Receipt::with_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostState {
    /// The state root committed to by transactions before the Byzantium fork.
    StateRoot(B256),
    /// The boolean success status committed to by transactions from Byzantium onward.
    Status(bool),
}

/// `(postStateOrStatus, cumulativeGasUsed, logsBloom, logs)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub post_state: PostState,
    pub cumulative_gas_used: u64,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Computes the bloom filter implied by this receipt's logs — callers that need the
    /// bloom-bearing wire encoding use [`ReceiptWithBloom`] instead of recomputing this by hand.
    pub fn bloom(&self) -> Bloom {
        logs_bloom(&self.logs)
    }

    /// Builds a pre-Byzantium receipt, committing to the post-execution state root.
    pub fn with_state_root(state_root: B256, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self { post_state: PostState::StateRoot(state_root), cumulative_gas_used, logs }
    }

    /// Builds a post-Byzantium receipt (EIP-658), committing to a boolean success status
    /// instead of a state root. Which of these two constructors a block uses is the
    /// protocol-version-dependent choice flagged in the component spec (open question (ii));
    /// decoding itself needs no such flag because the two wire encodings are self-describing
    /// (see `ReceiptWithBloom::decode`).
    pub fn with_status(success: bool, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self { post_state: PostState::Status(success), cumulative_gas_used, logs }
    }
}

/// A receipt paired with its logs bloom — the wire/storage representation (the bloom is
/// redundant with `logs` but persisted so readers never have to recompute it).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptWithBloom {
    pub receipt: Receipt,
    pub bloom: Bloom,
}

impl ReceiptWithBloom {
    fn payload_length(&self) -> usize {
        let post_state_len = match self.receipt.post_state {
            PostState::StateRoot(root) => root.length(),
            PostState::Status(status) => (status as u8).length(),
        };
        post_state_len
            + self.receipt.cumulative_gas_used.length()
            + self.bloom.length()
            + self.receipt.logs.length()
    }
}

impl Encodable for ReceiptWithBloom {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_length() }.encode(out);
        match self.receipt.post_state {
            PostState::StateRoot(root) => root.encode(out),
            PostState::Status(status) => (status as u8).encode(out),
        }
        self.receipt.cumulative_gas_used.encode(out);
        self.bloom.encode(out);
        self.receipt.logs.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

/// Computes the ordered Merkle-Patricia trie root over the RLP encoding of each receipt, in
/// list order — the value a header's `receiptsRoot` must equal.
pub fn receipts_root(receipts: &[ReceiptWithBloom]) -> B256 {
    let encoded: Vec<Vec<u8>> = receipts
        .iter()
        .map(|r| {
            let mut buf = Vec::new();
            r.encode(&mut buf);
            buf
        })
        .collect();
    crate::ordered_trie_root(encoded)
}

impl Decodable for ReceiptWithBloom {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();

        // A status byte is RLP-encoded as a single byte (0x00, 0x01, or their bare
        // single-byte forms); a state root is always a 32-byte string (header 0xa0 + 32 bytes).
        // The two encodings are distinguishable by the first byte of the field.
        let post_state = match buf.first() {
            Some(0x80) | Some(0x01) => PostState::Status(u8::decode(buf)? != 0),
            _ => PostState::StateRoot(B256::decode(buf)?),
        };
        let cumulative_gas_used = u64::decode(buf)?;
        let bloom = Bloom::decode(buf)?;
        let logs = Vec::<Log>::decode(buf)?;

        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }

        Ok(Self { receipt: Receipt { post_state, cumulative_gas_used, logs }, bloom })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Address;

    fn sample_receipt(post_state: PostState) -> Receipt {
        Receipt {
            post_state,
            cumulative_gas_used: 21_000,
            logs: vec![Log { address: Address::with_last_byte(9), topics: vec![], data: Default::default() }],
        }
    }

    #[test]
    fn status_receipt_round_trips() {
        let receipt = sample_receipt(PostState::Status(true));
        let with_bloom = ReceiptWithBloom { bloom: receipt.bloom(), receipt };
        let mut buf = Vec::new();
        with_bloom.encode(&mut buf);
        let decoded = ReceiptWithBloom::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(with_bloom, decoded);
        assert!(matches!(decoded.receipt.post_state, PostState::Status(true)));
    }

    #[test]
    fn state_root_receipt_round_trips() {
        let receipt = sample_receipt(PostState::StateRoot(B256::with_last_byte(3)));
        let with_bloom = ReceiptWithBloom { bloom: receipt.bloom(), receipt };
        let mut buf = Vec::new();
        with_bloom.encode(&mut buf);
        let decoded = ReceiptWithBloom::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(with_bloom, decoded);
        assert!(matches!(decoded.receipt.post_state, PostState::StateRoot(_)));
    }

    #[test]
    fn receipts_root_changes_with_content() {
        let empty: Vec<ReceiptWithBloom> = vec![];
        let receipt = sample_receipt(PostState::Status(true));
        let with_one = vec![ReceiptWithBloom { bloom: receipt.bloom(), receipt }];
        assert_ne!(receipts_root(&empty), receipts_root(&with_one));
    }

    #[test]
    fn false_status_and_zero_root_are_still_distinguishable() {
        // a false status (0x80, the empty-string encoding of 0u8) must never be mistaken for
        // a zeroed state root (also starts with a trie-string header, but 32 bytes long).
        let status_receipt = sample_receipt(PostState::Status(false));
        let root_receipt = sample_receipt(PostState::StateRoot(B256::ZERO));
        let status_wb = ReceiptWithBloom { bloom: status_receipt.bloom(), receipt: status_receipt };
        let root_wb = ReceiptWithBloom { bloom: root_receipt.bloom(), receipt: root_receipt };
        let mut status_buf = Vec::new();
        status_wb.encode(&mut status_buf);
        let mut root_buf = Vec::new();
        root_wb.encode(&mut root_buf);
        assert_ne!(status_buf, root_buf);
        let decoded_status = ReceiptWithBloom::decode(&mut status_buf.as_slice()).unwrap();
        assert!(matches!(decoded_status.receipt.post_state, PostState::Status(false)));
    }
}
