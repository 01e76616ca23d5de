use crate::status::StatusWeight;
use alloy_primitives::{Bytes, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header, RlpDecodable, RlpEncodable};
use etc_primitives::{BlockHeader, BlockNumber, ReceiptWithBloom, SignedTransaction};

macro_rules! hash_list_message {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, Default)]
        pub struct $name(pub Vec<B256>);

        impl Encodable for $name {
            fn encode(&self, out: &mut dyn BufMut) {
                self.0.encode(out)
            }
            fn length(&self) -> usize {
                self.0.length()
            }
        }

        impl Decodable for $name {
            fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
                Ok(Self(Vec::<B256>::decode(buf)?))
            }
        }
    };
}

/// `(hash, number)` pair announced by [`NewBlockHashes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlockHashNumber {
    pub hash: B256,
    pub number: BlockNumber,
}

/// `NewBlockHashes([{hash, number}])` — lightweight announcement, body fetched separately.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NewBlockHashes(pub Vec<BlockHashNumber>);

impl Encodable for NewBlockHashes {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for NewBlockHashes {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self(Vec::<BlockHashNumber>::decode(buf)?))
    }
}

/// Either end of a [`GetBlockHeaders`] request's `origin` field: peers may anchor the request at
/// a known hash or at a height. The two encodings (32-byte string vs. integer) are
/// self-describing on the wire by length, so no tag byte is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashOrNumber {
    Hash(B256),
    Number(BlockNumber),
}

impl Encodable for HashOrNumber {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Hash(hash) => hash.encode(out),
            Self::Number(number) => number.encode(out),
        }
    }
    fn length(&self) -> usize {
        match self {
            Self::Hash(hash) => hash.length(),
            Self::Number(number) => number.length(),
        }
    }
}

impl Decodable for HashOrNumber {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        // B256's RLP string header always encodes a fixed 32-byte payload (prefix 0xa0); any
        // other string header is a short integer.
        match buf.first() {
            Some(0xa0) => Ok(Self::Hash(B256::decode(buf)?)),
            _ => Ok(Self::Number(BlockNumber::decode(buf)?)),
        }
    }
}

/// `GetBlockHeaders(origin, maxHeaders, skip, reverse)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetBlockHeaders {
    pub origin: HashOrNumber,
    pub max_headers: u64,
    pub skip: u64,
    pub reverse: bool,
}

impl GetBlockHeaders {
    fn payload_length(&self) -> usize {
        self.origin.length() + self.max_headers.length() + self.skip.length()
            + (self.reverse as u8).length()
    }
}

impl Encodable for GetBlockHeaders {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_length() }.encode(out);
        self.origin.encode(out);
        self.max_headers.encode(out);
        self.skip.encode(out);
        (self.reverse as u8).encode(out);
    }
    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Decodable for GetBlockHeaders {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let origin = HashOrNumber::decode(buf)?;
        let max_headers = u64::decode(buf)?;
        let skip = u64::decode(buf)?;
        let reverse = u8::decode(buf)? != 0;
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(Self { origin, max_headers, skip, reverse })
    }
}

/// `BlockHeaders([header])` — the response to [`GetBlockHeaders`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockHeaders(pub Vec<BlockHeader>);

impl Encodable for BlockHeaders {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for BlockHeaders {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self(Vec::<BlockHeader>::decode(buf)?))
    }
}

hash_list_message!(GetBlockBodies, "`GetBlockBodies([hash])` — request bodies by block hash.");
hash_list_message!(GetReceipts, "`GetReceipts([hash])` — request receipt lists by block hash.");
hash_list_message!(GetNodeData, "`GetNodeData([hash])` — request trie/code node bytes by keccak.");

/// One block's body as carried inside [`BlockBodies`]: `(transactions, ommers)`.
#[derive(Clone, Debug, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct BodyPayload {
    pub transactions: Vec<SignedTransaction>,
    pub ommers: Vec<BlockHeader>,
}

/// `BlockBodies([body])` — the response to [`GetBlockBodies`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockBodies(pub Vec<BodyPayload>);

impl Encodable for BlockBodies {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for BlockBodies {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self(Vec::<BodyPayload>::decode(buf)?))
    }
}

/// `Receipts([[receipt]])` — the response to [`GetReceipts`], one receipt list per requested
/// block.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Receipts(pub Vec<Vec<ReceiptWithBloom>>);

impl Encodable for Receipts {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for Receipts {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self(Vec::<Vec<ReceiptWithBloom>>::decode(buf)?))
    }
}

/// `NodeData([bytes])` — the response to [`GetNodeData`], raw RLP-encoded trie/code bytes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NodeData(pub Vec<Bytes>);

impl Encodable for NodeData {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for NodeData {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Ok(Self(Vec::<Bytes>::decode(buf)?))
    }
}

/// `NewBlock(block, totalDifficulty_or_chainWeight)` — full block gossip, `weight` shaped per
/// the negotiated [`crate::EthVersion`] exactly like [`crate::Status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBlock {
    pub header: BlockHeader,
    pub transactions: Vec<SignedTransaction>,
    pub ommers: Vec<BlockHeader>,
    pub weight: StatusWeight,
}

impl NewBlock {
    fn block_payload_length(&self) -> usize {
        self.header.length() + self.transactions.length() + self.ommers.length()
    }

    fn weight_length(&self) -> usize {
        match self.weight {
            StatusWeight::TotalDifficulty(td) => td.length(),
            StatusWeight::ChainWeight(weight) => {
                let inner = weight.total_difficulty.length()
                    + weight.latest_checkpoint_number.length();
                inner + Header { list: true, payload_length: inner }.length()
            }
        }
    }
}

impl Encodable for NewBlock {
    fn encode(&self, out: &mut dyn BufMut) {
        let block_payload_length = self.block_payload_length();
        let outer_payload_length =
            block_payload_length + Header { list: true, payload_length: block_payload_length }.length()
                + self.weight_length();
        Header { list: true, payload_length: outer_payload_length }.encode(out);
        Header { list: true, payload_length: block_payload_length }.encode(out);
        self.header.encode(out);
        self.transactions.encode(out);
        self.ommers.encode(out);
        match self.weight {
            StatusWeight::TotalDifficulty(td) => td.encode(out),
            StatusWeight::ChainWeight(weight) => {
                let inner =
                    weight.total_difficulty.length() + weight.latest_checkpoint_number.length();
                Header { list: true, payload_length: inner }.encode(out);
                weight.total_difficulty.encode(out);
                weight.latest_checkpoint_number.encode(out);
            }
        }
    }

    fn length(&self) -> usize {
        let block_payload_length = self.block_payload_length();
        let payload_length =
            block_payload_length + Header { list: true, payload_length: block_payload_length }.length()
                + self.weight_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl NewBlock {
    /// Decodes a `NewBlock` message whose protocol version is already known, needed to decide
    /// how the trailing weight field is shaped.
    pub fn decode(buf: &mut &[u8], version: crate::EthVersion) -> alloy_rlp::Result<Self> {
        let outer = Header::decode(buf)?;
        if !outer.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let outer_started = buf.len();

        let block_header = Header::decode(buf)?;
        if !block_header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let block_started = buf.len();
        let header = BlockHeader::decode(buf)?;
        let transactions = Vec::<SignedTransaction>::decode(buf)?;
        let ommers = Vec::<BlockHeader>::decode(buf)?;
        let block_consumed = block_started - buf.len();
        if block_consumed != block_header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: block_header.payload_length,
                got: block_consumed,
            });
        }

        let weight = crate::status::StatusWeight::decode(buf, version)?;

        let outer_consumed = outer_started - buf.len();
        if outer_consumed != outer.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: outer.payload_length,
                got: outer_consumed,
            });
        }
        Ok(Self { header, transactions, ommers, weight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn hash_or_number_round_trips_both_variants() {
        let hash = HashOrNumber::Hash(B256::repeat_byte(9));
        let mut buf = Vec::new();
        hash.encode(&mut buf);
        assert_eq!(HashOrNumber::decode(&mut buf.as_slice()).unwrap(), hash);

        let number = HashOrNumber::Number(12345);
        let mut buf = Vec::new();
        number.encode(&mut buf);
        assert_eq!(HashOrNumber::decode(&mut buf.as_slice()).unwrap(), number);
    }

    #[test]
    fn get_block_headers_round_trips() {
        let msg = GetBlockHeaders {
            origin: HashOrNumber::Number(100),
            max_headers: 192,
            skip: 0,
            reverse: false,
        };
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(GetBlockHeaders::decode(&mut buf.as_slice()).unwrap(), msg);
    }

    #[test]
    fn hash_list_message_round_trips() {
        let msg = GetBlockBodies(vec![B256::repeat_byte(1), B256::repeat_byte(2)]);
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(GetBlockBodies::decode(&mut buf.as_slice()).unwrap(), msg);
    }

    #[test]
    fn new_block_round_trips_etc64_chain_weight() {
        use etc_primitives::ChainWeight;
        let msg = NewBlock {
            header: BlockHeader::default(),
            transactions: vec![],
            ommers: vec![],
            weight: StatusWeight::ChainWeight(ChainWeight {
                total_difficulty: U256::from(1u64),
                latest_checkpoint_number: 3,
            }),
        };
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        let decoded = NewBlock::decode(&mut buf.as_slice(), crate::EthVersion::Etc64).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn node_data_round_trips() {
        let msg = NodeData(vec![Bytes::from(vec![1, 2, 3]), Bytes::from(vec![4])]);
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(NodeData::decode(&mut buf.as_slice()).unwrap(), msg);
    }
}
