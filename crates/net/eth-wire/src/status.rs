use crate::EthVersion;
use alloy_primitives::{B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use etc_primitives::ChainWeight;

/// The weight field of a [`Status`] handshake: a bare total difficulty on PV62/PV63, or a full
/// [`ChainWeight`] on ETC64. Which shape is on the wire depends entirely on the negotiated
/// [`EthVersion`], so encoding/decoding this type takes the version as explicit context rather
/// than being self-describing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusWeight {
    /// PV62/PV63 payload: a plain total difficulty.
    TotalDifficulty(U256),
    /// ETC64 payload: `(totalDifficulty, latestCheckpointNumber)`.
    ChainWeight(ChainWeight),
}

impl StatusWeight {
    fn payload_length(&self) -> usize {
        match self {
            Self::TotalDifficulty(td) => td.length(),
            Self::ChainWeight(weight) => {
                weight.total_difficulty.length() + weight.latest_checkpoint_number.length()
            }
        }
    }

    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::TotalDifficulty(td) => td.encode(out),
            Self::ChainWeight(weight) => {
                let payload_length = weight.total_difficulty.length()
                    + weight.latest_checkpoint_number.length();
                Header { list: true, payload_length }.encode(out);
                weight.total_difficulty.encode(out);
                weight.latest_checkpoint_number.encode(out);
            }
        }
    }

    pub(crate) fn decode(buf: &mut &[u8], version: EthVersion) -> alloy_rlp::Result<Self> {
        if version.uses_chain_weight() {
            let header = Header::decode(buf)?;
            if !header.list {
                return Err(alloy_rlp::Error::UnexpectedString);
            }
            let total_difficulty = U256::decode(buf)?;
            let latest_checkpoint_number = u64::decode(buf)?;
            Ok(Self::ChainWeight(ChainWeight { total_difficulty, latest_checkpoint_number }))
        } else {
            Ok(Self::TotalDifficulty(U256::decode(buf)?))
        }
    }
}

/// The handshake message every peer connection opens with:
/// `(protocolVersion, networkId, weight, bestHash, genesisHash)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub version: EthVersion,
    pub network_id: u64,
    pub weight: StatusWeight,
    pub best_hash: B256,
    pub genesis_hash: B256,
}

impl Status {
    fn payload_length(&self) -> usize {
        (self.version as u8).length()
            + self.network_id.length()
            + self.weight.payload_length_with_header()
            + self.best_hash.length()
            + self.genesis_hash.length()
    }
}

impl StatusWeight {
    fn payload_length_with_header(&self) -> usize {
        match self {
            Self::TotalDifficulty(td) => td.length(),
            Self::ChainWeight(_) => {
                let inner = self.payload_length();
                inner + Header { list: true, payload_length: inner }.length()
            }
        }
    }
}

impl Encodable for Status {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_length() }.encode(out);
        (self.version as u8).encode(out);
        self.network_id.encode(out);
        self.weight.encode(out);
        self.best_hash.encode(out);
        self.genesis_hash.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl Status {
    /// Decodes a status message whose protocol version is already known (it is the first field
    /// on the wire, so callers peek it before deciding how to decode [`StatusWeight`]).
    pub fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let raw_version = u8::decode(buf)?;
        let version = EthVersion::try_from(raw_version)
            .map_err(|_| alloy_rlp::Error::Custom("unsupported eth wire protocol version"))?;
        let network_id = u64::decode(buf)?;
        let weight = StatusWeight::decode(buf, version)?;
        let best_hash = B256::decode(buf)?;
        let genesis_hash = B256::decode(buf)?;
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(Self { version, network_id, weight, best_hash, genesis_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pv63_status_round_trips_with_plain_total_difficulty() {
        let status = Status {
            version: EthVersion::Eth63,
            network_id: 1,
            weight: StatusWeight::TotalDifficulty(U256::from(1_000_000u64)),
            best_hash: B256::repeat_byte(1),
            genesis_hash: B256::repeat_byte(2),
        };
        let mut buf = Vec::new();
        status.encode(&mut buf);
        let decoded = Status::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(status, decoded);
    }

    #[test]
    fn etc64_status_round_trips_with_chain_weight() {
        let status = Status {
            version: EthVersion::Etc64,
            network_id: 61,
            weight: StatusWeight::ChainWeight(ChainWeight {
                total_difficulty: U256::from(500u64),
                latest_checkpoint_number: 42,
            }),
            best_hash: B256::repeat_byte(3),
            genesis_hash: B256::repeat_byte(4),
        };
        let mut buf = Vec::new();
        status.encode(&mut buf);
        let decoded = Status::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(status, decoded);
        assert!(matches!(decoded.weight, StatusWeight::ChainWeight(_)));
    }
}
