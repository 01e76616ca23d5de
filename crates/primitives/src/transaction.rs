use crate::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, Header};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, SECP256K1,
};

/// The `to` field of a legacy transaction: either a call to an existing account/contract, or a
/// contract-creation (the empty RLP string).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransactionKind {
    /// Deploys a new contract; `to` is RLP-encoded as the empty byte string.
    #[default]
    Create,
    /// Calls (or sends value to) an existing address.
    Call(Address),
}

impl Encodable for TransactionKind {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Create => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
            Self::Call(address) => address.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Create => 1,
            Self::Call(address) => address.length(),
        }
    }
}

impl Decodable for TransactionKind {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        if let Some(&first) = buf.first() {
            if first == alloy_rlp::EMPTY_STRING_CODE {
                buf.advance(1);
                return Ok(Self::Create);
            }
        }
        Ok(Self::Call(Address::decode(buf)?))
    }
}

/// A legacy-format signed Ethereum Classic transaction: RLP of
/// `(nonce, gasPrice, gasLimit, to?, value, data, v, r, s)`, with the chain id folded into `v`
/// per EIP-155 whenever the sender opted into replay protection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: TransactionKind,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl SignedTransaction {
    /// The EIP-155 chain id folded into `v`, if this transaction opted into replay protection.
    /// Pre-EIP-155 transactions use the bare recovery parity (`27`/`28`) and carry no chain id.
    pub fn chain_id(&self) -> Option<u64> {
        if self.v >= 35 {
            Some((self.v - 35) / 2)
        } else {
            None
        }
    }

    fn recovery_id(&self) -> u8 {
        match self.chain_id() {
            Some(chain_id) => ((self.v - 35) - 2 * chain_id) as u8,
            None => (self.v - 27) as u8,
        }
    }

    /// Hash of the fields that were actually signed: for EIP-155 transactions this folds in
    /// `(chain_id, 0, 0)` in place of `(v, r, s)`; pre-EIP-155 transactions sign the bare
    /// 6-tuple.
    fn signing_hash(&self) -> B256 {
        let mut buf = Vec::new();
        let chain_id = self.chain_id();
        let payload_length = self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
            + chain_id.map(|c| c.length() + 1 + 1).unwrap_or(0);
        Header { list: true, payload_length }.encode(&mut buf);
        self.nonce.encode(&mut buf);
        self.gas_price.encode(&mut buf);
        self.gas_limit.encode(&mut buf);
        self.to.encode(&mut buf);
        self.value.encode(&mut buf);
        self.data.encode(&mut buf);
        if let Some(chain_id) = chain_id {
            chain_id.encode(&mut buf);
            0u8.encode(&mut buf);
            0u8.encode(&mut buf);
        }
        keccak256(&buf)
    }

    /// Recovers the sender's address from the ECDSA signature. Fails if `(v, r, s)` does not
    /// recover to a valid public key.
    pub fn recover_signer(&self) -> Result<Address, TransactionError> {
        let recovery_id =
            RecoveryId::from_i32(self.recovery_id() as i32).map_err(|_| TransactionError::InvalidSignature)?;
        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        sig_bytes[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        let signature = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
            .map_err(|_| TransactionError::InvalidSignature)?;
        let message = Message::from_slice(self.signing_hash().as_slice())
            .map_err(|_| TransactionError::InvalidSignature)?;
        let public_key = SECP256K1
            .recover_ecdsa(&message, &signature)
            .map_err(|_| TransactionError::InvalidSignature)?;
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }

    /// keccak256 of the full RLP-encoded, signed transaction — its identity on the wire and in
    /// `tx-to-location`.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        keccak256(&buf)
    }
}

impl Encodable for SignedTransaction {
    fn encode(&self, out: &mut dyn BufMut) {
        let header = Header { list: true, payload_length: self.fields_length() };
        header.encode(out);
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.fields_length();
        payload_length + Header { list: true, payload_length }.length()
    }
}

impl SignedTransaction {
    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
            + self.v.length()
            + self.r.length()
            + self.s.length()
    }
}

impl Decodable for SignedTransaction {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let started_len = buf.len();
        let tx = Self {
            nonce: u64::decode(buf)?,
            gas_price: U256::decode(buf)?,
            gas_limit: u64::decode(buf)?,
            to: TransactionKind::decode(buf)?,
            value: U256::decode(buf)?,
            data: Bytes::decode(buf)?,
            v: u64::decode(buf)?,
            r: U256::decode(buf)?,
            s: U256::decode(buf)?,
        };
        let consumed = started_len - buf.len();
        if consumed != header.payload_length {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: consumed,
            });
        }
        Ok(tx)
    }
}

/// Errors recovering a transaction's sender or otherwise validating its signature shape.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction signature does not recover to a valid public key")]
    InvalidSignature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    fn sign(nonce: u64, chain_id: Option<u64>, key: &SecretKey) -> SignedTransaction {
        let mut tx = SignedTransaction {
            nonce,
            gas_price: U256::from(1_000_000_000u64),
            gas_limit: 21_000,
            to: TransactionKind::Call(Address::with_last_byte(0xaa)),
            value: U256::from(1u64),
            data: Bytes::new(),
            v: 0,
            r: U256::ZERO,
            s: U256::ZERO,
        };
        let digest = tx.signing_hash();
        let message = Message::from_slice(digest.as_slice()).unwrap();
        let (recovery_id, sig) =
            SECP256K1.sign_ecdsa_recoverable(&message, key).serialize_compact();
        tx.r = U256::from_be_slice(&sig[..32]);
        tx.s = U256::from_be_slice(&sig[32..]);
        let recovery = recovery_id.to_i32() as u64;
        tx.v = match chain_id {
            Some(id) => 35 + 2 * id + recovery,
            None => 27 + recovery,
        };
        tx
    }

    #[test]
    fn recovers_known_signer_eip155() {
        let key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let public = secp256k1::PublicKey::from_secret_key(SECP256K1, &key);
        let expected = Address::from_slice(
            &keccak256(&public.serialize_uncompressed()[1..])[12..],
        );
        let tx = sign(0, Some(61), &key);
        assert_eq!(tx.chain_id(), Some(61));
        assert_eq!(tx.recover_signer().unwrap(), expected);
    }

    #[test]
    fn recovers_known_signer_pre_eip155() {
        let key = SecretKey::from_slice(&[0x22; 32]).unwrap();
        let public = secp256k1::PublicKey::from_secret_key(SECP256K1, &key);
        let expected = Address::from_slice(
            &keccak256(&public.serialize_uncompressed()[1..])[12..],
        );
        let tx = sign(0, None, &key);
        assert_eq!(tx.chain_id(), None);
        assert_eq!(tx.recover_signer().unwrap(), expected);
    }

    #[test]
    fn rlp_round_trips() {
        let key = SecretKey::from_slice(&[0x33; 32]).unwrap();
        let tx = sign(7, Some(61), &key);
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        let decoded = SignedTransaction::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(tx, decoded);
    }

    #[test]
    fn create_kind_round_trips() {
        let mut buf = Vec::new();
        TransactionKind::Create.encode(&mut buf);
        let decoded = TransactionKind::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, TransactionKind::Create);
    }
}
