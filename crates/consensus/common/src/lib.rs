//! Header validation: the checks FastSync's "every Kth header fully validated" policy (§4.3)
//! runs, and every header in regular sync runs unconditionally.
//!
//! Full ethash verification requires materializing the DAG, which belongs to the mining/
//! consensus block-generator this workspace treats as an external collaborator (§1). What lives
//! here is a magnitude check against the difficulty-derived target — sufficient to catch a peer
//! serving headers with no real proof-of-work behind them, without embedding a DAG generator.

use alloy_primitives::U256;
use etc_primitives::BlockHeader;

/// Bound on `extraData`, per consensus rules shared across Ethereum-family chains.
pub const MAX_EXTRA_DATA_LEN: usize = 32;

/// Why a header failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderValidationError {
    /// `extraData` exceeds [`MAX_EXTRA_DATA_LEN`].
    #[error("extraData exceeds {MAX_EXTRA_DATA_LEN} bytes")]
    ExtraDataTooLong,
    /// `difficulty` is zero; no chain accepts a zero-difficulty header past genesis.
    #[error("difficulty must be nonzero")]
    ZeroDifficulty,
    /// `number != parent.number + 1`.
    #[error("block number {got} is not parent number {parent} + 1")]
    InvalidBlockNumber { parent: u64, got: u64 },
    /// `timestamp < parent.timestamp`.
    #[error("timestamp {got} is not after parent timestamp {parent}")]
    TimestampNotAfterParent { parent: u64, got: u64 },
    /// `gasUsed > gasLimit`.
    #[error("gasUsed {used} exceeds gasLimit {limit}")]
    GasUsedExceedsLimit { limit: u64, used: u64 },
    /// The header's hash does not meet the target implied by its declared difficulty.
    #[error("header hash does not meet the declared difficulty target")]
    InsufficientProofOfWork,
}

/// Checks that depend only on the header itself, not on its parent — cheap enough to run on
/// every header regardless of the stochastic full-validation schedule.
pub fn validate_header_standalone(header: &BlockHeader) -> Result<(), HeaderValidationError> {
    if header.extra_data.len() > MAX_EXTRA_DATA_LEN {
        return Err(HeaderValidationError::ExtraDataTooLong);
    }
    if header.number > 0 && header.difficulty.is_zero() {
        return Err(HeaderValidationError::ZeroDifficulty);
    }
    if header.gas_used > header.gas_limit {
        return Err(HeaderValidationError::GasUsedExceedsLimit {
            limit: header.gas_limit,
            used: header.gas_used,
        });
    }
    Ok(())
}

/// Checks that require the parent header: block number continuity and monotonic timestamps, per
/// the universal invariant in the component spec's data model section.
pub fn validate_against_parent(
    header: &BlockHeader,
    parent: &BlockHeader,
) -> Result<(), HeaderValidationError> {
    if header.number != parent.number + 1 {
        return Err(HeaderValidationError::InvalidBlockNumber {
            parent: parent.number,
            got: header.number,
        });
    }
    if header.timestamp < parent.timestamp {
        return Err(HeaderValidationError::TimestampNotAfterParent {
            parent: parent.timestamp,
            got: header.timestamp,
        });
    }
    Ok(())
}

/// Magnitude check standing in for full ethash verification: a header's hash, read as a
/// big-endian integer, must not exceed `U256::MAX / difficulty`.
pub fn validate_proof_of_work(header: &BlockHeader) -> Result<(), HeaderValidationError> {
    if header.difficulty.is_zero() {
        return Err(HeaderValidationError::ZeroDifficulty);
    }
    let target = U256::MAX / header.difficulty;
    let hash = U256::from_be_bytes(header.hash_slow().0);
    if hash > target {
        return Err(HeaderValidationError::InsufficientProofOfWork);
    }
    Ok(())
}

/// Runs every check: standalone shape, parent linkage, and proof-of-work magnitude. This is what
/// a "fully validated" header (as opposed to a chain-linked-only header) goes through in
/// FastSync's §4.3 policy.
pub fn validate_header_full(
    header: &BlockHeader,
    parent: &BlockHeader,
) -> Result<(), HeaderValidationError> {
    validate_header_standalone(header)?;
    validate_against_parent(header, parent)?;
    validate_proof_of_work(header)
}
