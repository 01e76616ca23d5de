use alloy_primitives::B256;
use etc_network::PeerId;

/// The failure taxonomy from §4.3/§7: which recovery path a caller takes depends on the
/// variant, not on string matching a message.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A block's parent's total difficulty is missing locally — never fatal alone.
    #[error("chain gap: missing total difficulty for parent of {0}")]
    ChainGap(B256),

    /// A peer sent data that failed validation against its own commitment.
    #[error("peer {peer:?} misbehaved: {reason}")]
    PeerMisbehavior { peer: PeerId, reason: String },

    /// A request timed out or the peer disconnected; not itself evidence of misbehavior.
    #[error("peer {0:?} did not respond in time")]
    PeerTransient(PeerId),

    /// The persisted store rejected a read or write.
    #[error(transparent)]
    Storage(#[from] etc_db::DbError),

    /// A `BlockchainReader`/`BlockchainWriter` call failed.
    #[error(transparent)]
    Core(#[from] etc_interfaces::CoreError),

    /// Execution referenced a trie node that is not present locally.
    #[error("missing state node {0}")]
    MissingStateNode(B256),

    /// The current pivot has aged past `max_target_difference` and must be replaced.
    #[error("pivot stale: peer tip has advanced {0} blocks past pivot")]
    PivotStale(u64),

    /// Pivot updates failed `maximum_target_update_failures` times in a row.
    #[error("pivot update exhausted after repeated failures")]
    PivotUpdateExhausted,
}

/// Result alias for this crate's fallible operations.
pub type SyncResult<T> = Result<T, SyncError>;
