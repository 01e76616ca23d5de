//! The keyed namespaces of the persisted state layout (component spec §6): one marker type per
//! table, each pairing a key and value type the way `reth-db`'s `Table` trait does, so callers
//! get compile-time checked access instead of stringly-typed column families.

use etc_primitives::{BlockHeader, BlockNumber, ChainWeight, ReceiptWithBloom, B256};

/// A keyed namespace inside the persisted store. Implementors are zero-sized marker types;
/// the table's actual name is what a real embedded engine would use as its column family /
/// sub-database identifier.
pub trait Table: Send + Sync + 'static {
    /// Table name, used as the in-memory engine's partition key and as the name a real
    /// embedded store would expose the column family under.
    const NAME: &'static str;
    /// The table's key type.
    type Key: Clone + Eq + std::hash::Hash + Send + Sync + 'static;
    /// The table's value type.
    type Value: Clone + Send + Sync + 'static;
}

macro_rules! table {
    ($name:ident, $key:ty => $value:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug)]
        pub struct $name;

        impl Table for $name {
            const NAME: &'static str = stringify!($name);
            type Key = $key;
            type Value = $value;
        }
    };
}

table!(Headers, B256 => BlockHeader, "`header-by-hash`: block hash to header.");
table!(Bodies, B256 => etc_primitives::BlockBody, "`body-by-hash`: block hash to body.");
table!(Receipts, B256 => Vec<ReceiptWithBloom>, "`receipts-by-hash`: block hash to receipt list.");
table!(TotalDifficulty, B256 => ChainWeight, "`td-by-hash`: block hash to accumulated chain weight.");
table!(NumberToHash, BlockNumber => B256, "`number-to-hash`: canonical height to block hash.");
table!(HashToNumber, B256 => BlockNumber, "Reverse index of `NumberToHash`, for O(1) height lookups by hash.");
table!(TxToLocation, B256 => (B256, u64), "`tx-to-location`: transaction hash to (block hash, index within block).");
table!(StateNodes, B256 => Vec<u8>, "`state-node`: keccak of an RLP-encoded MPT node to its bytes.");
table!(Code, B256 => Vec<u8>, "`code`: keccak of a contract's bytecode to the bytecode itself.");
table!(AppState, AppStateKey => Vec<u8>, "`app-state`: small singleton values (best block number, fast-sync-done flag).");
table!(FastSyncState, () => Vec<u8>, "`fast-sync-state`: the single serialized `SyncState` snapshot.");

/// Keys stored in the [`AppState`] singleton table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppStateKey {
    /// Height of the current canonical tip.
    BestBlockNumber,
    /// Whether fast sync has completed and regular sync has taken over.
    FastSyncDone,
}
