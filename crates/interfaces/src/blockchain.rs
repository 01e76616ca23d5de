//! The blockchain capability split called for in the component spec's design notes: a
//! cheaply-cloned read-only snapshot, a typed atomic-batch writer, and a single-atomic-cell
//! best-block cache — rather than one god-object every module depends on.

use crate::CoreResult;
use alloy_primitives::B256;
use etc_db::tables::{AppStateKey, Bodies, Headers, NumberToHash, Receipts, TotalDifficulty};
use etc_db::{Database, DatabaseReader, DbTxMut};
use etc_primitives::{BlockHeader, BlockNumber, ChainWeight};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only view over persisted chain data. Cheap to clone — every clone shares the same
/// backing [`etc_db::Database`] reader handle.
pub trait BlockchainReader: Clone + Send + Sync {
    /// Looks up a header by its block hash.
    fn header(&self, hash: B256) -> CoreResult<Option<BlockHeader>>;

    /// Looks up a body by its block hash.
    fn body(&self, hash: B256) -> CoreResult<Option<etc_primitives::BlockBody>>;

    /// Looks up the canonical block hash at `number`.
    fn block_hash(&self, number: BlockNumber) -> CoreResult<Option<B256>>;

    /// Looks up the accumulated [`ChainWeight`] at `hash`.
    fn chain_weight(&self, hash: B256) -> CoreResult<Option<ChainWeight>>;

    /// Current best (highest) canonical block number, served from the in-memory cache rather
    /// than a storage read — always `>=` the value last durably committed.
    fn best_block_number(&self) -> BlockNumber;
}

/// Accepts atomic multi-table commits. A reorg and a straight extension are both expressed as
/// one [`CommitBatch`] so readers never observe a partially applied chain update.
pub trait BlockchainWriter: Send + Sync {
    /// Applies `batch` atomically, then advances the best-block cache.
    fn commit(&self, batch: CommitBatch) -> CoreResult<()>;
}

/// One canonical-chain update: blocks to insert plus (on a reorg) canonical mappings to retract.
/// The best-block pointer update is always the batch's last effect, per the concurrency model's
/// ordering guarantee.
#[derive(Debug, Default)]
pub struct CommitBatch {
    /// Headers to persist, keyed by hash.
    pub headers: Vec<(B256, BlockHeader)>,
    /// Bodies to persist, keyed by hash.
    pub bodies: Vec<(B256, etc_primitives::BlockBody)>,
    /// Receipts to persist, keyed by block hash.
    pub receipts: Vec<(B256, Vec<etc_primitives::ReceiptWithBloom>)>,
    /// Accumulated chain weight at each newly canonical hash.
    pub chain_weights: Vec<(B256, ChainWeight)>,
    /// `(number, hash)` canonical pairs to install.
    pub canonical: Vec<(BlockNumber, B256)>,
    /// `(number, hash)` canonical pairs to retract (non-empty only during a reorg).
    pub retract: Vec<(BlockNumber, B256)>,
    /// New best block number, applied last.
    pub new_best: BlockNumber,
}

/// A [`BlockchainReader`]/[`BlockchainWriter`] pair backed by an [`etc_db::Database`], with the
/// best-block cache the design notes call for: a single atomic cell shadowing the persisted
/// pointer so reads don't round-trip through storage.
#[derive(Clone)]
pub struct Blockchain<DB: Database> {
    db: DB,
    best_block_number: Arc<AtomicU64>,
}

impl<DB: Database + std::fmt::Debug> std::fmt::Debug for Blockchain<DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("best_block_number", &self.best_block_number.load(Ordering::Relaxed))
            .finish()
    }
}

impl<DB: Database> Blockchain<DB> {
    /// Builds a handle, seeding the best-block cache from whatever is currently persisted.
    pub fn new(db: DB) -> CoreResult<Self> {
        use etc_db::tables::AppState;
        let reader = db.reader();
        let best = reader
            .get::<AppState>(&AppStateKey::BestBlockNumber)?
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_le_bytes)
            .unwrap_or(0);
        Ok(Self { db, best_block_number: Arc::new(AtomicU64::new(best)) })
    }
}

impl<DB: Database + Clone> BlockchainReader for Blockchain<DB> {
    fn header(&self, hash: B256) -> CoreResult<Option<BlockHeader>> {
        Ok(self.db.reader().get::<Headers>(&hash)?)
    }

    fn block_hash(&self, number: BlockNumber) -> CoreResult<Option<B256>> {
        Ok(self.db.reader().get::<NumberToHash>(&number)?)
    }

    fn body(&self, hash: B256) -> CoreResult<Option<etc_primitives::BlockBody>> {
        Ok(self.db.reader().get::<Bodies>(&hash)?)
    }

    fn chain_weight(&self, hash: B256) -> CoreResult<Option<ChainWeight>> {
        Ok(self.db.reader().get::<TotalDifficulty>(&hash)?)
    }

    fn best_block_number(&self) -> BlockNumber {
        self.best_block_number.load(Ordering::Acquire)
    }
}

impl<DB: Database> BlockchainWriter for Blockchain<DB> {
    fn commit(&self, batch: CommitBatch) -> CoreResult<()> {
        use etc_db::tables::AppState;

        let mut tx = self.db.tx_mut();
        for (key, value) in batch.headers {
            tx.put::<Headers>(key, value);
        }
        for (key, value) in batch.bodies {
            tx.put::<Bodies>(key, value);
        }
        for (key, value) in batch.receipts {
            tx.put::<Receipts>(key, value);
        }
        for (key, value) in batch.chain_weights {
            tx.put::<TotalDifficulty>(key, value);
        }
        for (key, _) in batch.retract {
            tx.delete::<NumberToHash>(key);
        }
        for (key, value) in batch.canonical {
            tx.put::<NumberToHash>(key, value);
        }
        tx.put::<AppState>(AppStateKey::BestBlockNumber, batch.new_best.to_le_bytes().to_vec());
        tx.commit()?;

        self.best_block_number.store(batch.new_best, Ordering::Release);
        Ok(())
    }
}
