//! Importer-facing pool boundaries: pending transactions and candidate ommers. Both pools are
//! external collaborators (full mempool logic is out of scope); these traits are only the shape
//! the importer calls through.

use alloy_primitives::B256;
use auto_impl::auto_impl;
use etc_primitives::{BlockHeader, SignedTransaction};

/// The pending-transaction pool the importer evicts from on inclusion and re-adds to on
/// reorg-rollback.
#[auto_impl(&, Arc)]
pub trait TransactionPool: Send + Sync {
    /// Removes transactions that were just included in a newly canonical block.
    fn remove(&self, tx_hashes: &[B256]);

    /// Returns previously-included transactions to the pending set after their block was
    /// displaced by a reorg.
    fn readd(&self, txs: Vec<SignedTransaction>);
}

/// The ommers (uncle) candidate pool. Headers from displaced or sibling blocks are added here
/// so a later canonical block may reference them for partial reward.
#[auto_impl(&, Arc)]
pub trait OmmersPool: Send + Sync {
    /// Adds a header as an ommer candidate.
    fn add(&self, header: BlockHeader);

    /// Removes headers that have just been included as ommers in a canonical block.
    fn remove(&self, headers: &[BlockHeader]);
}

/// A no-op pool pair used where importer tests don't care about pool bookkeeping.
#[derive(Debug, Default)]
pub struct NullPool;

impl TransactionPool for NullPool {
    fn remove(&self, _tx_hashes: &[B256]) {}
    fn readd(&self, _txs: Vec<SignedTransaction>) {}
}

impl OmmersPool for NullPool {
    fn add(&self, _header: BlockHeader) {}
    fn remove(&self, _headers: &[BlockHeader]) {}
}
