//! Composed end-to-end scenarios from the component spec's seed-test list, exercised against
//! the real `BlockImporter`/`BranchResolver` pair rather than a single component in isolation.
//! Peer-network scenarios (clean two-peer fast sync, re-pivot, partial-response tolerance) are
//! exercised at the scheduler/selector unit level in their own modules, since simulating an
//! actual peer wire round-trip is outside this crate's concern.

use alloy_primitives::{B256, U256};
use etc_db::mem::MemoryDatabase;
use etc_interfaces::{
    Blockchain, BlockchainReader, ExecError, ExecutionOutput, Executor, OmmersPool, ParentWorld,
    TransactionPool,
};
use etc_primitives::{Block, BlockBody, BlockHeader, SignedTransaction, TransactionKind};
use etc_sync::{BlockImporter, ImportOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct RecordingPool {
    removed: Mutex<Vec<B256>>,
    readded: Mutex<Vec<SignedTransaction>>,
}

impl TransactionPool for RecordingPool {
    fn remove(&self, tx_hashes: &[B256]) {
        self.removed.lock().unwrap().extend_from_slice(tx_hashes);
    }

    fn readd(&self, txs: Vec<SignedTransaction>) {
        self.readded.lock().unwrap().extend(txs);
    }
}

#[derive(Debug, Default)]
struct RecordingOmmersPool {
    added: Mutex<Vec<BlockHeader>>,
}

impl OmmersPool for RecordingOmmersPool {
    fn add(&self, header: BlockHeader) {
        self.added.lock().unwrap().push(header);
    }

    fn remove(&self, _headers: &[BlockHeader]) {}
}

#[derive(Debug, Default)]
struct AlwaysSucceedsExecutor;

#[async_trait::async_trait]
impl Executor for AlwaysSucceedsExecutor {
    async fn execute(&self, _block: &Block, _parent_world: ParentWorld) -> Result<ExecutionOutput, ExecError> {
        Ok(ExecutionOutput { receipts: vec![], post_state_root: B256::ZERO, gas_used: 0 })
    }
}

/// Fails with `MissingNode` on its first call for a given block, succeeds from then on —
/// models the importer's missing-state recovery loop (§4.6, seed scenario 6).
#[derive(Debug, Default)]
struct FlakyOnceExecutor {
    calls: AtomicUsize,
    missing_hash: B256,
}

#[async_trait::async_trait]
impl Executor for FlakyOnceExecutor {
    async fn execute(&self, _block: &Block, _parent_world: ParentWorld) -> Result<ExecutionOutput, ExecError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ExecError::MissingNode(self.missing_hash))
        } else {
            Ok(ExecutionOutput { receipts: vec![], post_state_root: B256::ZERO, gas_used: 0 })
        }
    }
}

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

fn header(number: u64, parent_hash: B256, difficulty: u64) -> BlockHeader {
    BlockHeader { number, parent_hash, difficulty: U256::from(difficulty), ..Default::default() }
}

/// Seed scenario 5: a heavier competing branch forked a few blocks back must displace the
/// canonical suffix atomically and return its transactions to the pool.
#[tokio::test]
async fn reorg_during_regular_sync() {
    let chain = Blockchain::new(MemoryDatabase::new()).unwrap();
    let tx_pool = RecordingPool::default();
    let ommers_pool = RecordingOmmersPool::default();
    let mut importer =
        BlockImporter::new(chain.clone(), AlwaysSucceedsExecutor, &tx_pool, &ommers_pool, 100);

    let block1 = Block::new(header(1, B256::ZERO, 100), BlockBody { transactions: vec![tx(0)], ommers: vec![] });
    let block1_hash = block1.header.hash();
    assert!(matches!(importer.import(block1).await.unwrap(), ImportOutcome::ImportedToTop));

    let displaced_tx = tx(1);
    let block2 = Block::new(
        header(2, block1_hash, 100),
        BlockBody { transactions: vec![displaced_tx.clone()], ommers: vec![] },
    );
    let block2_hash = block2.header.hash();
    assert!(matches!(importer.import(block2).await.unwrap(), ImportOutcome::ImportedToTop));
    assert_eq!(chain.best_block_number(), 2);

    // A heavier sibling of block2, forked at block1, with enough difficulty to outweigh it.
    let fork = Block::new(header(2, block1_hash, 150), BlockBody::default());
    let outcome = importer.import(fork.clone()).await.unwrap();
    match outcome {
        ImportOutcome::ChainReorganised { old_branch, .. } => assert_eq!(old_branch, vec![block2_hash]),
        other => panic!("expected ChainReorganised, got {other:?}"),
    }

    assert_eq!(chain.best_block_number(), 2);
    assert_eq!(chain.block_hash(2).unwrap(), Some(fork.header.hash()));
    assert_eq!(tx_pool.readded.lock().unwrap().as_slice(), &[displaced_tx]);
}

/// Seed scenario 6: a `MissingNode` execution failure surfaces as an error the caller can
/// retry; retrying the same block commits exactly once.
#[tokio::test]
async fn missing_node_recovery_retries_without_duplicate_commit() {
    let chain = Blockchain::new(MemoryDatabase::new()).unwrap();
    let tx_pool = RecordingPool::default();
    let ommers_pool = RecordingOmmersPool::default();
    let missing_hash = B256::repeat_byte(0x42);
    let executor = FlakyOnceExecutor { calls: AtomicUsize::new(0), missing_hash };
    let mut importer = BlockImporter::new(chain.clone(), executor, &tx_pool, &ommers_pool, 100);

    let block = Block::new(header(1, B256::ZERO, 100), BlockBody::default());

    let first = importer.import(block.clone()).await;
    assert!(matches!(first, Err(etc_sync::SyncError::MissingStateNode(h)) if h == missing_hash));
    assert_eq!(chain.best_block_number(), 0, "failed execution must not commit");

    let second = importer.import(block).await.unwrap();
    assert!(matches!(second, ImportOutcome::ImportedToTop));
    assert_eq!(chain.best_block_number(), 1);
}

/// Seed scenario 4 (the importer-facing half): a block that fails terminally (not a missing
/// node) is reported as `Failed` and never reaches canonical, leaving the chain exactly where
/// it was.
#[tokio::test]
async fn terminal_execution_failure_does_not_advance_the_chain() {
    #[derive(Debug, Default)]
    struct AlwaysFailsExecutor;

    #[async_trait::async_trait]
    impl Executor for AlwaysFailsExecutor {
        async fn execute(&self, _block: &Block, _parent_world: ParentWorld) -> Result<ExecutionOutput, ExecError> {
            Err(ExecError::Other("bad proof of work".into()))
        }
    }

    let chain = Blockchain::new(MemoryDatabase::new()).unwrap();
    let tx_pool = RecordingPool::default();
    let ommers_pool = RecordingOmmersPool::default();
    let mut importer =
        BlockImporter::new(chain.clone(), AlwaysFailsExecutor, &tx_pool, &ommers_pool, 100);

    let block = Block::new(header(1, B256::ZERO, 100), BlockBody::default());
    let outcome = importer.import(block).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::Failed(_)));
    assert_eq!(chain.best_block_number(), 0);
}
