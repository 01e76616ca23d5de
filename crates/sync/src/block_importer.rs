use crate::branch_resolver::{BranchOutcome, BranchResolver};
use crate::error::{SyncError, SyncResult};
use alloy_primitives::B256;
use etc_interfaces::{
    Blockchain, BlockchainReader, BlockchainWriter, CommitBatch, ExecError, Executor,
    OmmersPool, ParentWorld, TransactionPool,
};
use etc_primitives::{Block, ChainWeight};
use std::collections::HashMap;

/// Outcome of [`BlockImporter::import`], per §4.6.
#[derive(Debug)]
pub enum ImportOutcome {
    ImportedToTop,
    Enqueued,
    Duplicate,
    ChainReorganised { old_branch: Vec<B256>, new_branch_len: usize },
    UnknownParent,
    Failed(String),
}

/// A block whose parent isn't yet canonical, held until its parent arrives or it ages out, per
/// the `BlockQueue` data model entry.
#[derive(Debug, Clone)]
struct QueuedBlock {
    block: Block,
    parent_hash: B256,
}

/// Drives block execution and canonical-chain maintenance, per §4.6.
pub struct BlockImporter<DB: etc_db::Database, E, P, O> {
    chain: Blockchain<DB>,
    executor: E,
    tx_pool: P,
    ommers_pool: O,
    queue: HashMap<B256, QueuedBlock>,
    queue_window: u64,
    importing: bool,
}

impl<DB, E, P, O> BlockImporter<DB, E, P, O>
where
    DB: etc_db::Database + Clone,
    E: Executor,
    P: TransactionPool,
    O: OmmersPool,
{
    /// Builds an importer over `chain`, executing blocks via `executor` and maintaining `tx_pool`
    /// / `ommers_pool` on inclusion and rollback.
    pub fn new(chain: Blockchain<DB>, executor: E, tx_pool: P, ommers_pool: O, queue_window: u64) -> Self {
        Self { chain, executor, tx_pool, ommers_pool, queue: HashMap::new(), queue_window, importing: false }
    }

    /// Imports `block`, executing it if it extends canonical, queuing it if its parent is merely
    /// plausible-but-unknown, or resolving a branch switch if it's heavier than canonical.
    pub async fn import(&mut self, block: Block) -> SyncResult<ImportOutcome> {
        self.importing = true;
        let hash = block.header.hash();
        let outcome = self.import_inner(block).await;
        if matches!(
            outcome,
            Ok(ImportOutcome::ImportedToTop) | Ok(ImportOutcome::ChainReorganised { .. })
        ) {
            self.promote_ready_descendants(hash).await;
        }
        self.importing = false;
        outcome
    }

    /// Re-runs every queued block whose parent just became canonical through [`Self::import_inner`],
    /// cascading to further descendants whenever a promotion itself reaches the top — an explicit
    /// worklist rather than recursive `async fn` calls, since `import_inner` calling back into this
    /// method would otherwise make the future self-referential.
    async fn promote_ready_descendants(&mut self, root: B256) {
        let mut frontier = vec![root];
        while let Some(parent_hash) = frontier.pop() {
            let ready: Vec<B256> = self
                .queue
                .iter()
                .filter(|(_, q)| q.parent_hash == parent_hash)
                .map(|(hash, _)| *hash)
                .collect();
            for hash in ready {
                let Some(queued) = self.queue.remove(&hash) else { continue };
                if let Ok(ImportOutcome::ImportedToTop) = self.import_inner(queued.block).await {
                    frontier.push(hash);
                }
            }
        }
    }

    async fn import_inner(&mut self, block: Block) -> SyncResult<ImportOutcome> {
        let hash = block.header.hash();
        if self.chain.header(hash)?.is_some() || self.queue.contains_key(&hash) {
            return Ok(ImportOutcome::Duplicate);
        }

        let parent_hash = block.header.parent_hash;
        let best = self.chain.best_block_number();

        if block.header.number == best + 1 {
            if self.chain.block_hash(best)?.map(|h| h == parent_hash).unwrap_or(best == 0) {
                return self.execute_and_commit_to_top(block).await;
            }
        }

        let Some(parent_weight) = self.chain.chain_weight(parent_hash)? else {
            self.queue.insert(hash, QueuedBlock { block: block.clone(), parent_hash });
            self.ommers_pool.add(block.header.unseal());
            return Ok(ImportOutcome::UnknownParent);
        };

        let candidate_weight = parent_weight.extended_by(block.header.difficulty, None);
        let current_weight = self.chain.chain_weight(
            self.chain.block_hash(self.chain.best_block_number())?.unwrap_or(B256::ZERO),
        )?.unwrap_or(ChainWeight::ZERO);

        if candidate_weight > current_weight {
            let resolver = BranchResolver::new(self.chain.clone());
            match resolver.resolve(std::slice::from_ref(block.header.header())) {
                BranchOutcome::NewBetterBranch(old_branch) => {
                    self.reorganise(&old_branch, block).await
                }
                BranchOutcome::UnknownBranch => {
                    self.queue.insert(hash, QueuedBlock { block, parent_hash });
                    Ok(ImportOutcome::UnknownParent)
                }
                BranchOutcome::InvalidBranch => Ok(ImportOutcome::Failed("invalid branch".into())),
                BranchOutcome::NoChainSwitch => {
                    self.queue.insert(hash, QueuedBlock { block: block.clone(), parent_hash });
                    self.ommers_pool.add(block.header.unseal());
                    Ok(ImportOutcome::Enqueued)
                }
            }
        } else {
            self.queue.insert(hash, QueuedBlock { block: block.clone(), parent_hash });
            self.ommers_pool.add(block.header.unseal());
            Ok(ImportOutcome::Enqueued)
        }
    }

    async fn execute_and_commit_to_top(&mut self, block: Block) -> SyncResult<ImportOutcome> {
        let parent_world = ParentWorld { state_root: B256::ZERO };
        match self.executor.execute(&block, parent_world).await {
            Ok(output) => {
                let hash = block.header.hash();
                let parent_weight = self
                    .chain
                    .chain_weight(block.header.parent_hash)?
                    .unwrap_or(ChainWeight::ZERO);
                let weight = parent_weight.extended_by(block.header.difficulty, None);
                let tx_hashes: Vec<B256> = block.body.transactions.iter().map(|t| t.hash()).collect();

                self.chain.commit(CommitBatch {
                    headers: vec![(hash, block.header.header().clone())],
                    bodies: vec![(hash, block.body.clone())],
                    receipts: vec![(hash, output.receipts)],
                    chain_weights: vec![(hash, weight)],
                    canonical: vec![(block.header.number, hash)],
                    new_best: block.header.number,
                    ..Default::default()
                })?;

                self.tx_pool.remove(&tx_hashes);
                for ommer in &block.body.ommers {
                    self.ommers_pool.remove(std::slice::from_ref(ommer));
                }
                // Sibling candidates that lost out to this block at the same height are still
                // valid ommer candidates for a later canonical block, per §4.6.
                for sibling in self.queue.values() {
                    if sibling.parent_hash == block.header.parent_hash {
                        self.ommers_pool.add(sibling.block.header.header().clone());
                    }
                }
                Ok(ImportOutcome::ImportedToTop)
            }
            Err(ExecError::MissingNode(node_hash)) => Err(SyncError::MissingStateNode(node_hash)),
            Err(ExecError::Other(reason)) => Ok(ImportOutcome::Failed(reason)),
        }
    }

    async fn reorganise(&mut self, old_branch: &[B256], new_tip: Block) -> SyncResult<ImportOutcome> {
        let mut readded = Vec::new();
        let mut retract = Vec::new();
        for &hash in old_branch {
            if let Some(header) = self.chain.header(hash)? {
                retract.push((header.number, hash));
            }
        }

        let hash = new_tip.header.hash();
        let parent_world = ParentWorld { state_root: B256::ZERO };
        let output = match self.executor.execute(&new_tip, parent_world).await {
            Ok(output) => output,
            Err(ExecError::MissingNode(node_hash)) => {
                return Err(SyncError::MissingStateNode(node_hash))
            }
            Err(ExecError::Other(reason)) => return Ok(ImportOutcome::Failed(reason)),
        };

        let parent_weight =
            self.chain.chain_weight(new_tip.header.parent_hash)?.unwrap_or(ChainWeight::ZERO);
        let weight = parent_weight.extended_by(new_tip.header.difficulty, None);

        self.chain.commit(CommitBatch {
            headers: vec![(hash, new_tip.header.header().clone())],
            bodies: vec![(hash, new_tip.body.clone())],
            receipts: vec![(hash, output.receipts)],
            chain_weights: vec![(hash, weight)],
            canonical: vec![(new_tip.header.number, hash)],
            retract: retract.clone(),
            new_best: new_tip.header.number,
        })?;

        for &(_, old_hash) in &retract {
            if let Some(body) = self.chain.body(old_hash)? {
                readded.extend(body.transactions);
            }
        }
        self.tx_pool.readd(readded);

        Ok(ImportOutcome::ChainReorganised { old_branch: old_branch.to_vec(), new_branch_len: 1 })
    }

    /// `true` while a call to [`Self::import`] is in flight.
    pub fn is_importing(&self) -> bool {
        self.importing
    }

    /// Number of blocks currently parked awaiting an unknown or non-winning ancestor.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Evicts queued blocks whose height has fallen more than `queue_window` behind the current
    /// best, matching the `BlockQueue` eviction rule in the data model.
    pub fn evict_stale_queue_entries(&mut self) {
        let best = self.chain.best_block_number();
        let window = self.queue_window;
        self.queue.retain(|_, q| best.saturating_sub(q.block.header.number) <= window);
    }
}

/// A no-op executor used by importer tests that don't need real execution.
#[derive(Debug, Default)]
pub struct NullExecutor;

#[async_trait::async_trait]
impl Executor for NullExecutor {
    async fn execute(
        &self,
        _block: &Block,
        _parent_world: ParentWorld,
    ) -> Result<etc_interfaces::ExecutionOutput, ExecError> {
        Ok(etc_interfaces::ExecutionOutput { receipts: vec![], post_state_root: B256::ZERO, gas_used: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etc_db::mem::MemoryDatabase;
    use etc_interfaces::NullPool;
    use etc_primitives::BlockHeader;

    fn header(number: u64, parent_hash: B256) -> BlockHeader {
        BlockHeader {
            number,
            parent_hash,
            difficulty: alloy_primitives::U256::from(10u64),
            ..Default::default()
        }
    }

    fn importer() -> BlockImporter<MemoryDatabase, NullExecutor, NullPool, NullPool> {
        let chain = Blockchain::new(MemoryDatabase::new()).unwrap();
        BlockImporter::new(chain, NullExecutor, NullPool, NullPool, 100)
    }

    #[tokio::test]
    async fn genesis_child_imports_to_top() {
        let mut importer = importer();
        let block = Block::new(header(1, B256::ZERO), etc_primitives::BlockBody::default());
        let outcome = importer.import(block).await.unwrap();
        assert!(matches!(outcome, ImportOutcome::ImportedToTop));
        assert_eq!(importer.chain.best_block_number(), 1);
    }

    #[tokio::test]
    async fn block_with_unknown_parent_is_enqueued() {
        let mut importer = importer();
        let block = Block::new(header(50, B256::repeat_byte(0xaa)), etc_primitives::BlockBody::default());
        let outcome = importer.import(block).await.unwrap();
        assert!(matches!(outcome, ImportOutcome::UnknownParent));
        assert_eq!(importer.queued_len(), 1);
    }

    #[tokio::test]
    async fn duplicate_block_is_reported_as_duplicate() {
        let mut importer = importer();
        let block = Block::new(header(1, B256::ZERO), etc_primitives::BlockBody::default());
        importer.import(block.clone()).await.unwrap();
        let outcome = importer.import(block).await.unwrap();
        assert!(matches!(outcome, ImportOutcome::Duplicate));
    }

    #[tokio::test]
    async fn out_of_order_delivery_cascades_through_the_queue_once_the_parent_lands() {
        let mut importer = importer();
        let block1 = Block::new(header(1, B256::ZERO), etc_primitives::BlockBody::default());
        let block1_hash = block1.header.hash();
        let block2 = Block::new(header(2, block1_hash), etc_primitives::BlockBody::default());
        let block2_hash = block2.header.hash();
        let block3 = Block::new(header(3, block2_hash), etc_primitives::BlockBody::default());

        // block3 then block2 arrive before block1: both park in the queue.
        assert!(matches!(
            importer.import(block3).await.unwrap(),
            ImportOutcome::UnknownParent
        ));
        assert!(matches!(
            importer.import(block2).await.unwrap(),
            ImportOutcome::UnknownParent
        ));
        assert_eq!(importer.queued_len(), 2);

        // block1 lands: both queued descendants must cascade all the way to the top.
        let outcome = importer.import(block1).await.unwrap();
        assert!(matches!(outcome, ImportOutcome::ImportedToTop));
        assert_eq!(importer.chain.best_block_number(), 3);
        assert_eq!(importer.queued_len(), 0);
    }
}
