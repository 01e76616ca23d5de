//! The importer's boundary with the external block executor (EVM interpreter and gas
//! accounting), explicitly out of scope for this workspace — specified here only at the
//! boundary, per the component spec's scope note.

use crate::ExecError;
use alloy_primitives::B256;
use async_trait::async_trait;
use etc_primitives::{Block, ReceiptWithBloom};

/// Output of successfully executing a block against a parent world state.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Receipts produced, one per transaction, in order.
    pub receipts: Vec<ReceiptWithBloom>,
    /// State root after applying every transaction in the block.
    pub post_state_root: B256,
    /// Total gas used by the block.
    pub gas_used: u64,
}

/// A reference to the state the executor should start from.
#[derive(Debug, Clone, Copy)]
pub struct ParentWorld {
    /// State root of the parent block.
    pub state_root: B256,
}

/// External block executor. Implementations own EVM interpretation and gas accounting; this
/// crate only defines the call shape the importer depends on.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes `block` against `parent_world`, returning receipts, the resulting state root,
    /// and gas used — or an [`ExecError`], which the caller partitions into a recoverable
    /// missing-node fetch versus a terminal block failure.
    async fn execute(
        &self,
        block: &Block,
        parent_world: ParentWorld,
    ) -> Result<ExecutionOutput, ExecError>;
}
