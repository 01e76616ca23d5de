//! Cross-cutting traits shared by every sync-core crate: the blockchain read/write split, the
//! external executor boundary, pool interfaces, and the umbrella error type. No crate in this
//! workspace should need to know another crate's internals to call through these.

mod blockchain;
mod error;
mod executor;
mod pool;

pub use blockchain::{Blockchain, BlockchainReader, BlockchainWriter, CommitBatch};
pub use error::{CoreError, CoreResult, ExecError};
pub use executor::{ExecutionOutput, Executor, ParentWorld};
pub use pool::{NullPool, OmmersPool, TransactionPool};
