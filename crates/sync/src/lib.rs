//! The chain-synchronization core: pivot selection, fast sync, the state-trie scheduler, the
//! block fetch/import pipeline, and branch resolution.

pub mod block_fetcher;
pub mod block_importer;
pub mod branch_resolver;
pub mod config;
pub mod error;
pub mod fast_sync;
pub mod persistence;
pub mod pivot;
pub mod state_scheduler;
pub mod status;

pub use block_fetcher::{BlockFetcher, InvalidateReason, NewBlockAction, StateNodeFetch};
pub use block_importer::{BlockImporter, ImportOutcome, NullExecutor};
pub use branch_resolver::{BranchOutcome, BranchResolver};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use fast_sync::{FastSync, FastSyncPhase, PivotUpdateOutcome, SyncState};
pub use persistence::{SnapshotPersister, SnapshotWriter};
pub use pivot::{PivotOutcome, PivotSelector};
pub use state_scheduler::{NodeChildren, NodeKind, StateScheduler};
pub use status::{StatusHandle, SyncStatus};
