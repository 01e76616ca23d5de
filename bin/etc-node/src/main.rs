//! Wires the chain-sync core together: a peer pool, the fast-sync driver (resumed from any
//! persisted snapshot), the coalescing snapshot writer, and a block importer, then idles until
//! interrupted. Real peer discovery/transport and a real `Executor`/embedded database are
//! external collaborators (see `etc-network`'s and `etc-interfaces`' own scope notes) — this
//! binary wires the core with the in-memory test double and null executor/pools standing in for
//! them, the same way the pieces would be swapped for production implementations without
//! touching any sync-core crate.

mod cli;

use clap::Parser;
use cli::Cli;
use etc_interfaces::{Blockchain, BlockchainReader, NullPool};
use etc_network::PeerPool;
use etc_sync::{BlockImporter, FastSync, NullExecutor, SnapshotPersister, StatusHandle};
use etc_tasks::{TaskSpawner, TokioTaskSpawner};
use std::time::Instant;

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let _guard =
        etc_tracing::LayerInfo::new(etc_tracing::Verbosity::from_count(cli.verbose)).init();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let config = cli.sync_config();
    tracing::info!(data_dir = %cli.data_dir.display(), "starting etc-node");

    let db = etc_db::mem::MemoryDatabase::new();
    let chain = Blockchain::new(db.clone())?;
    let peer_pool = PeerPool::new(cli.max_inbound_peers, cli.max_outbound_peers);

    let resumed = SnapshotPersister::load(&db)?;
    if resumed.is_some() {
        tracing::info!("resuming fast sync from a persisted snapshot");
    }
    let fast_sync = FastSync::new(config.clone(), resumed);

    let (snapshot_writer, persister) =
        SnapshotPersister::new(db.clone(), config.persist_state_snapshot_interval);
    let spawner = TokioTaskSpawner::current();
    spawner.spawn(Box::pin(persister.run()));

    let importer = BlockImporter::new(
        chain.clone(),
        NullExecutor,
        NullPool,
        NullPool,
        config.max_fetcher_queue_size as u64,
    );

    let status = StatusHandle::new();

    tracing::info!(
        best_block = chain.best_block_number(),
        phase = ?fast_sync.phase(),
        peers = peer_pool.handshaked_peers(Instant::now()).len(),
        "node wired; awaiting peer connections"
    );

    // These are fully wired and ready to drive once a transport and a real executor are plugged
    // in; keeping them alive here is what keeps the snapshot-writer task (holding `db`) and the
    // importer/status handle from being dropped before shutdown.
    let _ = (&importer, &status, &snapshot_writer);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
