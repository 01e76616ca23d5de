use clap::Parser;
use etc_sync::SyncConfig;
use std::path::PathBuf;

/// Command-line surface for `etc-node`. Most flags only override one field of
/// [`SyncConfig`]; anything not exposed here keeps its `Default`.
#[derive(Debug, Parser)]
#[command(name = "etc-node", about = "Ethereum Classic chain-sync node")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory for persisted chain data and logs. The in-process backend this binary wires
    /// up today is in-memory only (see `etc_db::mem::MemoryDatabase`); this flag is accepted
    /// now so swapping in a durable `Database` impl later doesn't change the CLI surface.
    #[arg(long, value_name = "PATH", default_value = "data")]
    pub data_dir: PathBuf,

    /// Minimum peers sampled before a fast-sync pivot can be selected.
    #[arg(long, value_name = "N")]
    pub min_peers_for_pivot: Option<usize>,

    /// How far behind peers' agreed tip the pivot is chosen.
    #[arg(long, value_name = "BLOCKS")]
    pub pivot_block_offset: Option<u64>,

    /// Maximum inbound peer connections.
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub max_inbound_peers: usize,

    /// Maximum outbound peer connections.
    #[arg(long, value_name = "N", default_value_t = 50)]
    pub max_outbound_peers: usize,
}

impl Cli {
    /// Builds a [`SyncConfig`] by layering this invocation's overrides over the defaults.
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::default();
        if let Some(min_peers) = self.min_peers_for_pivot {
            config.min_peers_for_pivot_selection = min_peers;
        }
        if let Some(offset) = self.pivot_block_offset {
            config.pivot_block_offset = offset;
        }
        config
    }
}
