use std::time::Duration;

/// Every tunable named across §4 of the component spec, collected into one struct so the binary
/// can merge CLI flags over these defaults (`clap` derive + `Default` merge, the same layering
/// the teacher's binary crate uses for its own config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// How far behind the sampled peers' agreed tip the fast-sync pivot is chosen (§4.2).
    pub pivot_block_offset: u64,
    /// Minimum peers sampled before a pivot can be selected (§4.2).
    pub min_peers_for_pivot_selection: usize,
    /// Percentage of sampled peers that must agree on a candidate pivot header (§4.2).
    pub peers_to_choose_pivot_block_from_percentage: u8,
    /// `K`: every Kth header downloaded in fast sync is fully validated (§4.3).
    pub fast_sync_block_validation_k: u64,
    /// `X`: safety overshoot added to the pivot number for the download target (§4.3).
    pub fast_sync_block_validation_x: u64,
    /// How far the current peer tip may outrun the pivot before a re-pivot is triggered (§4.3).
    pub max_target_difference: u64,
    /// How many consecutive pivot-update failures before fast sync aborts (§4.3).
    pub maximum_target_update_failures: u32,
    /// Upper bound on simultaneous in-flight body/receipt/state requests (§4.3, §4.4).
    pub max_concurrent_requests: usize,
    /// Minimum spacing between requests to the same peer during fast sync (§4.3).
    pub fast_sync_throttle: Duration,
    /// How often the `SyncState` snapshot is persisted during normal progress (§4.3).
    pub persist_state_snapshot_interval: Duration,
    /// Upper bound on simultaneous in-flight state-node requests (§4.4).
    pub max_inflight_state_requests: usize,
    /// Number of validated-but-unpersisted state nodes that triggers a `memBatch` flush (§4.4).
    pub mem_batch_threshold: usize,
    /// Cap on the block fetcher's ready+waiting window (§4.5).
    pub max_fetcher_queue_size: usize,
    /// Bodies requested per `GetBlockBodies` batch (§4.5).
    pub block_bodies_per_request: usize,
    /// Headers requested when probing backward for an unknown branch's ancestor (§4.6).
    pub branch_resolution_request_size: u64,
    /// Per-request timeout before a peer is considered unresponsive (§5).
    pub peer_response_timeout: Duration,
    /// Idle retry cadence when there is nothing to fetch (§5).
    pub sync_retry_interval: Duration,
    /// Whether the importer proactively re-fetches a state node pruned earlier when execution
    /// raises `MissingNode` (§4.6).
    pub redownload_missing_state_nodes: bool,
}

impl Default for SyncConfig {
    /// Defaults chosen to mirror the upstream Ethereum-family client's own fast-sync tuning:
    /// conservative enough to tolerate a lossy peer set without needlessly blacklisting.
    fn default() -> Self {
        Self {
            pivot_block_offset: 64,
            min_peers_for_pivot_selection: 3,
            peers_to_choose_pivot_block_from_percentage: 60,
            fast_sync_block_validation_k: 100,
            fast_sync_block_validation_x: 64,
            max_target_difference: 256,
            maximum_target_update_failures: 5,
            max_concurrent_requests: 16,
            fast_sync_throttle: Duration::from_millis(50),
            persist_state_snapshot_interval: Duration::from_secs(10),
            max_inflight_state_requests: 128,
            mem_batch_threshold: 1_000,
            max_fetcher_queue_size: 512,
            block_bodies_per_request: 128,
            branch_resolution_request_size: 64,
            peer_response_timeout: Duration::from_secs(15),
            sync_retry_interval: Duration::from_secs(1),
            redownload_missing_state_nodes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let config = SyncConfig::default();
        assert!(config.fast_sync_block_validation_x < config.pivot_block_offset * 8);
        assert!(config.max_inflight_state_requests >= config.max_concurrent_requests);
        assert!(config.peers_to_choose_pivot_block_from_percentage <= 100);
    }
}
