use crate::config::SyncConfig;
use alloy_primitives::B256;
use etc_network::PeerId;
use etc_primitives::{BlockBody, BlockHeader, BlockNumber, ReceiptWithBloom};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// The sole durable record of fast-sync progress (§3). Replaying the on-disk block store plus
/// this snapshot after a crash must yield a resumable position; the queues are a superset of
/// what still needs downloading.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SyncState {
    pub pivot: BlockHeader,
    pub safe_download_target: BlockNumber,
    pub block_bodies_queue: VecDeque<B256>,
    pub receipts_queue: VecDeque<B256>,
    pub best_block_header_number: BlockNumber,
    pub next_block_to_fully_validate: BlockNumber,
    pub downloaded_nodes_count: u64,
    pub total_nodes_count: u64,
    pub pivot_block_update_failures: u32,
    pub updating_pivot_block: bool,
    pub state_sync_finished: bool,
}

impl SyncState {
    /// Starts fresh from a newly selected `pivot`, per §4.3's `safeDownloadTarget = pivot.number
    /// + X`.
    pub fn new(pivot: BlockHeader, fast_sync_block_validation_x: u64) -> Self {
        let safe_download_target = pivot.number + fast_sync_block_validation_x;
        Self {
            pivot,
            safe_download_target,
            block_bodies_queue: VecDeque::new(),
            receipts_queue: VecDeque::new(),
            best_block_header_number: 0,
            next_block_to_fully_validate: 1,
            downloaded_nodes_count: 0,
            total_nodes_count: 0,
            pivot_block_update_failures: 0,
            updating_pivot_block: false,
            state_sync_finished: false,
        }
    }
}

/// The phase FastSync is currently in, mirroring the state machine in §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastSyncPhase {
    Idle,
    SelectingPivot,
    Running,
    UpdatingPivot,
    Finished,
}

/// Drives headers/bodies/receipts download from genesis to `safeDownloadTarget`, then hands off
/// to the state scheduler. Owns [`SyncState`] exclusively, per the data model's ownership rule.
#[derive(Debug)]
pub struct FastSync {
    config: SyncConfig,
    phase: FastSyncPhase,
    state: Option<SyncState>,
    /// Body downloads currently assigned to a peer, keyed by block hash. Ephemeral: not part of
    /// [`SyncState`], since a crash just means these hashes get re-popped off
    /// `block_bodies_queue` on restart.
    in_flight_bodies: HashMap<B256, PeerId>,
    /// Receipt downloads currently assigned to a peer, keyed by block hash.
    in_flight_receipts: HashMap<B256, PeerId>,
    /// Last time each peer was sent a body/receipt request, for `fast_sync_throttle` spacing.
    peer_last_request: HashMap<PeerId, Instant>,
}

impl FastSync {
    /// Builds a fresh driver, or one resumed from a crash-recovered `state`.
    pub fn new(config: SyncConfig, resumed: Option<SyncState>) -> Self {
        let phase = if resumed.is_some() { FastSyncPhase::Running } else { FastSyncPhase::Idle };
        Self {
            config,
            phase,
            state: resumed,
            in_flight_bodies: HashMap::new(),
            in_flight_receipts: HashMap::new(),
            peer_last_request: HashMap::new(),
        }
    }

    pub fn phase(&self) -> FastSyncPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&SyncState> {
        self.state.as_ref()
    }

    /// Mutable access to the in-progress snapshot, for drivers that need to fold in progress
    /// (e.g. [`Self::advance_fully_validated`]) outside the methods already exposed here.
    pub fn state_mut(&mut self) -> Option<&mut SyncState> {
        self.state.as_mut()
    }

    /// Enqueues `hash` to await a body download once its header is chain-linked, per §4.3.
    pub fn queue_body_download(&mut self, hash: B256) {
        if let Some(state) = &mut self.state {
            state.block_bodies_queue.push_back(hash);
        }
    }

    /// Enqueues `hash` to await a receipts download.
    pub fn queue_receipts_download(&mut self, hash: B256) {
        if let Some(state) = &mut self.state {
            state.receipts_queue.push_back(hash);
        }
    }

    fn is_peer_throttled(&self, peer: PeerId, now: Instant) -> bool {
        self.peer_last_request
            .get(&peer)
            .map(|&last| now.checked_duration_since(last).unwrap_or(Duration::ZERO) < self.config.fast_sync_throttle)
            .unwrap_or(false)
    }

    /// Assigns queued body hashes to `available_peers`, bounded by `max_concurrent_requests`
    /// bodies in flight at once and `fast_sync_throttle` spacing per peer (§4.3). Assigned
    /// hashes move out of `block_bodies_queue` into the in-flight set until
    /// [`Self::on_body_downloaded`] resolves them.
    pub fn assign_body_downloads(&mut self, available_peers: &[PeerId], now: Instant) -> Vec<(B256, PeerId)> {
        let mut assigned = Vec::new();
        for &peer in available_peers {
            if self.in_flight_bodies.len() >= self.config.max_concurrent_requests {
                break;
            }
            if self.is_peer_throttled(peer, now) {
                continue;
            }
            let Some(state) = &mut self.state else { break };
            let Some(hash) = state.block_bodies_queue.pop_front() else { break };
            self.in_flight_bodies.insert(hash, peer);
            self.peer_last_request.insert(peer, now);
            assigned.push((hash, peer));
        }
        assigned
    }

    /// Assigns queued receipt hashes to `available_peers`, under the same concurrency cap and
    /// per-peer throttle as [`Self::assign_body_downloads`].
    pub fn assign_receipt_downloads(&mut self, available_peers: &[PeerId], now: Instant) -> Vec<(B256, PeerId)> {
        let mut assigned = Vec::new();
        for &peer in available_peers {
            if self.in_flight_receipts.len() >= self.config.max_concurrent_requests {
                break;
            }
            if self.is_peer_throttled(peer, now) {
                continue;
            }
            let Some(state) = &mut self.state else { break };
            let Some(hash) = state.receipts_queue.pop_front() else { break };
            self.in_flight_receipts.insert(hash, peer);
            self.peer_last_request.insert(peer, now);
            assigned.push((hash, peer));
        }
        assigned
    }

    /// Validates a downloaded body against its header's `transactionsRoot`/`ommersHash` (§4.3).
    /// On mismatch, `hash` is pushed back onto `block_bodies_queue` and the peer that served it
    /// is named so the caller can blacklist it.
    pub fn on_body_downloaded(&mut self, hash: B256, body: &BlockBody, header: &BlockHeader) -> DownloadOutcome {
        let peer = self.in_flight_bodies.remove(&hash);
        if header.transactions_root == body.transactions_root() && header.ommers_hash == body.ommers_hash() {
            DownloadOutcome::Accepted
        } else {
            if let Some(state) = &mut self.state {
                state.block_bodies_queue.push_back(hash);
            }
            DownloadOutcome::Mismatch { peer }
        }
    }

    /// Validates downloaded receipts against their header's `receiptsRoot` (§4.3). On mismatch,
    /// `hash` is pushed back onto `receipts_queue` and the serving peer is named.
    pub fn on_receipts_downloaded(
        &mut self,
        hash: B256,
        receipts: &[ReceiptWithBloom],
        header: &BlockHeader,
    ) -> DownloadOutcome {
        let peer = self.in_flight_receipts.remove(&hash);
        if header.receipts_root == etc_primitives::receipts_root(receipts) {
            DownloadOutcome::Accepted
        } else {
            if let Some(state) = &mut self.state {
                state.receipts_queue.push_back(hash);
            }
            DownloadOutcome::Mismatch { peer }
        }
    }

    /// Advances `next_block_to_fully_validate` past a header at `validated_height` that just
    /// passed full validation — the success-path counterpart to
    /// [`Self::on_validation_failure`]'s rewind. `max` guards against an out-of-order caller
    /// regressing the counter.
    pub fn advance_fully_validated(&mut self, validated_height: BlockNumber) {
        if let Some(state) = &mut self.state {
            state.next_block_to_fully_validate = state.next_block_to_fully_validate.max(validated_height + 1);
        }
    }

    /// Transitions `Idle`/`SelectingPivot` into `Running` once a pivot is chosen.
    pub fn on_pivot_selected(&mut self, pivot: BlockHeader) {
        self.state = Some(SyncState::new(pivot, self.config.fast_sync_block_validation_x));
        self.phase = FastSyncPhase::Running;
    }

    /// Chooses the next height that must be *fully* validated (PoW, difficulty, timestamp),
    /// rather than merely chain-linked, per §4.3's "educative core" stochastic schedule:
    /// `lastFullyValidated + K/2 + rand(0..K)`, clamped so every header within `X` of the pivot
    /// is always fully validated (no stochastic skipping near the safety boundary).
    pub fn next_fully_validated_height(&self, rng: &mut impl Rng) -> BlockNumber {
        let Some(state) = &self.state else { return 1 };
        let k = self.config.fast_sync_block_validation_k;
        let near_pivot_boundary = state.pivot.number.saturating_sub(self.config.fast_sync_block_validation_x);
        let candidate =
            state.next_block_to_fully_validate + k / 2 + rng.gen_range(0..k.max(1));
        candidate.min(near_pivot_boundary.max(state.next_block_to_fully_validate))
    }

    /// Handles a fully-validated header that failed validation at height `failed_height`:
    /// rewinds `best_block_header_number`/`next_block_to_fully_validate`, and reports whether
    /// the failure is at or beyond the pivot (the caller must then trigger `UpdatePivot`).
    pub fn on_validation_failure(&mut self, failed_height: BlockNumber, rewind_n: u64) -> bool {
        let Some(state) = &mut self.state else { return false };
        state.best_block_header_number = failed_height.saturating_sub(rewind_n + 1).max(0);
        state.next_block_to_fully_validate = failed_height.saturating_sub(rewind_n).max(1);
        failed_height >= state.pivot.number
    }

    /// `true` if the current peer tip has outrun the pivot enough to require a re-pivot, per
    /// §4.3's pivot-staleness policy.
    pub fn pivot_is_stale(&self, current_peer_tip: BlockNumber) -> bool {
        let Some(state) = &self.state else { return false };
        current_peer_tip.saturating_sub(state.pivot.number) > self.config.max_target_difference
    }

    /// Begins a pivot update, bumping the failure counter if `new_pivot_number` doesn't advance
    /// on the prior pivot (a regression is treated as a failed attempt, per §4.3).
    pub fn on_pivot_update_attempt(&mut self, new_pivot: Option<BlockHeader>) -> PivotUpdateOutcome {
        let Some(state) = &mut self.state else { return PivotUpdateOutcome::NoStateYet };
        match new_pivot {
            Some(pivot) if pivot.number >= state.pivot.number => {
                let safe_download_target = pivot.number + self.config.fast_sync_block_validation_x;
                state.pivot = pivot;
                state.safe_download_target = safe_download_target;
                state.pivot_block_update_failures = 0;
                state.updating_pivot_block = false;
                self.phase = FastSyncPhase::Running;
                PivotUpdateOutcome::Updated
            }
            _ => {
                state.pivot_block_update_failures += 1;
                state.updating_pivot_block = true;
                if state.pivot_block_update_failures >= self.config.maximum_target_update_failures {
                    PivotUpdateOutcome::Exhausted
                } else {
                    PivotUpdateOutcome::Retrying
                }
            }
        }
    }

    /// Records that the state scheduler finished. `Running` moves to `Finished` once the header
    /// chain has also caught up to `safeDownloadTarget`.
    pub fn on_state_sync_finished(&mut self) {
        if let Some(state) = &mut self.state {
            state.state_sync_finished = true;
        }
        self.maybe_finish();
    }

    /// Call after advancing `best_block_header_number`, to re-check the finish condition.
    pub fn advance_best_header(&mut self, number: BlockNumber) {
        if let Some(state) = &mut self.state {
            state.best_block_header_number = state.best_block_header_number.max(number);
        }
        self.maybe_finish();
    }

    fn maybe_finish(&mut self) {
        if let Some(state) = &self.state {
            if state.state_sync_finished && state.best_block_header_number >= state.safe_download_target {
                self.phase = FastSyncPhase::Finished;
            }
        }
    }
}

/// Outcome of validating a downloaded body/receipt list against its header's commitments
/// (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The downloaded content matched its header commitment.
    Accepted,
    /// It didn't; `peer` names who served it, if known, so the caller can blacklist them.
    Mismatch { peer: Option<PeerId> },
}

/// Result of a pivot-update attempt, per §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotUpdateOutcome {
    /// No `SyncState` exists yet (pivot never selected) — nothing to update.
    NoStateYet,
    /// New pivot accepted.
    Updated,
    /// Attempt failed but the retry budget remains.
    Retrying,
    /// Attempt failed and the retry budget (`maximumTargetUpdateFailures`) is exhausted.
    Exhausted,
}
