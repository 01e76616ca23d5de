use alloy_primitives::{keccak256, B256};
use etc_db::tables::{Code, StateNodes};
use etc_db::{Database, DatabaseReader, DatabaseWriter, Write};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Which trie a node belongs to, needed only to decide what its children should be enqueued as
/// (an account leaf's storage root reopens a storage trie; its code hash is not a trie node at
/// all but still fetched through the same node-request pipeline per §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    StateTrie,
    StorageTrie,
    Code,
}

/// A node the scheduler is waiting on, tracked while any of its children are still outstanding.
#[derive(Debug, Clone)]
struct PendingNode {
    parents: Vec<B256>,
    depth: u32,
    kind: NodeKind,
    outstanding_children: usize,
}

/// One entry in the `missing` priority queue: ordered by descending depth so deep nodes are
/// requested first, keeping the working set small (a node's memory is only held while its
/// children are outstanding), per §4.4.
#[derive(Debug, Clone, Eq, PartialEq)]
struct MissingEntry {
    depth: u32,
    hash: B256,
    kind: NodeKind,
}

impl Ord for MissingEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.depth.cmp(&other.depth).then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for MissingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A decoded state-trie node's children, abstracted over the real MPT layout so the scheduler's
/// traversal logic doesn't need to know branch/extension/leaf encoding details. Produced by
/// whatever RLP/MPT decode step sits between the raw bytes and the scheduler (out of scope
/// here; the scheduler only needs the reference list a decode step already computed).
#[derive(Debug, Clone, Default)]
pub struct NodeChildren {
    /// Hashes of child trie nodes in the same trie as the parent.
    pub trie_children: Vec<B256>,
    /// For an account leaf: the account's storage trie root, if non-empty.
    pub storage_root: Option<B256>,
    /// For an account leaf: the account's code hash, if not the empty-code hash.
    pub code_hash: Option<B256>,
}

/// Outcome of [`StateScheduler::on_response`], distinguishing the ways a response can fail so
/// the caller can apply §4.4's differentiated blacklist policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The hash matched and the node (plus any children it implies) was accepted.
    Accepted,
    /// Nothing is outstanding for this hash — never requested, or already resolved.
    Unsolicited,
    /// The bytes' hash didn't match the hash requested.
    HashMismatch,
    /// The response carried no bytes. Requeued unconditionally; `should_blacklist` is set once
    /// this hash has gone empty more than [`StateScheduler::EMPTY_RESPONSE_RETRY_LIMIT`] times
    /// in a row.
    Empty { should_blacklist: bool },
}

/// Materializes the complete state trie rooted at a pivot's `stateRoot`, per §4.4. Progress is
/// monotonic and restart-safe: anything already persisted satisfies its parent's
/// outstanding-child counter without a re-fetch.
#[derive(Debug)]
pub struct StateScheduler<DB> {
    db: DB,
    pending: HashMap<B256, PendingNode>,
    missing: BinaryHeap<MissingEntry>,
    in_flight: HashSet<B256>,
    mem_batch: Vec<(B256, Vec<u8>, NodeKind)>,
    mem_batch_hashes: HashSet<B256>,
    mem_batch_threshold: usize,
    /// Consecutive empty responses seen for a hash still outstanding, per §4.4's "requeue
    /// without blacklisting unless repeated" tolerance.
    empty_response_retries: HashMap<B256, u32>,
    pub downloaded_nodes_count: u64,
    pub total_nodes_count: u64,
}

impl<DB: Database> StateScheduler<DB> {
    /// How many consecutive empty responses for the same hash are tolerated before the sender
    /// is blacklisted, per §4.4.
    const EMPTY_RESPONSE_RETRY_LIMIT: u32 = 3;

    /// Seeds the scheduler with `state_root` at depth 0 — the single entry point into an empty
    /// traversal.
    pub fn new(db: DB, state_root: B256, mem_batch_threshold: usize) -> Self {
        let mut scheduler = Self {
            db,
            pending: HashMap::new(),
            missing: BinaryHeap::new(),
            in_flight: HashSet::new(),
            mem_batch: Vec::new(),
            mem_batch_hashes: HashSet::new(),
            mem_batch_threshold,
            empty_response_retries: HashMap::new(),
            downloaded_nodes_count: 0,
            total_nodes_count: 1,
        };
        scheduler.enqueue(state_root, &[], 0, NodeKind::StateTrie);
        scheduler
    }

    fn enqueue(&mut self, hash: B256, parents: &[B256], depth: u32, kind: NodeKind) {
        if self.in_flight.contains(&hash)
            || self.pending.contains_key(&hash)
            || self.mem_batch_hashes.contains(&hash)
        {
            return;
        }
        if self.is_persisted(hash, kind) {
            return;
        }
        self.pending.insert(
            hash,
            PendingNode { parents: parents.to_vec(), depth, kind, outstanding_children: 0 },
        );
        self.missing.push(MissingEntry { depth, hash, kind });
        self.total_nodes_count += 1;
    }

    fn is_persisted(&self, hash: B256, kind: NodeKind) -> bool {
        match kind {
            NodeKind::StateTrie | NodeKind::StorageTrie => {
                self.db.reader().get::<StateNodes>(&hash).ok().flatten().is_some()
            }
            NodeKind::Code => self.db.reader().get::<Code>(&hash).ok().flatten().is_some(),
        }
    }

    /// Pops up to `max_inflight` hashes to request next, deepest first. Callers batch-request
    /// these from diverse peers per §4.4.
    pub fn pop_batch(&mut self, max_inflight: usize) -> Vec<(B256, NodeKind)> {
        let mut batch = Vec::new();
        while batch.len() < max_inflight {
            let Some(entry) = self.missing.pop() else { break };
            if self.in_flight.contains(&entry.hash) {
                continue;
            }
            self.in_flight.insert(entry.hash);
            batch.push((entry.hash, entry.kind));
        }
        batch
    }

    /// Processes a response claiming to be for `hash`: verifies it was actually requested, then
    /// the hash itself, then enqueues any children the decoded node implies and resolves parents
    /// whose last child just arrived. Per §4.4's validation contract, the three ways a response
    /// can fail are distinguished rather than collapsed into one boolean: unsolicited and
    /// wrong-hash responses are always blacklist-worthy, while an empty response is requeued and
    /// only blacklisted once it has repeated past [`Self::EMPTY_RESPONSE_RETRY_LIMIT`].
    pub fn on_response(&mut self, hash: B256, bytes: Vec<u8>, children: NodeChildren) -> ResponseOutcome {
        if !self.in_flight.remove(&hash) {
            return ResponseOutcome::Unsolicited;
        }
        if bytes.is_empty() {
            let retries = self.empty_response_retries.entry(hash).or_insert(0);
            *retries += 1;
            let should_blacklist = *retries > Self::EMPTY_RESPONSE_RETRY_LIMIT;
            if let Some(node) = self.pending.get(&hash) {
                self.missing.push(MissingEntry { depth: node.depth, hash, kind: node.kind });
            }
            return ResponseOutcome::Empty { should_blacklist };
        }
        if keccak256(&bytes) != hash {
            return ResponseOutcome::HashMismatch;
        }
        let Some(node) = self.pending.get(&hash).cloned() else {
            return ResponseOutcome::Unsolicited;
        };
        self.empty_response_retries.remove(&hash);

        let mut expected_children = 0;
        for child in &children.trie_children {
            self.enqueue(*child, &[hash], node.depth + 1, node.kind);
            expected_children += 1;
        }
        if let Some(storage_root) = children.storage_root {
            self.enqueue(storage_root, &[hash], node.depth + 1, NodeKind::StorageTrie);
            expected_children += 1;
        }
        if let Some(code_hash) = children.code_hash {
            self.enqueue(code_hash, &[hash], node.depth + 1, NodeKind::Code);
            expected_children += 1;
        }

        if let Some(entry) = self.pending.get_mut(&hash) {
            entry.outstanding_children = expected_children;
        }
        self.mem_batch.push((hash, bytes, node.kind));
        self.mem_batch_hashes.insert(hash);
        self.resolve_if_ready(hash);
        if self.mem_batch.len() >= self.mem_batch_threshold {
            self.flush();
        }
        ResponseOutcome::Accepted
    }

    fn resolve_if_ready(&mut self, hash: B256) {
        let Some(node) = self.pending.get(&hash) else { return };
        if node.outstanding_children != 0 {
            return;
        }
        let node = self.pending.remove(&hash).unwrap();
        self.downloaded_nodes_count += 1;
        for parent in node.parents {
            if let Some(parent_entry) = self.pending.get_mut(&parent) {
                parent_entry.outstanding_children = parent_entry.outstanding_children.saturating_sub(1);
                if parent_entry.outstanding_children == 0 {
                    self.resolve_if_ready(parent);
                }
            }
        }
    }

    /// Flushes every node validated since the last flush to durable storage in one atomic
    /// write.
    pub fn flush(&mut self) {
        if self.mem_batch.is_empty() {
            return;
        }
        let mut state_writes = Vec::new();
        let mut code_writes = Vec::new();
        for (hash, bytes, kind) in self.mem_batch.drain(..) {
            self.mem_batch_hashes.remove(&hash);
            match kind {
                NodeKind::StateTrie | NodeKind::StorageTrie => {
                    state_writes.push(Write::Put { key: hash, value: bytes })
                }
                NodeKind::Code => code_writes.push(Write::Put { key: hash, value: bytes }),
            }
        }
        let _ = self.db.write::<StateNodes>(state_writes);
        let _ = self.db.write::<Code>(code_writes);
    }

    /// `true` once nothing remains pending, missing, or in flight and the final batch is
    /// flushed. Emits `StateSyncFinished` (left to the caller, which owns the event channel).
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.missing.is_empty() && self.in_flight.is_empty()
    }
}
