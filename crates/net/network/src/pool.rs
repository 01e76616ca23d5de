use crate::blacklist::{Blacklist, BlacklistReason};
use alloy_primitives::{B256, B512};
use etc_primitives::ChainWeight;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A peer's public identity on the wire (its node id / public key), distinct from its network
/// address so the blacklist survives the peer reconnecting from a new address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(pub B512);

/// Everything the sync core tracks about one handshaked peer, mutated by request/response/
/// timeout events and destroyed on disconnect, per the component spec's data model.
#[derive(Clone, Debug)]
pub struct PeerRecord {
    pub id: PeerId,
    pub addr: std::net::SocketAddr,
    pub best_hash: B256,
    pub chain_weight: ChainWeight,
    pub last_response_at: Instant,
    pub pending_requests: u32,
}

impl PeerRecord {
    fn touch(&mut self, now: Instant) {
        self.last_response_at = now;
    }
}

/// Tracks every handshaked peer plus a time-bounded blacklist, and answers the request-routing
/// question every other component asks: "which peer should I send this to".
#[derive(Debug, Default)]
pub struct PeerPool {
    inner: RwLock<PoolInner>,
}

#[derive(Debug, Default)]
struct PoolInner {
    peers: HashMap<PeerId, PeerRecord>,
    blacklist: Blacklist,
    max_inbound: usize,
    max_outbound: usize,
    inbound_count: usize,
    outbound_count: usize,
}

/// Whether a newly handshaked connection was initiated by us or by the remote peer — the pool
/// caps each direction independently per §4.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Returned by [`PeerPool::on_handshake_done`] when a connection must be rejected because its
/// direction is already at capacity.
#[derive(Debug, thiserror::Error)]
#[error("peer rejected: too many peers in this direction")]
pub struct TooManyPeers;

impl PeerPool {
    /// Builds a pool with independent inbound/outbound connection caps.
    pub fn new(max_inbound: usize, max_outbound: usize) -> Self {
        Self {
            inner: RwLock::new(PoolInner {
                peers: HashMap::new(),
                blacklist: Blacklist::new(),
                max_inbound,
                max_outbound,
                inbound_count: 0,
                outbound_count: 0,
            }),
        }
    }

    /// Registers a newly handshaked peer, rejecting it if its connection direction is already
    /// saturated.
    pub fn on_handshake_done(
        &self,
        record: PeerRecord,
        direction: Direction,
    ) -> Result<(), TooManyPeers> {
        let mut inner = self.inner.write();
        match direction {
            Direction::Inbound if inner.inbound_count >= inner.max_inbound => {
                return Err(TooManyPeers)
            }
            Direction::Outbound if inner.outbound_count >= inner.max_outbound => {
                return Err(TooManyPeers)
            }
            Direction::Inbound => inner.inbound_count += 1,
            Direction::Outbound => inner.outbound_count += 1,
        }
        inner.peers.insert(record.id, record);
        Ok(())
    }

    /// Removes a peer on disconnect. Its direction slot and blacklist entry (if any) are left
    /// alone — reconnecting from the same id still observes any live blacklist.
    pub fn on_disconnect(&self, peer: PeerId, direction: Direction) {
        let mut inner = self.inner.write();
        if inner.peers.remove(&peer).is_some() {
            match direction {
                Direction::Inbound => inner.inbound_count = inner.inbound_count.saturating_sub(1),
                Direction::Outbound => {
                    inner.outbound_count = inner.outbound_count.saturating_sub(1)
                }
            }
        }
    }

    /// Blacklists `peer` for the tier of duration its `reason` implies. Extending an existing
    /// entry uses the later of the two expiries.
    pub fn blacklist(&self, peer: PeerId, reason: BlacklistReason, now: Instant) {
        self.inner.write().blacklist.blacklist(peer, reason, now);
    }

    /// Peers with an active session that are not currently blacklisted.
    pub fn handshaked_peers(&self, now: Instant) -> Vec<PeerRecord> {
        let inner = self.inner.read();
        inner
            .peers
            .values()
            .filter(|p| !inner.blacklist.is_blacklisted(p.id, now))
            .cloned()
            .collect()
    }

    /// Updates bookkeeping after a response from `peer` arrives.
    pub fn on_response(&self, peer: PeerId, now: Instant) {
        let mut inner = self.inner.write();
        if let Some(record) = inner.peers.get_mut(&peer) {
            record.touch(now);
            record.pending_requests = record.pending_requests.saturating_sub(1);
        }
    }

    /// Records that a request was just sent to `peer`.
    pub fn on_request_sent(&self, peer: PeerId) {
        let mut inner = self.inner.write();
        if let Some(record) = inner.peers.get_mut(&peer) {
            record.pending_requests += 1;
        }
    }

    /// Picks a peer with weight at or above `min_weight`, not blacklisted, and not already
    /// carrying `max_pending` or more outstanding requests. Ties break by lowest latency
    /// (freshest `last_response_at`), then by the lower peer id for determinism.
    pub fn choose_best_peer(
        &self,
        min_weight: ChainWeight,
        max_pending: u32,
        now: Instant,
    ) -> Option<PeerRecord> {
        let inner = self.inner.read();
        inner
            .peers
            .values()
            .filter(|p| {
                p.chain_weight >= min_weight
                    && p.pending_requests < max_pending
                    && !inner.blacklist.is_blacklisted(p.id, now)
            })
            .max_by(|a, b| {
                a.last_response_at
                    .cmp(&b.last_response_at)
                    .then_with(|| b.id.0.cmp(&a.id.0))
            })
            .cloned()
    }

    /// Periodic maintenance: drops expired blacklist entries.
    pub fn evict_expired_blacklist(&self, now: Instant) {
        self.inner.write().blacklist.evict_expired(now);
    }
}
