use crate::pool::PeerId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Why a peer was blacklisted, which determines the tier of exclusion duration per the pool's
/// policy (§4.1): `TooManyPeers` is a transient courtesy block, everything else is a
/// suspicion-of-misbehavior block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlacklistReason {
    /// Peer rejected us because it's already full; worth retrying soon.
    TooManyPeers,
    /// Peer sent a header, body, or receipt that failed validation against its commitment.
    InvalidData,
    /// Peer sent an unsolicited or request-id-mismatched response.
    Unsolicited,
    /// Peer's data could not even be decoded (malformed RLP).
    Malformed,
}

impl BlacklistReason {
    /// The duration this reason blacklists for when no caller-supplied duration overrides it.
    pub fn default_duration(self) -> Duration {
        match self {
            Self::TooManyPeers => Duration::from_secs(30),
            Self::InvalidData | Self::Unsolicited | Self::Malformed => Duration::from_secs(600),
        }
    }
}

/// Time-bounded exclusion list, keyed by peer id. Entries expire on their own; [`Blacklist::is_blacklisted`]
/// never needs an explicit sweep, but [`Blacklist::evict_expired`] is called periodically to keep the
/// map from growing unbounded between sweeps.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: HashMap<PeerId, Instant>,
    /// Hard cap on live entries; once reached, the soonest-to-expire entry is evicted to make
    /// room rather than letting the map grow without bound.
    capacity: usize,
}

const DEFAULT_CAPACITY: usize = 4096;

impl Blacklist {
    /// Builds an empty blacklist with the default capacity.
    pub fn new() -> Self {
        Self { entries: HashMap::new(), capacity: DEFAULT_CAPACITY }
    }

    /// Blacklists `peer` until `now + reason.default_duration()`. Idempotent: if the peer is
    /// already blacklisted, the entry is extended only if the new expiry is later than the
    /// existing one (`max(existing, new)`), per §4.1.
    pub fn blacklist(&mut self, peer: PeerId, reason: BlacklistReason, now: Instant) {
        self.blacklist_for(peer, reason.default_duration(), now)
    }

    /// As [`Blacklist::blacklist`], but with an explicit duration rather than the reason's
    /// default — used by callers (e.g. repeated-offense escalation) that want a longer block.
    pub fn blacklist_for(&mut self, peer: PeerId, duration: Duration, now: Instant) {
        let until = now + duration;
        let entry = self.entries.entry(peer).or_insert(until);
        if until > *entry {
            *entry = until;
        }
        if self.entries.len() > self.capacity {
            self.evict_soonest_to_expire();
        }
    }

    /// `true` if `peer` is currently excluded.
    pub fn is_blacklisted(&self, peer: PeerId, now: Instant) -> bool {
        self.entries.get(&peer).is_some_and(|until| *until > now)
    }

    /// Drops every entry whose exclusion window has already passed.
    pub fn evict_expired(&mut self, now: Instant) {
        self.entries.retain(|_, until| *until > now);
    }

    fn evict_soonest_to_expire(&mut self) {
        if let Some((&peer, _)) = self.entries.iter().min_by_key(|(_, until)| **until) {
            self.entries.remove(&peer);
        }
    }

    /// Number of currently tracked entries (expired or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no peer is tracked at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B512;

    fn peer(byte: u8) -> PeerId {
        PeerId(B512::repeat_byte(byte))
    }

    #[test]
    fn fresh_peer_is_not_blacklisted() {
        let list = Blacklist::new();
        assert!(!list.is_blacklisted(peer(1), Instant::now()));
    }

    #[test]
    fn blacklisted_peer_is_excluded_until_expiry() {
        let mut list = Blacklist::new();
        let now = Instant::now();
        list.blacklist(peer(1), BlacklistReason::TooManyPeers, now);
        assert!(list.is_blacklisted(peer(1), now));
        assert!(!list.is_blacklisted(peer(1), now + Duration::from_secs(31)));
    }

    #[test]
    fn extending_uses_the_later_expiry() {
        let mut list = Blacklist::new();
        let now = Instant::now();
        list.blacklist(peer(1), BlacklistReason::TooManyPeers, now);
        list.blacklist_for(peer(1), Duration::from_secs(5), now);
        // the longer TooManyPeers window (30s) must survive a shorter extension attempt.
        assert!(list.is_blacklisted(peer(1), now + Duration::from_secs(10)));
    }

    #[test]
    fn malformed_data_blacklists_longer_than_too_many_peers() {
        assert!(
            BlacklistReason::Malformed.default_duration()
                > BlacklistReason::TooManyPeers.default_duration()
        );
    }

    #[test]
    fn evict_expired_prunes_stale_entries() {
        let mut list = Blacklist::new();
        let now = Instant::now();
        list.blacklist(peer(1), BlacklistReason::TooManyPeers, now);
        list.evict_expired(now + Duration::from_secs(60));
        assert!(list.is_empty());
    }
}
