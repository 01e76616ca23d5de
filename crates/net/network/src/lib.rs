//! Peer lifecycle tracking for the sync core: the handshaked-peer set, tiered time-bounded
//! blacklisting, and best-peer selection for request assignment. Session handshake and wire
//! framing themselves are out of scope — this crate only tracks the bookkeeping the sync
//! components need once a session is established.

mod blacklist;
mod pool;

pub use blacklist::{BlacklistReason, Blacklist};
pub use pool::{PeerId, PeerPool, PeerRecord};
