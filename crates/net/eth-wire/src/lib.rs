//! RLP-encoded wire messages for the PV62/PV63/ETC64 Ethereum Classic peer protocol. Every type
//! here is bit-exact with what a real peer sends — callers of this crate are the network
//! session framing (out of scope) feeding these into/out of a length-prefixed message stream.

mod messages;
mod status;
mod version;

pub use messages::{
    BlockBodies, BlockHashNumber, BlockHeaders, GetBlockBodies, GetBlockHeaders, GetNodeData,
    GetReceipts, HashOrNumber, NewBlock, NewBlockHashes, NodeData, Receipts,
};
pub use status::{Status, StatusWeight};
pub use version::EthVersion;
