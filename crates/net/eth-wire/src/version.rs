/// Negotiated wire protocol version. `Etc64` carries [`crate::StatusWeight::ChainWeight`]
/// instead of a bare total difficulty, per the component spec's external-interfaces section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EthVersion {
    /// PV62: headers/bodies request-response, no receipts.
    Eth62 = 62,
    /// PV63: adds `GetReceipts`/`Receipts` and `GetNodeData`/`NodeData`.
    Eth63 = 63,
    /// ETC64: PV63 plus chain-weight-based status instead of plain total difficulty.
    Etc64 = 64,
}

impl EthVersion {
    /// `true` for versions whose `Status` payload carries a chain weight rather than a bare
    /// total difficulty.
    pub fn uses_chain_weight(self) -> bool {
        matches!(self, Self::Etc64)
    }
}

/// An unrecognized protocol version number.
#[derive(Debug, thiserror::Error)]
#[error("unsupported eth wire protocol version: {0}")]
pub struct UnknownVersion(pub u8);

impl TryFrom<u8> for EthVersion {
    type Error = UnknownVersion;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            62 => Ok(Self::Eth62),
            63 => Ok(Self::Eth63),
            64 => Ok(Self::Etc64),
            other => Err(UnknownVersion(other)),
        }
    }
}
