use etc_network::PeerId;
use etc_primitives::{BlockHeader, BlockNumber};
use std::collections::HashMap;

/// Outcome of one pivot-selection attempt, per §4.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PivotOutcome {
    /// A quorum of sampled peers agreed on a header at the requested height.
    Selected(BlockHeader),
    /// No quorum formed this round; caller should retry after backoff.
    NoQuorum,
    /// Too few peers were available to even attempt a sample.
    InsufficientPeers,
}

/// Samples a quorum of peers for the header at `peer.bestBlockNumber - pivotBlockOffset` and
/// picks it as the fast-sync pivot once enough peers agree, per §4.2. This struct only
/// aggregates responses already collected by the caller (the network round-trip itself is
/// outside this crate's concern); it answers "does this round of responses form a quorum".
#[derive(Debug)]
pub struct PivotSelector {
    min_peers: usize,
    quorum_percentage: u8,
}

impl PivotSelector {
    /// Builds a selector requiring at least `min_peers` samples and a `quorum_percentage` (0-100)
    /// agreement to converge.
    pub fn new(min_peers: usize, quorum_percentage: u8) -> Self {
        Self { min_peers, quorum_percentage: quorum_percentage.min(100) }
    }

    /// The height to request from each sampled peer, given its advertised best block number.
    pub fn target_height(&self, peer_best: BlockNumber, pivot_block_offset: u64) -> BlockNumber {
        peer_best.saturating_sub(pivot_block_offset)
    }

    /// Evaluates one round of `(peer, header)` responses, grouping by header hash and requiring
    /// `quorum_percentage` of the *sampled* peer count (not just the responding count) to agree.
    pub fn evaluate(
        &self,
        sampled_peer_count: usize,
        responses: &[(PeerId, BlockHeader)],
    ) -> PivotOutcome {
        if sampled_peer_count < self.min_peers {
            return PivotOutcome::InsufficientPeers;
        }
        let mut grouped: HashMap<alloy_primitives::B256, (usize, BlockHeader)> = HashMap::new();
        for (_, header) in responses {
            let hash = header.hash_slow();
            grouped.entry(hash).or_insert_with(|| (0, header.clone())).0 += 1;
        }
        let required = (sampled_peer_count * self.quorum_percentage as usize).div_ceil(100);
        grouped
            .into_values()
            .find(|(count, _)| *count >= required.max(1))
            .map(|(_, header)| PivotOutcome::Selected(header))
            .unwrap_or(PivotOutcome::NoQuorum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B512;

    fn peer(byte: u8) -> PeerId {
        PeerId(B512::repeat_byte(byte))
    }

    fn header(number: u64, salt: u8) -> BlockHeader {
        BlockHeader { number, extra_data: alloy_primitives::Bytes::from(vec![salt]), ..Default::default() }
    }

    #[test]
    fn too_few_peers_is_insufficient() {
        let selector = PivotSelector::new(3, 60);
        assert_eq!(selector.evaluate(2, &[]), PivotOutcome::InsufficientPeers);
    }

    #[test]
    fn converging_majority_selects_pivot() {
        let selector = PivotSelector::new(3, 60);
        let agreed = header(900, 1);
        let responses =
            vec![(peer(1), agreed.clone()), (peer(2), agreed.clone()), (peer(3), header(900, 2))];
        assert_eq!(selector.evaluate(3, &responses), PivotOutcome::Selected(agreed));
    }

    #[test]
    fn split_responses_with_no_majority_is_no_quorum() {
        let selector = PivotSelector::new(3, 60);
        let responses =
            vec![(peer(1), header(900, 1)), (peer(2), header(900, 2)), (peer(3), header(900, 3))];
        assert_eq!(selector.evaluate(3, &responses), PivotOutcome::NoQuorum);
    }

    #[test]
    fn target_height_subtracts_offset_without_underflow() {
        let selector = PivotSelector::new(3, 60);
        assert_eq!(selector.target_height(1000, 64), 936);
        assert_eq!(selector.target_height(10, 64), 0);
    }
}
