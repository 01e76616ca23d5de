use crate::BlockNumber;
use alloy_primitives::U256;
use std::cmp::Ordering;

/// Total order over candidate chains: `(latestCheckpointNumber, totalDifficulty)` compared
/// lexicographically. A chain with a later checkpoint always outranks one with more raw
/// difficulty — checkpoints are the "NewConsensus" tie-break this core standardizes on (see
/// `DESIGN.md`, open question (i)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainWeight {
    /// Accumulated proof-of-work difficulty of the chain, from genesis to tip.
    pub total_difficulty: U256,
    /// Height of the most recent finalized checkpoint observed on this chain, if any.
    pub latest_checkpoint_number: BlockNumber,
}

impl ChainWeight {
    /// A weight of zero difficulty and no checkpoint — the weight of an empty chain before
    /// genesis is applied.
    pub const ZERO: Self = Self { total_difficulty: U256::ZERO, latest_checkpoint_number: 0 };

    /// Constructs a weight from genesis, with no checkpoint yet observed.
    pub fn new(total_difficulty: U256) -> Self {
        Self { total_difficulty, latest_checkpoint_number: 0 }
    }

    /// Returns the weight of this chain after appending a header with the given `difficulty`,
    /// optionally bumping the checkpoint height if the header finalizes one.
    pub fn extended_by(&self, difficulty: U256, checkpoint_number: Option<BlockNumber>) -> Self {
        Self {
            total_difficulty: self.total_difficulty + difficulty,
            latest_checkpoint_number: checkpoint_number
                .map(|c| c.max(self.latest_checkpoint_number))
                .unwrap_or(self.latest_checkpoint_number),
        }
    }
}

impl PartialOrd for ChainWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChainWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latest_checkpoint_number
            .cmp(&other.latest_checkpoint_number)
            .then_with(|| self.total_difficulty.cmp(&other.total_difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_dominates_total_difficulty() {
        let heavy_no_checkpoint =
            ChainWeight { total_difficulty: U256::from(1_000_000u64), latest_checkpoint_number: 0 };
        let light_with_checkpoint =
            ChainWeight { total_difficulty: U256::from(1u64), latest_checkpoint_number: 10 };
        assert!(light_with_checkpoint > heavy_no_checkpoint);
    }

    #[test]
    fn equal_checkpoints_fall_back_to_difficulty() {
        let a = ChainWeight { total_difficulty: U256::from(5u64), latest_checkpoint_number: 3 };
        let b = ChainWeight { total_difficulty: U256::from(9u64), latest_checkpoint_number: 3 };
        assert!(b > a);
    }

    #[test]
    fn extend_accumulates_difficulty_and_tracks_max_checkpoint() {
        let w = ChainWeight::new(U256::from(10u64));
        let w = w.extended_by(U256::from(5u64), None);
        assert_eq!(w.total_difficulty, U256::from(15u64));
        let w = w.extended_by(U256::from(5u64), Some(7));
        assert_eq!(w.latest_checkpoint_number, 7);
        let w = w.extended_by(U256::from(5u64), Some(2));
        assert_eq!(w.latest_checkpoint_number, 7, "checkpoint height never regresses");
    }
}
