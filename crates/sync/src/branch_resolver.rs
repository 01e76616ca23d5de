use alloy_primitives::B256;
use etc_interfaces::BlockchainReader;
use etc_primitives::{BlockHeader, ChainWeight};

/// Outcome of resolving a candidate header chain against the current canonical chain, per §4.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The candidate extends (or replaces a suffix of) canonical with greater weight. Carries
    /// the canonical suffix that must be rolled back — empty for a straight extension.
    NewBetterBranch(Vec<B256>),
    /// The candidate is chain-connected and known, but does not outweigh canonical.
    NoChainSwitch,
    /// The candidate's root does not connect to any known (canonical or queued) ancestor.
    UnknownBranch,
    /// The candidate headers are not internally chain-linked.
    InvalidBranch,
}

/// Decides whether a candidate header chain should become canonical, using accumulated
/// [`ChainWeight`] per the checkpoint-then-difficulty lexicographic rule (open question (i),
/// resolved in `DESIGN.md`).
#[derive(Debug)]
pub struct BranchResolver<R> {
    chain: R,
}

impl<R: BlockchainReader> BranchResolver<R> {
    /// Builds a resolver reading canonical state through `chain`.
    pub fn new(chain: R) -> Self {
        Self { chain }
    }

    /// Resolves a non-empty candidate chain `headers`, already known to be internally
    /// chain-connected by hash, against the current canonical chain.
    pub fn resolve(&self, headers: &[BlockHeader]) -> BranchOutcome {
        if headers.is_empty() {
            return BranchOutcome::InvalidBranch;
        }
        if !Self::internally_linked(headers) {
            return BranchOutcome::InvalidBranch;
        }

        let root = &headers[0];
        let Ok(Some(parent_weight)) = self.chain.chain_weight(root.parent_hash) else {
            return BranchOutcome::UnknownBranch;
        };

        let new_weight = headers.iter().fold(parent_weight, |weight, header| {
            weight.extended_by(header.difficulty, None)
        });

        let displaced = self.displaced_suffix(root.parent_hash, root.number);
        let old_weight = displaced.iter().fold(parent_weight, |weight, (_, difficulty)| {
            weight.extended_by(*difficulty, None)
        });

        if new_weight > old_weight {
            BranchOutcome::NewBetterBranch(displaced.into_iter().map(|(hash, _)| hash).collect())
        } else {
            BranchOutcome::NoChainSwitch
        }
    }

    fn internally_linked(headers: &[BlockHeader]) -> bool {
        headers.windows(2).all(|pair| {
            pair[1].parent_hash == pair[0].hash_slow() && pair[1].number == pair[0].number + 1
        })
    }

    /// Walks canonical forward from `(parent_hash, from_number)`, collecting the suffix that a
    /// branch rooted there would displace, alongside each displaced header's own difficulty so
    /// the caller can fold it into `old_weight` without a second storage round-trip.
    fn displaced_suffix(&self, parent_hash: B256, from_number: u64) -> Vec<(B256, alloy_primitives::U256)> {
        let mut suffix = Vec::new();
        let mut number = from_number;
        let mut expected_parent = parent_hash;
        loop {
            let Ok(Some(hash)) = self.chain.block_hash(number) else { break };
            let Ok(Some(header)) = self.chain.header(hash) else { break };
            if header.parent_hash != expected_parent {
                break;
            }
            suffix.push((hash, header.difficulty));
            expected_parent = hash;
            number += 1;
        }
        suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etc_db::mem::MemoryDatabase;
    use etc_interfaces::{Blockchain, BlockchainWriter, CommitBatch};

    fn chain_with_tip(blocks: u64) -> (Blockchain<MemoryDatabase>, Vec<BlockHeader>) {
        let chain = Blockchain::new(MemoryDatabase::new()).unwrap();
        let mut headers = Vec::new();
        let mut parent_hash = B256::ZERO;
        let mut weight = ChainWeight::ZERO;
        for number in 1..=blocks {
            let header = BlockHeader {
                parent_hash,
                number,
                difficulty: alloy_primitives::U256::from(10u64),
                ..Default::default()
            };
            let hash = header.hash_slow();
            weight = weight.extended_by(header.difficulty, None);
            chain
                .commit(CommitBatch {
                    headers: vec![(hash, header.clone())],
                    chain_weights: vec![(hash, weight)],
                    canonical: vec![(number, hash)],
                    new_best: number,
                    ..Default::default()
                })
                .unwrap();
            parent_hash = hash;
            headers.push(header);
        }
        (chain, headers)
    }

    #[test]
    fn straight_extension_is_better_branch_with_empty_displaced_suffix() {
        let (chain, headers) = chain_with_tip(3);
        let tip = headers.last().unwrap();
        let next = BlockHeader {
            parent_hash: tip.hash_slow(),
            number: tip.number + 1,
            difficulty: alloy_primitives::U256::from(10u64),
            ..Default::default()
        };
        let resolver = BranchResolver::new(chain.clone());
        assert_eq!(resolver.resolve(&[next]), BranchOutcome::NewBetterBranch(vec![]));
    }

    #[test]
    fn unknown_parent_is_unknown_branch() {
        let (chain, _headers) = chain_with_tip(3);
        let orphan = BlockHeader { parent_hash: B256::repeat_byte(0xee), number: 99, ..Default::default() };
        let resolver = BranchResolver::new(chain.clone());
        assert_eq!(resolver.resolve(&[orphan]), BranchOutcome::UnknownBranch);
    }

    #[test]
    fn disconnected_headers_are_invalid_branch() {
        let (chain, headers) = chain_with_tip(3);
        let tip = headers.last().unwrap();
        let a = BlockHeader { parent_hash: tip.hash_slow(), number: tip.number + 1, ..Default::default() };
        let b = BlockHeader { parent_hash: B256::repeat_byte(1), number: tip.number + 2, ..Default::default() };
        let resolver = BranchResolver::new(chain.clone());
        assert_eq!(resolver.resolve(&[a, b]), BranchOutcome::InvalidBranch);
    }

    #[test]
    fn lighter_fork_is_no_chain_switch() {
        let (chain, headers) = chain_with_tip(3);
        let ancestor = &headers[0];
        let lighter = BlockHeader {
            parent_hash: ancestor.hash_slow(),
            number: ancestor.number + 1,
            difficulty: alloy_primitives::U256::from(1u64),
            extra_data: alloy_primitives::Bytes::from(vec![1]),
            ..Default::default()
        };
        let resolver = BranchResolver::new(chain.clone());
        assert_eq!(resolver.resolve(&[lighter]), BranchOutcome::NoChainSwitch);
    }

    #[test]
    fn heavier_fork_displaces_canonical_suffix() {
        let (chain, headers) = chain_with_tip(3);
        let ancestor = &headers[0];
        let heavy_1 = BlockHeader {
            parent_hash: ancestor.hash_slow(),
            number: ancestor.number + 1,
            difficulty: alloy_primitives::U256::from(100u64),
            extra_data: alloy_primitives::Bytes::from(vec![1]),
            ..Default::default()
        };
        let heavy_2 = BlockHeader {
            parent_hash: heavy_1.hash_slow(),
            number: heavy_1.number + 1,
            difficulty: alloy_primitives::U256::from(100u64),
            ..Default::default()
        };
        let resolver = BranchResolver::new(chain.clone());
        let outcome = resolver.resolve(&[heavy_1, heavy_2]);
        match outcome {
            BranchOutcome::NewBetterBranch(displaced) => assert_eq!(displaced.len(), 2),
            other => panic!("expected NewBetterBranch, got {other:?}"),
        }
    }
}
