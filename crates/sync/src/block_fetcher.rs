use alloy_primitives::B256;
use etc_network::PeerId;
use etc_primitives::{Block, BlockHeader, BlockNumber};
use std::collections::{BTreeMap, HashSet};

/// Keeps an ordered, contiguous window of validated headers+bodies slightly ahead of the
/// importer during regular sync, per §4.5.
#[derive(Debug)]
pub struct BlockFetcher {
    ready_blocks: BTreeMap<BlockNumber, Block>,
    waiting_headers: Vec<BlockHeader>,
    known_top: BlockNumber,
    last_full_block_number: BlockNumber,
    max_queue_size: usize,
    state_node_fetches: HashSet<B256>,
}

impl BlockFetcher {
    /// Seeds the fetcher from the importer's current best block number.
    pub fn start(from_block: BlockNumber, max_queue_size: usize) -> Self {
        Self {
            ready_blocks: BTreeMap::new(),
            waiting_headers: Vec::new(),
            known_top: from_block,
            last_full_block_number: from_block,
            max_queue_size,
            state_node_fetches: HashSet::new(),
        }
    }

    pub fn last_full_block_number(&self) -> BlockNumber {
        self.last_full_block_number
    }

    pub fn known_top(&self) -> BlockNumber {
        self.known_top
    }

    /// `true` if the ready+waiting window has room for more fetched work.
    pub fn has_capacity(&self) -> bool {
        self.ready_blocks.len() + self.waiting_headers.len() < self.max_queue_size
    }

    /// A header arrived (from a `GetBlockHeaders` response); records it as awaiting its body.
    pub fn on_header(&mut self, header: BlockHeader) {
        self.known_top = self.known_top.max(header.number);
        self.waiting_headers.push(header);
    }

    /// A body arrived matching a previously recorded header; pairs them into a ready block.
    /// Returns `false` if no waiting header matches `header_hash`.
    pub fn on_body(&mut self, header_hash: B256, body: etc_primitives::BlockBody) -> bool {
        let Some(index) = self.waiting_headers.iter().position(|h| h.hash_slow() == header_hash)
        else {
            return false;
        };
        let header = self.waiting_headers.remove(index);
        let number = header.number;
        self.ready_blocks.insert(number, Block::new(header, body));
        true
    }

    /// Pops up to `n` contiguous ready blocks starting at `last_full_block_number + 1`, or
    /// `None` if fewer than `n` are available without a gap.
    pub fn pick_blocks(&mut self, n: usize) -> Option<Vec<Block>> {
        let mut blocks = Vec::with_capacity(n);
        let mut number = self.last_full_block_number + 1;
        for _ in 0..n {
            let block = self.ready_blocks.get(&number)?;
            blocks.push(block.clone());
            number += 1;
        }
        for block in &blocks {
            self.ready_blocks.remove(&block.header.number);
        }
        self.last_full_block_number = number - 1;
        Some(blocks)
    }

    /// Drops `readyBlocks`/`waitingHeaders` from `from` upward, e.g. after the importer rejects
    /// a block in this range. Does not itself blacklist; callers decide that from `reason`.
    pub fn invalidate_from(&mut self, from: BlockNumber, _reason: InvalidateReason) {
        self.ready_blocks.retain(|&number, _| number < from);
        self.waiting_headers.retain(|h| h.number < from);
        self.last_full_block_number = self.last_full_block_number.min(from.saturating_sub(1));
    }

    /// Handles an unsolicited `NewBlock` announcement per §4.5's dispatch rules.
    pub fn on_new_block(&mut self, block: Block) -> NewBlockAction {
        let number = block.header.number;
        if number == self.last_full_block_number + 1 {
            self.last_full_block_number = number;
            NewBlockAction::ForwardToImporter(block)
        } else if number > self.last_full_block_number + 1 {
            self.known_top = self.known_top.max(number);
            NewBlockAction::KeepFetching
        } else if self.waiting_headers.iter().any(|h| h.number == number) {
            self.on_body(block.header.hash(), block.body.clone());
            NewBlockAction::Adopted
        } else {
            NewBlockAction::Ignored
        }
    }

    /// Issues an on-demand missing-node request for `hash`, routed to `peer` when execution
    /// names one (§4.5). Returns `None` if a fetch for `hash` is already outstanding, so the
    /// importer never fires duplicate `GetNodeData` requests for the same node.
    pub fn fetch_state_node(&mut self, hash: B256, peer: Option<PeerId>) -> Option<StateNodeFetch> {
        if !self.state_node_fetches.insert(hash) {
            return None;
        }
        Some(StateNodeFetch { hash, peer })
    }

    /// Clears a state-node fetch once its response has landed (or the fetch timed out), so a
    /// later execution replay of the same node can be reissued.
    pub fn on_state_node_resolved(&mut self, hash: B256) {
        self.state_node_fetches.remove(&hash);
    }
}

/// Why a range of fetched work is being invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateReason {
    ImportFailed,
    Reorg,
}

/// What a caller should do with a `NewBlock` announcement, per §4.5.
#[derive(Debug)]
pub enum NewBlockAction {
    ForwardToImporter(Block),
    KeepFetching,
    Adopted,
    Ignored,
}

/// A state-node fetch issued on demand by the importer during execution (§4.6), tagged with the
/// peer it was routed to so a timeout can be attributed.
#[derive(Debug, Clone, Copy)]
pub struct StateNodeFetch {
    pub hash: B256,
    pub peer: Option<PeerId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use etc_primitives::BlockBody;

    fn header(number: u64) -> BlockHeader {
        BlockHeader { number, ..Default::default() }
    }

    #[test]
    fn pick_blocks_requires_contiguity() {
        let mut fetcher = BlockFetcher::start(0, 100);
        fetcher.on_header(header(1));
        fetcher.on_body(header(1).hash_slow(), BlockBody::default());
        assert!(fetcher.pick_blocks(2).is_none(), "only block 1 is ready, need 2");
        let picked = fetcher.pick_blocks(1).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(fetcher.last_full_block_number(), 1);
    }

    #[test]
    fn new_block_extending_tip_forwards_directly() {
        let mut fetcher = BlockFetcher::start(5, 100);
        let block = Block::new(header(6), BlockBody::default());
        match fetcher.on_new_block(block) {
            NewBlockAction::ForwardToImporter(b) => assert_eq!(b.header.number, 6),
            other => panic!("expected ForwardToImporter, got {other:?}"),
        }
    }

    #[test]
    fn new_block_far_ahead_just_updates_known_top() {
        let mut fetcher = BlockFetcher::start(5, 100);
        let block = Block::new(header(50), BlockBody::default());
        match fetcher.on_new_block(block) {
            NewBlockAction::KeepFetching => {}
            other => panic!("expected KeepFetching, got {other:?}"),
        }
        assert_eq!(fetcher.known_top(), 50);
    }

    #[test]
    fn new_block_matching_no_known_header_is_ignored() {
        let mut fetcher = BlockFetcher::start(5, 100);
        let block = Block::new(header(3), BlockBody::default());
        assert!(matches!(fetcher.on_new_block(block), NewBlockAction::Ignored));
    }

    #[test]
    fn fetch_state_node_dedups_while_outstanding() {
        let mut fetcher = BlockFetcher::start(0, 100);
        let hash = B256::repeat_byte(9);
        assert!(fetcher.fetch_state_node(hash, None).is_some());
        assert!(fetcher.fetch_state_node(hash, None).is_none(), "already outstanding");
        fetcher.on_state_node_resolved(hash);
        assert!(fetcher.fetch_state_node(hash, None).is_some(), "resolved, can refetch");
    }

    #[test]
    fn invalidate_from_drops_ready_and_waiting_at_and_after() {
        let mut fetcher = BlockFetcher::start(0, 100);
        fetcher.on_header(header(1));
        fetcher.on_body(header(1).hash_slow(), BlockBody::default());
        fetcher.on_header(header(2));
        fetcher.invalidate_from(1, InvalidateReason::ImportFailed);
        assert!(fetcher.pick_blocks(1).is_none());
    }
}
