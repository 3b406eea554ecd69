//! This module contains function layout information including block order and
//! instruction order.
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;

use super::{BlockId, InstId};

#[derive(Debug, Clone, Default)]
pub struct Layout {
    blocks: Vec<BlockId>,
    insts: SecondaryMap<BlockId, SmallVec<[InstId; 8]>>,
    inst_block: SecondaryMap<InstId, Option<BlockId>>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }

    pub fn last_block(&self) -> Option<BlockId> {
        self.blocks.last().copied()
    }

    pub fn is_block_inserted(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    pub fn is_block_empty(&self, block: BlockId) -> bool {
        self.insts[block].is_empty()
    }

    pub fn first_inst_of(&self, block: BlockId) -> Option<InstId> {
        self.insts[block].first().copied()
    }

    pub fn last_inst_of(&self, block: BlockId) -> Option<InstId> {
        self.insts[block].last().copied()
    }

    pub fn inst_block(&self, inst: InstId) -> Option<BlockId> {
        self.inst_block[inst]
    }

    pub fn iter_block(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().copied()
    }

    pub fn iter_inst(&self, block: BlockId) -> impl Iterator<Item = InstId> + '_ {
        self.insts[block].iter().copied()
    }

    pub fn append_block(&mut self, block: BlockId) {
        debug_assert!(!self.is_block_inserted(block));
        self.blocks.push(block);
    }

    pub fn append_inst(&mut self, inst: InstId, block: BlockId) {
        debug_assert!(self.is_block_inserted(block));
        debug_assert!(self.inst_block[inst].is_none());
        self.insts[block].push(inst);
        self.inst_block[inst] = Some(block);
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}
