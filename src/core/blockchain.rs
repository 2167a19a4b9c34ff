// The chain is an in-memory vector of blocks, genesis first.
// Appends go through the same link validation that whole-chain checks use,
// so a Blockchain built through `new` + `add_block` is always valid.

use crate::core::validation::{validate_chain, validate_new_block};
use crate::core::Block;
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// A chain holding only the canonical genesis block
    pub fn new() -> Blockchain {
        Blockchain {
            blocks: vec![Block::genesis()],
        }
    }

    /// Wrap blocks received from elsewhere. Nothing is checked here;
    /// call `is_valid` before trusting the result.
    pub fn from_blocks(blocks: Vec<Block>) -> Blockchain {
        Blockchain { blocks }
    }

    pub fn is_valid(&self) -> Result<()> {
        validate_chain(&self.blocks)
    }

    /// Highest-index block. `None` only for an unvalidated empty chain.
    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn get_best_height(&self) -> Option<u64> {
        self.latest_block().map(Block::get_index)
    }

    /// Build (but do not append) the successor of the current head
    pub fn generate_next_block(&self, data: &str) -> Result<Block> {
        let head = self.latest_block().ok_or(BlockchainError::EmptyChain)?;
        Ok(Block::generate_next(head, data))
    }

    /// Validate `block` against the head and append it. On error the chain is untouched.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        let head = self.latest_block().ok_or(BlockchainError::EmptyChain)?;
        validate_new_block(&block, head)?;
        self.blocks.push(block);
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
