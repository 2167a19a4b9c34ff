use crate::core::{Block, Blockchain};
use crate::error::{BlockchainError, Result};
use crate::network::{Message, Peers};
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Owns the node's single working chain.
///
/// All mutation happens through a [`NodeGuard`], so "read head, validate,
/// append or replace, broadcast" is one critical section.
pub struct Node {
    chain: Mutex<Blockchain>,
    peers: Arc<Peers>,
}

/// Exclusive access to the chain together with the peers it is announced to.
pub struct NodeGuard<'a> {
    chain: MutexGuard<'a, Blockchain>,
    peers: &'a Peers,
}

impl Node {
    pub fn new(peers: Arc<Peers>) -> Node {
        Node {
            chain: Mutex::new(Blockchain::new()),
            peers,
        }
    }

    pub fn peers(&self) -> &Arc<Peers> {
        &self.peers
    }

    pub fn lock(&self) -> NodeGuard<'_> {
        NodeGuard {
            chain: self.chain.lock().unwrap_or_else(PoisonError::into_inner),
            peers: &self.peers,
        }
    }

    /// Read-only snapshot of the current chain
    pub fn blockchain(&self) -> Blockchain {
        self.lock().chain.clone()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.blockchain().into_blocks()
    }

    pub fn latest_block(&self) -> Result<Block> {
        self.lock().latest_block().cloned()
    }

    pub fn generate_next_block(&self, data: &str) -> Result<Block> {
        self.lock().chain.generate_next_block(data)
    }

    pub fn add_block(&self, block: Block) -> Result<()> {
        self.lock().add_block(block)
    }

    pub fn replace_chain(&self, candidate: Vec<Block>) -> Result<()> {
        self.lock().replace_chain(candidate)
    }

    /// Mine a block off the current head, append it and announce it.
    pub fn mine_block(&self, data: &str) -> Result<Block> {
        let mut node = self.lock();
        let block = node.chain.generate_next_block(data)?;
        node.add_block(block.clone())?;
        info!("new block added: {} ({})", block.get_index(), block.get_hash());
        node.broadcast_latest()?;
        Ok(block)
    }
}

impl NodeGuard<'_> {
    pub fn latest_block(&self) -> Result<&Block> {
        self.chain.latest_block().ok_or(BlockchainError::EmptyChain)
    }

    pub fn add_block(&mut self, block: Block) -> Result<()> {
        self.chain.add_block(block)
    }

    /// Swap the whole chain for `candidate` if it is valid and strictly longer,
    /// then announce the new head. Nothing changes on error.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<()> {
        let candidate = Blockchain::from_blocks(candidate);
        candidate
            .is_valid()
            .map_err(|e| BlockchainError::InvalidChain(Box::new(e)))?;

        if candidate.len() <= self.chain.len() {
            return Err(BlockchainError::NotLonger {
                received: candidate.len(),
                current: self.chain.len(),
            });
        }

        info!(
            "replacing chain of length {} with received chain of length {}",
            self.chain.len(),
            candidate.len()
        );
        *self.chain = candidate;
        self.broadcast_latest()?;
        Ok(())
    }

    pub fn broadcast(&self, message: &Message) -> usize {
        self.peers.broadcast(message)
    }

    /// Announce the current head to every peer as a single-block response
    pub fn broadcast_latest(&self) -> Result<usize> {
        let head = self.latest_block()?.clone();
        Ok(self.broadcast(&Message::response_block(head)))
    }
}
