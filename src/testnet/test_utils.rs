//! Test utilities for chain and sync testing

use crate::core::{Block, Blockchain};
use crate::error::{BlockchainError, Result};
use crate::network::{Message, Node, Peer, Peers};
use std::sync::{Arc, Mutex};

/// A peer that keeps every message it is sent
pub struct RecordingPeer {
    addr: String,
    fail: bool,
    sent: Mutex<Vec<Message>>,
}

impl RecordingPeer {
    pub fn new(addr: &str) -> Arc<RecordingPeer> {
        Arc::new(RecordingPeer {
            addr: addr.to_string(),
            fail: false,
            sent: Mutex::new(vec![]),
        })
    }

    /// A peer whose every write fails
    pub fn failing(addr: &str) -> Arc<RecordingPeer> {
        Arc::new(RecordingPeer {
            addr: addr.to_string(),
            fail: true,
            sent: Mutex::new(vec![]),
        })
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Peer for RecordingPeer {
    fn addr(&self) -> String {
        self.addr.clone()
    }

    fn send(&self, message: &Message) -> Result<()> {
        if self.fail {
            return Err(BlockchainError::Network(format!(
                "{} is unreachable",
                self.addr
            )));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Valid chain of `len` blocks, genesis included
pub fn build_chain(len: usize) -> Vec<Block> {
    let mut chain = Blockchain::new();
    while chain.len() < len {
        let block = chain
            .generate_next_block(&format!("block {}", chain.len()))
            .unwrap();
        chain.add_block(block).unwrap();
    }
    chain.into_blocks()
}

/// A node with one recording peer attached
pub fn create_test_node() -> (Arc<Node>, Arc<RecordingPeer>) {
    let peers = Arc::new(Peers::new());
    let peer = RecordingPeer::new("127.0.0.1:7001");
    peers.add_peer(peer.clone());
    (Arc::new(Node::new(peers)), peer)
}

/// A node whose chain already holds `len` blocks
pub fn create_test_node_with_chain(len: usize) -> (Arc<Node>, Arc<RecordingPeer>) {
    let (node, peer) = create_test_node();
    if len > 1 {
        node.replace_chain(build_chain(len)).unwrap();
    }
    peer.clear();
    (node, peer)
}
