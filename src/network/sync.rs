//! Peer synchronization
//!
//! The engine answers chain queries from peers and reconciles the local
//! chain whenever a peer reports blocks. It never touches sockets itself;
//! the [`Server`](crate::network::Server) feeds it decoded messages together
//! with the peer they came from.
//!
//! Reconciliation of a received block sequence:
//!
//! ```text
//! received head <= local head          -> ignore
//! received head extends local head     -> append it, announce it
//! a single block we cannot place       -> ask every peer for its full chain
//! anything else                        -> try to replace the whole chain
//! ```

use crate::core::Block;
use crate::error::{BlockchainError, Result};
use crate::network::{Message, MessageType, Node, Peer};
use log::{info, warn};
use std::sync::Arc;

/// What a `ResponseBlockchain` did to the local chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Received chain was not ahead of ours
    Ignored,
    /// Received head was appended at this index
    Appended(u64),
    /// Only a head arrived; full chains were requested
    RequestedChain,
    /// Local chain was replaced by one of this length
    Replaced(usize),
}

pub struct SyncEngine {
    node: Arc<Node>,
}

impl SyncEngine {
    pub fn new(node: Arc<Node>) -> SyncEngine {
        SyncEngine { node }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Register a freshly connected peer and ask for its head.
    pub fn on_connected(&self, peer: Arc<dyn Peer>) -> Result<()> {
        info!("peer connected: {}", peer.addr());
        self.node.peers().add_peer(Arc::clone(&peer));
        peer.send(&Message::query_latest())
    }

    pub fn on_disconnected(&self, peer: &dyn Peer) {
        self.node.peers().evict_peer(&peer.addr());
        info!("connection closed: {}", peer.addr());
    }

    /// Dispatch one inbound message from `peer`.
    pub fn handle_message(&self, peer: &dyn Peer, message: Message) -> Result<()> {
        match message.message_type {
            MessageType::QueryLatest => {
                let head = self.node.latest_block()?;
                peer.send(&Message::response_block(head))
            }
            MessageType::QueryAll => peer.send(&Message::response_blockchain(self.node.blocks())),
            MessageType::ResponseBlockchain => {
                let blocks = message.blockchain.unwrap_or_default();
                let outcome = self.handle_response_blockchain(blocks)?;
                info!("sync with {} finished: {outcome:?}", peer.addr());
                Ok(())
            }
        }
    }

    /// Reconcile the local chain against blocks reported by a peer.
    pub fn handle_response_blockchain(&self, mut received: Vec<Block>) -> Result<SyncOutcome> {
        received.sort_by_key(Block::get_index);
        let latest_received = received.last().cloned().ok_or(BlockchainError::EmptyChain)?;

        let mut node = self.node.lock();
        let latest_held = node.latest_block()?.clone();

        if latest_received.get_index() <= latest_held.get_index() {
            info!("received blockchain is not longer than current blockchain");
            return Ok(SyncOutcome::Ignored);
        }

        info!(
            "blockchain possibly behind. We got: {}, Peer got: {}",
            latest_held.get_index(),
            latest_received.get_index()
        );

        if appends_to(&latest_received, &latest_held) {
            info!("we can append the received block to our chain");
            let index = latest_received.get_index();
            if let Err(e) = node.add_block(latest_received) {
                warn!("failed to append received block: {e}");
                return Err(e);
            }
            node.broadcast_latest()?;
            Ok(SyncOutcome::Appended(index))
        } else if received.len() == 1 {
            info!("we have to query the chain from our peer");
            node.broadcast(&Message::query_all());
            Ok(SyncOutcome::RequestedChain)
        } else {
            info!("received blockchain is longer than current blockchain");
            let len = received.len();
            node.replace_chain(received)?;
            Ok(SyncOutcome::Replaced(len))
        }
    }
}

/// Whether `received` should be appended directly rather than fetched in full.
///
/// The `hash == previous_hash` arm never holds for a correctly generated
/// block. The second arm is what lets a peer's next block through.
fn appends_to(received: &Block, held: &Block) -> bool {
    received.get_hash() == received.get_previous_hash()
        || received.get_previous_hash() == held.get_hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{
        build_chain, create_test_node, create_test_node_with_chain, RecordingPeer,
    };
    use chrono::Utc;

    #[test]
    fn test_on_connected_registers_and_queries_latest() {
        let (node, _) = create_test_node();
        let engine = SyncEngine::new(node.clone());
        let peer = RecordingPeer::new("10.0.0.2:6001");

        engine.on_connected(peer.clone()).unwrap();

        assert!(node.peers().peer_is_known("10.0.0.2:6001"));
        assert_eq!(peer.sent(), vec![Message::query_latest()]);

        engine.on_disconnected(peer.as_ref());
        assert!(!node.peers().peer_is_known("10.0.0.2:6001"));
    }

    #[test]
    fn test_query_latest_answers_with_head_only() {
        let (node, _) = create_test_node_with_chain(3);
        let engine = SyncEngine::new(node.clone());
        let asker = RecordingPeer::new("10.0.0.3:6001");

        engine
            .handle_message(asker.as_ref(), Message::query_latest())
            .unwrap();

        assert_eq!(
            asker.sent(),
            vec![Message::response_block(node.latest_block().unwrap())]
        );
    }

    #[test]
    fn test_query_all_answers_with_full_chain() {
        let (node, _) = create_test_node_with_chain(3);
        let engine = SyncEngine::new(node.clone());
        let asker = RecordingPeer::new("10.0.0.3:6001");

        engine
            .handle_message(asker.as_ref(), Message::query_all())
            .unwrap();

        assert_eq!(
            asker.sent(),
            vec![Message::response_blockchain(node.blocks())]
        );
    }

    #[test]
    fn test_longer_full_chain_replaces_local() {
        let (node, peer) = create_test_node();
        let engine = SyncEngine::new(node.clone());
        let remote = build_chain(3);

        let outcome = engine.handle_response_blockchain(remote.clone()).unwrap();

        assert_eq!(outcome, SyncOutcome::Replaced(3));
        assert_eq!(node.latest_block().unwrap(), remote[2]);
        assert_eq!(peer.sent(), vec![Message::response_block(remote[2].clone())]);
    }

    #[test]
    fn test_out_of_order_payload_is_sorted_before_use() {
        let (node, _) = create_test_node();
        let engine = SyncEngine::new(node.clone());
        let remote = build_chain(4);
        let shuffled = vec![
            remote[2].clone(),
            remote[0].clone(),
            remote[3].clone(),
            remote[1].clone(),
        ];

        let outcome = engine.handle_response_blockchain(shuffled).unwrap();

        assert_eq!(outcome, SyncOutcome::Replaced(4));
        assert_eq!(node.blocks(), remote);
    }

    #[test]
    fn test_next_block_from_peer_is_appended() {
        let (node, peer) = create_test_node_with_chain(6);
        let engine = SyncEngine::new(node.clone());
        let head = node.latest_block().unwrap();
        assert_eq!(head.get_index(), 5);

        let next = Block::generate_next(&head, "from peer");
        let outcome = engine
            .handle_response_blockchain(vec![next.clone()])
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Appended(6));
        assert_eq!(node.latest_block().unwrap(), next);
        assert_eq!(node.blocks().len(), 7);
        assert_eq!(peer.sent(), vec![Message::response_block(next)]);
    }

    #[test]
    fn test_stale_or_equal_payload_changes_nothing() {
        let (node, peer) = create_test_node_with_chain(4);
        let engine = SyncEngine::new(node.clone());
        let before = node.blocks();

        for len in 1..=4 {
            let outcome = engine.handle_response_blockchain(build_chain(len)).unwrap();
            assert_eq!(outcome, SyncOutcome::Ignored);
        }

        assert_eq!(node.blocks(), before);
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_unplaceable_single_block_requests_full_chain() {
        let (node, peer) = create_test_node();
        let engine = SyncEngine::new(node.clone());
        let remote = build_chain(5);

        let outcome = engine
            .handle_response_blockchain(vec![remote[4].clone()])
            .unwrap();

        assert_eq!(outcome, SyncOutcome::RequestedChain);
        assert_eq!(node.blocks().len(), 1);
        assert_eq!(peer.sent(), vec![Message::query_all()]);
    }

    // Open question: the self-referential `hash == previous_hash` condition is
    // kept as an append trigger. Such a block still has to pass link
    // validation, which it cannot, so the chain is left alone.
    #[test]
    fn test_self_referential_head_takes_append_branch_and_is_rejected() {
        let (node, peer) = create_test_node_with_chain(2);
        let engine = SyncEngine::new(node.clone());
        let before = node.blocks();

        let degenerate = Block::from_parts(
            5,
            "abcd".to_string(),
            Utc::now(),
            "loop".to_string(),
            "abcd".to_string(),
        );
        let result = engine.handle_response_blockchain(vec![degenerate]);

        assert!(matches!(result, Err(BlockchainError::InvalidIndex { .. })));
        assert_eq!(node.blocks(), before);
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_invalid_longer_chain_is_rejected() {
        let (node, peer) = create_test_node();
        let engine = SyncEngine::new(node.clone());
        let mut remote = build_chain(4);
        remote.remove(1);

        let result = engine.handle_response_blockchain(remote);

        assert!(matches!(result, Err(BlockchainError::InvalidChain(_))));
        assert_eq!(node.blocks(), vec![Block::genesis()]);
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_response_without_payload_is_an_error() {
        let (node, _) = create_test_node();
        let engine = SyncEngine::new(node);
        let sender = RecordingPeer::new("10.0.0.9:6001");
        let message = Message {
            message_type: MessageType::ResponseBlockchain,
            blockchain: None,
        };

        assert_eq!(
            engine.handle_message(sender.as_ref(), message),
            Err(BlockchainError::EmptyChain)
        );
    }

    #[test]
    fn test_peer_sync_racing_local_mining_keeps_chain_valid() {
        let (node, _) = create_test_node();
        let engine = Arc::new(SyncEngine::new(node.clone()));
        let remote = build_chain(12);

        let miners: Vec<_> = (0..4)
            .map(|i| {
                let node = Arc::clone(&node);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        node.mine_block(&format!("local {i}-{j}")).unwrap();
                    }
                })
            })
            .collect();

        let syncers: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let remote = remote.clone();
                std::thread::spawn(move || {
                    for j in 0..10 {
                        // results vary with interleaving; only the final chain matters
                        let prefix = remote[..2 + i + j / 2].to_vec();
                        let _ = engine.handle_response_blockchain(prefix);
                        if let Ok(head) = engine.node().latest_block() {
                            let next = Block::generate_next(&head, &format!("peer {i}-{j}"));
                            let _ = engine.handle_response_blockchain(vec![next]);
                        }
                    }
                })
            })
            .collect();

        for handle in miners.into_iter().chain(syncers) {
            handle.join().unwrap();
        }

        let chain = node.blockchain();
        assert!(chain.is_valid().is_ok());
        for (position, block) in chain.blocks().iter().enumerate() {
            assert_eq!(block.get_index(), position as u64);
        }
    }
}
