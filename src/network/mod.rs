//! Peer-to-peer networking
//!
//! The node that owns the chain, the registry of connected peers, the wire
//! message, and the sync engine that keeps replicas converging.

pub mod message;
pub mod node;
pub mod peers;
pub mod server;
pub mod sync;

pub use message::{Message, MessageType};
pub use node::{Node, NodeGuard};
pub use peers::{Peer, Peers, TcpPeer};
pub use server::Server;
pub use sync::{SyncEngine, SyncOutcome};
