//! # naivechain
//!
//! A hash-linked, append-only ledger replicated across manually connected
//! peers. Each node keeps its chain in memory and converges with its peers
//! through a three-message gossip protocol; the longest valid chain wins.
//!
//! ## Layout
//! - `core/`: blocks, the chain, validation rules
//! - `network/`: the chain-owning node, peer registry, wire message, sync engine, P2P server
//! - `control/`: request/response interface for reading the chain, mining and managing peers
//! - `config/`: listen addresses and startup peers
//! - `cli/`: command-line entry points
//!
//! ## Peer protocol
//! Every message is one JSON document `{"message_type": 1|2|3, "blockchain": [...]}`:
//! 1 asks for the head, 2 asks for the whole chain, 3 carries blocks.
//! A new connection starts by asking for the head; whoever learns it is
//! behind either appends, asks for more, or replaces its chain.

pub mod cli;
pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use control::{send_request, ControlServer, ErrorKind, Request, Response};
pub use core::{Block, Blockchain, GENESIS_HASH};
pub use error::{BlockchainError, Result};
pub use network::{Message, MessageType, Node, Peer, Peers, Server, SyncEngine, SyncOutcome};
pub use utils::sha256_hex;
