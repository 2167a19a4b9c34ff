//! Error handling for the chain
//!
//! Validation failures, replacement failures and connection failures all
//! live in one enum so callers can match on the exact cause.

use std::fmt;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Candidate index is not previous index + 1
    InvalidIndex { expected: u64, actual: u64 },
    /// Candidate does not point at the previous block's stored hash
    InvalidPreviousHash { expected: String, actual: String },
    /// Previous block's stored hash is stale
    InvalidHash { calculated: String, recorded: String },
    EmptyChain,
    GenesisMismatch { expected: String, actual: String },
    /// Link `index - 1 -> index` failed validation
    BrokenLink {
        index: usize,
        cause: Box<BlockchainError>,
    },
    /// Candidate chain rejected during replacement
    InvalidChain(Box<BlockchainError>),
    NotLonger { received: usize, current: usize },
    /// Peer sent something that is not a valid message
    Decode(String),
    /// Outbound connection could not be established
    Dial(String),
    Network(String),
    Serialization(String),
    Config(String),
    Io(String),
}

impl BlockchainError {
    /// True for failures caused by the network rather than by block contents.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            BlockchainError::Decode(_)
                | BlockchainError::Dial(_)
                | BlockchainError::Network(_)
                | BlockchainError::Io(_)
        )
    }
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidIndex { expected, actual } => {
                write!(f, "Invalid index: expected {expected}, got {actual}")
            }
            BlockchainError::InvalidPreviousHash { expected, actual } => {
                write!(f, "Invalid previous hash: expected {expected}, got {actual}")
            }
            BlockchainError::InvalidHash {
                calculated,
                recorded,
            } => {
                write!(
                    f,
                    "Invalid hash: calculated={calculated} recorded={recorded}"
                )
            }
            BlockchainError::EmptyChain => write!(f, "Chain is empty"),
            BlockchainError::GenesisMismatch { expected, actual } => {
                write!(
                    f,
                    "Genesis block mismatch: expected {expected}, got {actual}"
                )
            }
            BlockchainError::BrokenLink { index, cause } => {
                write!(
                    f,
                    "Invalid block between {} -> {index}: {cause}",
                    index.saturating_sub(1)
                )
            }
            BlockchainError::InvalidChain(cause) => write!(f, "Invalid chain: {cause}"),
            BlockchainError::NotLonger { received, current } => {
                write!(
                    f,
                    "Received chain is not longer: received {received}, current {current}"
                )
            }
            BlockchainError::Decode(msg) => write!(f, "Decode error: {msg}"),
            BlockchainError::Dial(msg) => write!(f, "Dial error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
