use crate::core::Block;
use crate::error::BlockchainError;
use serde::{Deserialize, Serialize};

/// One request line sent to the control port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Blocks,
    Mine { data: String },
    Peers,
    AddPeer { addr: String },
}

/// Which side of the node a failed request tripped over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Connectivity,
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", content = "body", rename_all = "snake_case")]
pub enum Response {
    Blocks(Vec<Block>),
    Mined(Block),
    Peers(Vec<String>),
    PeerAdded(String),
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn request_error(message: impl Into<String>) -> Response {
        Response::Error {
            kind: ErrorKind::Request,
            message: message.into(),
        }
    }
}

impl From<BlockchainError> for Response {
    fn from(err: BlockchainError) -> Self {
        let kind = if err.is_connectivity() {
            ErrorKind::Connectivity
        } else {
            ErrorKind::Validation
        };
        Response::Error {
            kind,
            message: err.to_string(),
        }
    }
}
