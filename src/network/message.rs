use crate::core::Block;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric tag carried in `message_type` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageType {
    QueryLatest = 1,
    QueryAll = 2,
    ResponseBlockchain = 3,
}

impl TryFrom<u8> for MessageType {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::QueryLatest),
            2 => Ok(MessageType::QueryAll),
            3 => Ok(MessageType::ResponseBlockchain),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::QueryLatest => write!(f, "query_latest"),
            MessageType::QueryAll => write!(f, "query_all"),
            MessageType::ResponseBlockchain => write!(f, "response_blockchain"),
        }
    }
}

/// Peer protocol envelope: `{ "message_type": 1|2|3, "blockchain": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<Vec<Block>>,
}

impl Message {
    pub fn query_latest() -> Message {
        Message {
            message_type: MessageType::QueryLatest,
            blockchain: None,
        }
    }

    pub fn query_all() -> Message {
        Message {
            message_type: MessageType::QueryAll,
            blockchain: None,
        }
    }

    pub fn response_blockchain(blocks: Vec<Block>) -> Message {
        Message {
            message_type: MessageType::ResponseBlockchain,
            blockchain: Some(blocks),
        }
    }

    /// Single-block response, used for head announcements
    pub fn response_block(block: Block) -> Message {
        Self::response_blockchain(vec![block])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{}", self.message_type),
        }
    }
}
