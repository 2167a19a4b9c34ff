use crate::error::Result;
use crate::utils::sha256_hex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GENESIS_INDEX: u64 = 0;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_TIMESTAMP: i64 = 1465154705;
pub const GENESIS_DATA: &str = "my genesis block!!";
pub const GENESIS_HASH: &str = "816534932c2b7154836da6afc367695e6337db8a921823784c14378abed4f7d7";

/// One immutable, hash-linked unit of the ledger.
///
/// Fields are private: a block is built once (mined, genesis or decoded from
/// a peer) and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    previous_hash: String,
    timestamp: DateTime<Utc>,
    data: String,
    hash: String,
}

/// SHA-256 over `index || previous_hash || unix_seconds || data`, lowercase hex.
///
/// Sub-second precision of `timestamp` does not reach the digest.
pub fn calculate_hash(
    index: u64,
    previous_hash: &str,
    timestamp: &DateTime<Utc>,
    data: &str,
) -> String {
    let payload = format!("{index}{previous_hash}{}{data}", timestamp.timestamp());
    sha256_hex(payload.as_bytes())
}

impl Block {
    /// The canonical first block every valid chain starts with.
    pub fn genesis() -> Block {
        Block {
            index: GENESIS_INDEX,
            previous_hash: String::from(GENESIS_PREVIOUS_HASH),
            timestamp: DateTime::<Utc>::from_timestamp(GENESIS_TIMESTAMP, 0).unwrap_or_default(),
            data: String::from(GENESIS_DATA),
            hash: String::from(GENESIS_HASH),
        }
    }

    /// Build the successor of `previous` carrying `data`, stamped now.
    pub fn generate_next(previous: &Block, data: &str) -> Block {
        Self::generate_next_at(previous, data, Utc::now())
    }

    pub fn generate_next_at(previous: &Block, data: &str, timestamp: DateTime<Utc>) -> Block {
        let index = previous.index + 1;
        let hash = calculate_hash(index, &previous.hash, &timestamp, data);
        Block {
            index,
            previous_hash: previous.hash.clone(),
            timestamp,
            data: data.to_string(),
            hash,
        }
    }

    /// Assemble a block from raw fields without recomputing anything.
    ///
    /// Used for blocks that arrive from elsewhere; validation decides later
    /// whether the stored hash can be trusted.
    pub fn from_parts(
        index: u64,
        previous_hash: String,
        timestamp: DateTime<Utc>,
        data: String,
        hash: String,
    ) -> Block {
        Block {
            index,
            previous_hash,
            timestamp,
            data,
            hash,
        }
    }

    pub fn recompute_hash(&self) -> String {
        calculate_hash(self.index, &self.previous_hash, &self.timestamp, &self.data)
    }

    pub fn is_hash_consistent(&self) -> bool {
        self.recompute_hash() == self.hash
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(json: &str) -> Result<Block> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get_data(&self) -> &str {
        self.data.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }
}
