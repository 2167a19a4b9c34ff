//! Core chain functionality
//!
//! Blocks, the chain that orders them, and the rules that decide whether a
//! block or a whole chain is acceptable.

pub mod block;
pub mod blockchain;
pub mod validation;

pub use block::{calculate_hash, Block, GENESIS_HASH};
pub use blockchain::Blockchain;
pub use validation::{is_valid_new_block, validate_chain, validate_new_block};
