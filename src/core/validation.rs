//! Block and chain validation rules
//!
//! Every check is pure and stops at the first failure.

use crate::core::block::{Block, GENESIS_HASH};
use crate::error::{BlockchainError, Result};

/// Check that `candidate` may follow `previous`.
pub fn validate_new_block(candidate: &Block, previous: &Block) -> Result<()> {
    let expected_index = previous.get_index() + 1;
    if candidate.get_index() != expected_index {
        return Err(BlockchainError::InvalidIndex {
            expected: expected_index,
            actual: candidate.get_index(),
        });
    }

    if candidate.get_previous_hash() != previous.get_hash() {
        return Err(BlockchainError::InvalidPreviousHash {
            expected: previous.get_hash().to_string(),
            actual: candidate.get_previous_hash().to_string(),
        });
    }

    // The stored hash of `previous` may itself be stale.
    let calculated = previous.recompute_hash();
    if calculated != candidate.get_previous_hash() {
        return Err(BlockchainError::InvalidHash {
            calculated,
            recorded: candidate.get_previous_hash().to_string(),
        });
    }

    let own = candidate.recompute_hash();
    if own != candidate.get_hash() {
        return Err(BlockchainError::InvalidHash {
            calculated: own,
            recorded: candidate.get_hash().to_string(),
        });
    }

    Ok(())
}

pub fn is_valid_new_block(candidate: &Block, previous: &Block) -> bool {
    validate_new_block(candidate, previous).is_ok()
}

/// Check a whole block sequence: canonical genesis first, then every link.
pub fn validate_chain(blocks: &[Block]) -> Result<()> {
    let first = blocks.first().ok_or(BlockchainError::EmptyChain)?;

    // Compare recomputed hashes so a genesis with a forged stored hash is rejected too.
    let genesis_hash = first.recompute_hash();
    if genesis_hash != GENESIS_HASH {
        return Err(BlockchainError::GenesisMismatch {
            expected: GENESIS_HASH.to_string(),
            actual: genesis_hash,
        });
    }

    for (index, pair) in blocks.windows(2).enumerate() {
        validate_new_block(&pair[1], &pair[0]).map_err(|cause| BlockchainError::BrokenLink {
            index: index + 1,
            cause: Box::new(cause),
        })?;
    }

    Ok(())
}
