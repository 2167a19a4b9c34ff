//! Utility functions and helpers
//!
//! Hashing helpers shared by the block model.

pub mod crypto;

pub use crypto::sha256_hex;
