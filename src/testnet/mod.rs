//! Test fixtures shared by the unit tests
//!
//! In-memory peers that record what they were sent, and helpers for
//! building valid chains of a given length.

pub mod test_utils;

pub use test_utils::*;
