//! Command-line interface
//!
//! Starting a node and talking to a running one.

pub mod commands;

pub use commands::{Command, Opt};
