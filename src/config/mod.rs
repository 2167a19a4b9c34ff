//! Configuration management
//!
//! Listen addresses and the initial peer list, read from the environment
//! and overridable from the command line.

pub mod settings;

pub use settings::{Config, DEFAULT_CONTROL_ADDR, DEFAULT_P2P_ADDR, GLOBAL_CONFIG};
