//! Control interface
//!
//! The request/response surface collaborators use to read the chain, mine
//! blocks and manage peers on a running node.

pub mod request;
pub mod server;

pub use request::{ErrorKind, Request, Response};
pub use server::{send_request, ControlServer};
