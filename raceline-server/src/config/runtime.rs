//! Runtime configuration types.
//!
//! These are the validated, ready-to-use forms of the file configuration.
//! The ledger and sync types live in `raceline_core::config` because core
//! components consume them directly.

pub use raceline_core::config::{LedgerConfig, SyncConfig};
use std::net::SocketAddr;

/// Server configuration (listen address).
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}
