//! Ledger connection configuration.

use std::time::Duration;
use url::Url;

/// Default bound on a single ledger call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach the ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the ledger gateway.
    pub rpc_url: Url,
    /// First block the catch-up scan reads.
    pub start_block: u64,
    pub request_timeout: Duration,
}
