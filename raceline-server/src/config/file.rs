//! TOML file configuration structures.
//!
//! These structs directly map to the `raceline-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Ledger connection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint. Overridden by `RACELINE_LEDGER_URL`.
    pub rpc_url: String,
    /// First block of the startup catch-up scan.
    #[serde(default)]
    pub start_block: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Synchronizer section. Reloaded on SIGHUP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Ceiling of the adaptive poll interval, in seconds.
    #[serde(default = "default_max_poll_interval_secs")]
    pub max_poll_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_poll_interval_secs: default_max_poll_interval_secs(),
        }
    }
}

fn default_max_poll_interval_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[ledger]
rpc_url = "http://127.0.0.1:8545"
start_block = 1200
request_timeout_secs = 5

[sync]
max_poll_interval_secs = 4
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.ledger.start_block, 1200);
        assert_eq!(config.ledger.request_timeout_secs, 5);
        assert_eq!(config.sync.max_poll_interval_secs, 4);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
[ledger]
rpc_url = "https://ledger.example.com/rpc"
"#,
        )
        .unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.ledger.start_block, 0);
        assert_eq!(config.ledger.request_timeout_secs, 30);
        assert_eq!(config.sync.max_poll_interval_secs, 10);
    }

    #[test]
    fn test_ledger_section_is_required() {
        assert!(toml::from_str::<FileConfig>("[server]\nlisten = \"127.0.0.1:3000\"\n").is_err());
    }
}
