//! Configuration module for raceline-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{LedgerConfig, ServerConfig, SyncConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable overriding `ledger.rpc_url`.
pub const LEDGER_URL_ENV: &str = "RACELINE_LEDGER_URL";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid ledger url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub sync: SyncConfig,
}

/// CLI values that take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub start_block: Option<u64>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply the environment and CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the runtime configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let ledger_url = std::env::var(LEDGER_URL_ENV).ok();
        self.load_from_str(&config_content, ledger_url)
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Only the `sync` part of the result is applied to a running server.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_from_str(
        &self,
        content: &str,
        ledger_url: Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(url) = ledger_url.filter(|url| !url.trim().is_empty()) {
            file_config.ledger.rpc_url = url;
        }
        if let Some(listen) = self.overrides.listen {
            file_config.server.listen = listen;
        }
        if let Some(start_block) = self.overrides.start_block {
            file_config.ledger.start_block = start_block;
        }

        let rpc_url = self.validate(&file_config)?;
        Ok(build_loaded_config(file_config, rpc_url))
    }

    fn validate(&self, config: &FileConfig) -> Result<Url, ConfigError> {
        let rpc_url = Url::parse(config.ledger.rpc_url.trim())?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "ledger.rpc_url must use http or https, got {}",
                rpc_url.scheme()
            )));
        }
        if config.ledger.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ledger.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if config.sync.max_poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sync.max_poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(rpc_url)
    }
}

fn build_loaded_config(file_config: FileConfig, rpc_url: Url) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        ledger: LedgerConfig {
            rpc_url,
            start_block: file_config.ledger.start_block,
            request_timeout: Duration::from_secs(file_config.ledger.request_timeout_secs),
        },
        sync: SyncConfig {
            max_poll_interval: Duration::from_secs(file_config.sync.max_poll_interval_secs),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[server]
listen = "127.0.0.1:3000"

[ledger]
rpc_url = "http://127.0.0.1:8545"
start_block = 50

[sync]
max_poll_interval_secs = 6
"#;

    fn loader(overrides: Overrides) -> ConfigLoader {
        ConfigLoader::new("./raceline-config.toml", overrides)
    }

    #[test]
    fn test_load_builds_runtime_config() {
        let loaded = loader(Overrides::default()).load_from_str(CONFIG, None).unwrap();
        assert_eq!(loaded.server.listen.port(), 3000);
        assert_eq!(loaded.ledger.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(loaded.ledger.start_block, 50);
        assert_eq!(loaded.ledger.request_timeout, Duration::from_secs(30));
        assert_eq!(loaded.sync.max_poll_interval, Duration::from_secs(6));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = Overrides {
            listen: Some(SocketAddr::from(([127, 0, 0, 1], 9000))),
            start_block: Some(7),
        };
        let loaded = loader(overrides)
            .load_from_str(CONFIG, Some("https://ledger.example.com/rpc".to_string()))
            .unwrap();
        assert_eq!(loaded.server.listen.port(), 9000);
        assert_eq!(loaded.ledger.start_block, 7);
        assert_eq!(loaded.ledger.rpc_url.host_str(), Some("ledger.example.com"));
    }

    #[test]
    fn test_rejects_non_http_ledger_url() {
        let result = loader(Overrides::default())
            .load_from_str(CONFIG, Some("ws://127.0.0.1:8546".to_string()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result =
            loader(Overrides::default()).load_from_str(CONFIG, Some("not a url".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let content = CONFIG.replace("max_poll_interval_secs = 6", "max_poll_interval_secs = 0");
        let result = loader(Overrides::default()).load_from_str(&content, None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result =
            ConfigLoader::new("/nonexistent/raceline-config.toml", Overrides::default()).load();
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
