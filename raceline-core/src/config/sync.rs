//! Runtime-reloadable synchronizer settings.

use std::time::Duration;

/// Default ceiling for the adaptive poll interval.
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Settings the event listeners re-read whenever the surrounding
/// [`ConfigStore`](super::ConfigStore) changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Upper bound for the idle poll interval of each listener.
    pub max_poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
        }
    }
}
