//! Configuration types for Raceline.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod config_store;
mod ledger;
mod sync;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use ledger::{DEFAULT_REQUEST_TIMEOUT, LedgerConfig};
pub use sync::{DEFAULT_MAX_POLL_INTERVAL, SyncConfig};
