//! Ledger synchronization processors.
//!
//! - `LedgerSync`: catch-up scan at startup, then spawns the tasks below
//! - `EventListener`: polls the ledger for every event kind, emits `LedgerEvent` in ledger order
//! - `StateWriter`: receives `LedgerEvent`, updates the cache, publishes `Notification`

pub mod event_listener;
pub mod ledger_sync;
pub mod state_writer;

pub use event_listener::{EventListener, ListenerError};
pub use ledger_sync::{CatchUpReport, LedgerSync, SyncError};
pub use state_writer::StateWriter;
