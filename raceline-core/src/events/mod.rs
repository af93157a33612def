//! Event system for the ledger synchronization pipeline.
//!
//! # Event Flow
//!
//! 1. `EventListener` polls the ledger for every [`EventKind`] and emits
//!    `LedgerEvent`s in ledger order -> `StateWriter`
//! 2. `StateWriter` re-pulls the affected entity, writes the cache and
//!    publishes a [`Notification`] on the [`NotificationBus`]
//! 3. Transport collaborators (the WebSocket relay) subscribe to the bus
//!
//! Ledger events are idempotent: they carry identifiers rather than full
//! data, and the writer re-fetches from the ledger.

pub mod bus;
pub mod channels;
pub mod types;

pub use bus::{NOTIFICATION_BUFFER, NotificationBus, NotificationReceiver};
pub use channels::{
    DEFAULT_CHANNEL_BUFFER, LedgerEventReceiver, LedgerEventSender, ledger_event_channel,
};
pub use types::{EventKind, LedgerEvent, LedgerEventPayload, Notification};
