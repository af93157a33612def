//! Event channel factories and handles.

use super::types::LedgerEvent;
use tokio::sync::mpsc;

/// Default buffer size for the ledger event channel.
///
/// Listeners block on a full buffer, which applies back-pressure to ledger
/// polling rather than dropping events.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ledger events (owned by the listener).
pub type LedgerEventSender = mpsc::Sender<LedgerEvent>;
/// Receiver handle for ledger events (owned by the single state writer).
pub type LedgerEventReceiver = mpsc::Receiver<LedgerEvent>;

/// Create a new ledger event channel.
///
/// Returns a (sender, receiver) pair. The `EventListener` owns the sender;
/// the `StateWriter` owns the receiver so that all cache mutations are
/// applied by one task in ledger order.
pub fn ledger_event_channel() -> (LedgerEventSender, LedgerEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
