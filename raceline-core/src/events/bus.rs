//! In-process change notification bus.

use super::types::Notification;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of each subscriber's backlog before it starts lagging.
pub const NOTIFICATION_BUFFER: usize = 1024;

pub type NotificationReceiver = broadcast::Receiver<Notification>;

/// Publish/subscribe channel for cache mutations.
///
/// Delivery is at-most-once and in-process only. Every subscriber owns its
/// own receiver, so a slow subscriber lags (and is told how many messages it
/// missed) without holding back the publisher or anyone else, and a dropped
/// subscriber simply stops counting.
#[derive(Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { tx }
    }

    /// Publish a notification. Returns how many subscribers it was queued
    /// for; zero subscribers is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        let name = notification.name();
        let race_id = notification.race_id();
        match self.tx.send(notification) {
            Ok(receivers) => {
                trace!(notification = name, race_id, receivers, "Published notification");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> NotificationReceiver {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
