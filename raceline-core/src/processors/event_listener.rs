//! EventListener processor.
//!
//! A single EventListener follows every [`EventKind`]. It is responsible for:
//! - Polling the ledger for new events on an adaptive interval
//! - Merging the kinds of one block range into ledger order
//! - Forwarding them to the `StateWriter`
//! - Advancing its block cursor past the head it observed
//! - Picking up a new poll interval cap when the `SyncConfig` is reloaded
//!
//! All kinds share one cursor, so a `BettingPoolSettled` can never overtake
//! the `BetPlaced` logged before it.

use crate::config::{ConfigStore, ConfigWatcher, SyncConfig};
use crate::events::{EventKind, LedgerEvent, LedgerEventSender};
use crate::ledger::{Ledger, LedgerError};
use crate::utils::polling_interval::polling_freq;
use itertools::Itertools;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The `StateWriter` is gone; nothing left to forward to
    #[error("ledger event channel closed")]
    ChannelClosed,
}

pub struct EventListener {
    ledger: Arc<dyn Ledger>,
    /// Next block to query.
    cursor: u64,
    last_event_at: OffsetDateTime,
    event_tx: LedgerEventSender,
}

impl EventListener {
    pub fn new(ledger: Arc<dyn Ledger>, from_block: u64, event_tx: LedgerEventSender) -> Self {
        Self {
            ledger,
            cursor: from_block,
            last_event_at: OffsetDateTime::now_utc(),
            event_tx,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Every event of every kind in `[from_block, to_block]`, ordered by
    /// block number and then log index.
    async fn fetch_range(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut batches = Vec::with_capacity(EventKind::ALL.len());
        for kind in EventKind::ALL {
            batches.push(self.ledger.query_events(kind, from_block, to_block).await?);
        }
        Ok(batches
            .into_iter()
            .flatten()
            .sorted_by_key(|event| (event.block_number, event.log_index))
            .collect())
    }

    /// Query `[cursor, head]` once and forward what was found.
    ///
    /// The cursor only moves after every event of the range was handed to
    /// the channel, so a failed poll is retried from the same block.
    pub async fn poll_once(&mut self) -> Result<usize, ListenerError> {
        let head = self.ledger.block_number().await?;
        if head < self.cursor {
            return Ok(0);
        }

        let events = self.fetch_range(self.cursor, head).await?;
        let forwarded = events.len();
        for event in events {
            self.event_tx
                .send(event)
                .await
                .map_err(|_| ListenerError::ChannelClosed)?;
        }

        self.cursor = head + 1;
        if forwarded > 0 {
            self.last_event_at = OffsetDateTime::now_utc();
        }
        Ok(forwarded)
    }

    /// Run until shutdown is signaled or the `StateWriter` goes away.
    pub async fn run(
        mut self,
        mut shutdown_rx: watch::Receiver<bool>,
        config_store: ConfigStore<SyncConfig>,
        mut config_watcher: ConfigWatcher,
    ) {
        let mut max_poll_interval = config_store.get().await.max_poll_interval;
        info!(from_block = self.cursor, "EventListener started");

        loop {
            let interval = polling_freq(
                self.last_event_at,
                OffsetDateTime::now_utc(),
                max_poll_interval,
            );

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("EventListener received shutdown signal");
                        break;
                    }
                }

                Ok(()) = config_watcher.changed() => {
                    max_poll_interval = config_store.get().await.max_poll_interval;
                    info!(?max_poll_interval, "EventListener picked up new sync config");
                }

                _ = tokio::time::sleep(interval) => {
                    match self.poll_once().await {
                        Ok(0) => {}
                        Ok(count) => debug!(count, cursor = self.cursor, "Forwarded ledger events"),
                        Err(ListenerError::ChannelClosed) => {
                            warn!("Ledger event channel closed, stopping listener");
                            break;
                        }
                        Err(e) => warn!(
                            cursor = self.cursor,
                            error = %e,
                            "Ledger poll failed, will retry"
                        ),
                    }
                }
            }
        }

        info!("EventListener shutdown complete");
    }
}
