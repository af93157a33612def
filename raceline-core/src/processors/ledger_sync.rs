//! LedgerSync: startup catch-up and the live synchronization tasks.
//!
//! Startup runs in two phases:
//! 1. [`LedgerSync::catch_up`] scans `RaceCreated` events from the configured
//!    start block to the current head and installs every race. Any failure
//!    here is fatal to the caller.
//! 2. [`LedgerSync::spawn_listeners`] starts the `EventListener` from
//!    `head + 1` and the single `StateWriter` it feeds.

use super::{EventListener, StateWriter};
use crate::cache::StateCache;
use crate::config::{ConfigStore, SyncConfig};
use crate::events::{EventKind, NotificationBus, ledger_event_channel};
use crate::ledger::{Ledger, LedgerError};
use crate::market::MarketEngine;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors that abort the catch-up scan.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("catch-up could not read the chain head: {0}")]
    Head(#[source] LedgerError),

    #[error("catch-up could not query events in blocks {from_block}..={to_block}: {source}")]
    Events {
        from_block: u64,
        to_block: u64,
        #[source]
        source: LedgerError,
    },

    #[error("catch-up could not pull race {race_id}: {source}")]
    Race {
        race_id: u64,
        #[source]
        source: LedgerError,
    },
}

/// What the catch-up scan covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchUpReport {
    pub from_block: u64,
    /// Chain head at the time of the scan. Live listeners continue after it.
    pub head: u64,
    pub races: usize,
}

impl CatchUpReport {
    /// First block the live listeners should query.
    pub fn next_block(&self) -> u64 {
        self.head.saturating_add(1).max(self.from_block)
    }
}

pub struct LedgerSync {
    engine: MarketEngine,
    bus: NotificationBus,
    ledger: Arc<dyn Ledger>,
    start_block: u64,
}

impl LedgerSync {
    pub fn new(engine: MarketEngine, bus: NotificationBus, start_block: u64) -> Self {
        let ledger = Arc::clone(&engine.cache().processor().ledger);
        Self {
            engine,
            bus,
            ledger,
            start_block,
        }
    }

    fn cache(&self) -> &StateCache {
        self.engine.cache()
    }

    /// Install every race created between the start block and the head.
    pub async fn catch_up(&self) -> Result<CatchUpReport, SyncError> {
        let head = self.ledger.block_number().await.map_err(SyncError::Head)?;
        let from_block = self.start_block;
        info!(from_block, head, "Starting ledger catch-up");

        if head < from_block {
            info!(
                from_block,
                head,
                "Start block is ahead of the chain head, nothing to catch up"
            );
            return Ok(CatchUpReport {
                from_block,
                head,
                races: 0,
            });
        }

        let events = self
            .ledger
            .query_events(EventKind::RaceCreated, from_block, head)
            .await
            .map_err(|source| SyncError::Events {
                from_block,
                to_block: head,
                source,
            })?;
        debug!(count = events.len(), "Catch-up found RaceCreated events");

        let mut races = 0;
        for event in events {
            let race_id = event.race_id();
            self.cache()
                .pull(race_id)
                .await
                .map_err(|source| SyncError::Race { race_id, source })?;
            races += 1;
        }

        info!(races, head, "Ledger catch-up complete");
        Ok(CatchUpReport {
            from_block,
            head,
            races,
        })
    }

    /// Start the live listeners and the state writer.
    ///
    /// Every task stops when `shutdown_rx` flips to `true`.
    pub fn spawn_listeners(
        self,
        report: &CatchUpReport,
        shutdown_rx: watch::Receiver<bool>,
        sync_config: ConfigStore<SyncConfig>,
    ) -> Vec<JoinHandle<()>> {
        let from_block = report.next_block();
        let (event_tx, event_rx) = ledger_event_channel();

        // The writer's channel closes once the listener is gone.
        let listener = EventListener::new(Arc::clone(&self.ledger), from_block, event_tx);
        let writer = StateWriter::new(self.engine, self.bus);

        let handles = vec![
            tokio::spawn(listener.run(
                shutdown_rx.clone(),
                sync_config.clone(),
                sync_config.subscribe(),
            )),
            tokio::spawn(writer.run(shutdown_rx, event_rx)),
        ];

        info!(from_block, tasks = handles.len(), "Ledger synchronization running");
        handles
    }
}
