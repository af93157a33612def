//! StateWriter processor.
//!
//! The StateWriter is the only task that applies ledger events to the
//! cache. It is responsible for:
//! - Receiving `LedgerEvent`s from the `EventListener`
//! - Re-pulling the affected race or pool and writing it to the cache
//! - Recording odds snapshots after pool changes
//! - Publishing a [`Notification`] for every applied change
//!
//! Events are applied one at a time in arrival order. A failed event is
//! logged and dropped; the loop keeps going.
//!
//! `raceFinished` is published once per race. A race pulled from the ledger
//! may already be finished (a lazy pull, or a `RaceCreated` re-pull in the
//! same poll as its finish); its `RaceFinished` event is still announced.

use crate::cache::StateCache;
use crate::entities::{BettingPool, RaceId};
use crate::events::{
    LedgerEvent, LedgerEventPayload, LedgerEventReceiver, Notification, NotificationBus,
};
use crate::ledger::LedgerError;
use crate::market::MarketEngine;
use dashmap::DashSet;
use kanau::processor::Processor;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct StateWriter {
    cache: StateCache,
    engine: MarketEngine,
    bus: NotificationBus,
    /// Races whose `raceFinished` has gone out.
    finish_published: DashSet<RaceId>,
}

impl StateWriter {
    pub fn new(engine: MarketEngine, bus: NotificationBus) -> Self {
        Self {
            cache: engine.cache().clone(),
            engine,
            bus,
            finish_published: DashSet::new(),
        }
    }

    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut event_rx: LedgerEventReceiver,
    ) {
        info!("StateWriter started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("StateWriter received shutdown signal");
                        break;
                    }
                }

                Some(event) = event_rx.recv() => {
                    let race_id = event.race_id();
                    let kind = event.kind();
                    if let Err(e) = self.process(event).await {
                        error!(
                            %kind,
                            race_id,
                            error = %e,
                            "Failed to apply ledger event, dropping it"
                        );
                    }
                }

                else => {
                    info!("Ledger event channel closed");
                    break;
                }
            }
        }

        info!("StateWriter shutdown complete");
    }

    /// Pull the pool (and the race, if missing), then snapshot the odds.
    async fn refresh_pool(&self, race_id: RaceId) -> Result<Arc<BettingPool>, LedgerError> {
        let pool = self.cache.pull_pool(race_id).await?;
        self.engine.record_snapshot(race_id);
        Ok(pool)
    }
}

impl Processor<LedgerEvent> for StateWriter {
    /// `None` when the event changed nothing (a repeated finish).
    type Output = Option<Notification>;
    type Error = LedgerError;
    #[tracing::instrument(
        skip_all,
        name = "StateWriter:LedgerEvent",
        fields(block = event.block_number)
    )]
    async fn process(&self, event: LedgerEvent) -> Result<Option<Notification>, LedgerError> {
        let notification = match event.payload {
            LedgerEventPayload::RaceCreated { race_id } => {
                Notification::RaceCreated(self.cache.pull(race_id).await?)
            }
            LedgerEventPayload::RaceFinished {
                race_id,
                winner_token_id,
            } => {
                if self.finish_published.contains(&race_id) {
                    debug!(race_id, "Race finish already published, ignoring event");
                    return Ok(None);
                }
                let race = self.cache.get_or_pull(race_id).await?;
                // A record that is already finished keeps the ledger's winner.
                let finished = race.finish(winner_token_id, OffsetDateTime::now_utc());
                let race = self.cache.put(finished);
                self.finish_published.insert(race_id);
                Notification::RaceFinished(race)
            }
            LedgerEventPayload::BetPlaced { race_id } => {
                Notification::BettingUpdated(self.refresh_pool(race_id).await?)
            }
            LedgerEventPayload::BettingPoolSettled { race_id } => {
                Notification::BettingSettled(self.refresh_pool(race_id).await?)
            }
        };

        debug!(
            notification = notification.name(),
            race_id = notification.race_id(),
            "Applied ledger event"
        );
        self.bus.publish(notification.clone());
        Ok(Some(notification))
    }
}
