//! In-memory state cache of races and betting pools.
//!
//! Entries are replaced whole: every value is an `Arc` that is swapped out on
//! write, so a reader holding one never observes a half-applied update.
//! Reads are lock-free apart from the shard lock inside `DashMap` and never
//! touch the network, except through the `get_or_pull*` accessors.

use crate::entities::{BettingPool, Race, RaceId};
use crate::framework::{LedgerProcessor, PullBettingPool, PullRace};
use crate::ledger::{Ledger, LedgerError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use itertools::Itertools;
use kanau::processor::Processor;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to the cache. Cloning is cheap.
#[derive(Clone)]
pub struct StateCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    races: DashMap<RaceId, Arc<Race>>,
    pools: DashMap<RaceId, Arc<BettingPool>>,
    processor: LedgerProcessor,
}

impl StateCache {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                races: DashMap::new(),
                pools: DashMap::new(),
                processor: LedgerProcessor { ledger },
            }),
        }
    }

    pub fn processor(&self) -> &LedgerProcessor {
        &self.inner.processor
    }

    pub fn get(&self, race_id: RaceId) -> Option<Arc<Race>> {
        self.inner.races.get(&race_id).map(|entry| Arc::clone(&entry))
    }

    /// Install or replace a race. A finished race stays finished.
    pub fn put(&self, race: Race) -> Arc<Race> {
        match self.inner.races.entry(race.race_id) {
            Entry::Occupied(mut entry) => {
                let merged = Arc::new(race.reconcile(Some(entry.get().as_ref())));
                entry.insert(Arc::clone(&merged));
                merged
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(race)).value()),
        }
    }

    pub fn get_pool(&self, race_id: RaceId) -> Option<Arc<BettingPool>> {
        self.inner.pools.get(&race_id).map(|entry| Arc::clone(&entry))
    }

    /// Install or replace a pool. A settled pool stays settled.
    pub fn put_pool(&self, pool: BettingPool) -> Arc<BettingPool> {
        match self.inner.pools.entry(pool.race_id) {
            Entry::Occupied(mut entry) => {
                let merged = Arc::new(pool.reconcile(Some(entry.get().as_ref())));
                entry.insert(Arc::clone(&merged));
                merged
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(pool)).value()),
        }
    }

    /// Every cached race, most recent `start_time` first.
    pub fn list_all(&self) -> Vec<Arc<Race>> {
        self.inner
            .races
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .sorted_by_key(|race| (Reverse(race.start_time), Reverse(race.race_id)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.races.is_empty()
    }

    /// Pull a race from the ledger and install it.
    ///
    /// On failure the cached value, if any, is left in place.
    pub async fn pull(&self, race_id: RaceId) -> Result<Arc<Race>, LedgerError> {
        let race = self.inner.processor.process(PullRace { race_id }).await?;
        debug!(race_id, status = ?race.status, "Pulled race from ledger");
        Ok(self.put(race))
    }

    /// Pull the betting pool of a race and install it. The race itself is
    /// pulled first when it is not cached yet.
    pub async fn pull_pool(&self, race_id: RaceId) -> Result<Arc<BettingPool>, LedgerError> {
        let race = self.get_or_pull(race_id).await?;
        let pool = self
            .inner
            .processor
            .process(PullBettingPool {
                race_id,
                participants: race.participant_token_ids.clone(),
            })
            .await?;
        debug!(race_id, total_pool = %pool.total_pool, "Pulled betting pool from ledger");
        Ok(self.put_pool(pool))
    }

    pub async fn get_or_pull(&self, race_id: RaceId) -> Result<Arc<Race>, LedgerError> {
        match self.get(race_id) {
            Some(race) => Ok(race),
            None => self.pull(race_id).await,
        }
    }

    pub async fn get_or_pull_pool(&self, race_id: RaceId) -> Result<Arc<BettingPool>, LedgerError> {
        match self.get_pool(race_id) {
            Some(pool) => Ok(pool),
            None => self.pull_pool(race_id).await,
        }
    }
}
