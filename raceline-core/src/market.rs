//! Implied-probability markets, odds history and dashboard aggregates.

use crate::cache::StateCache;
use crate::entities::{BettingPool, BoundedHistory, OddsHistoryEntry, Race, RaceId, TokenId};
use crate::framework::GetLedgerOdds;
use crate::ledger::LedgerError;
use dashmap::DashMap;
use kanau::processor::Processor;
use raceline_sdk::objects::{DashboardResponse, MarketResponse, RaceWithPoolResponse};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Snapshots kept per race before the oldest is evicted.
pub const ODDS_HISTORY_CAPACITY: usize = 500;

/// Market of one race entrant.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub token_id: TokenId,
    pub is_bot: bool,
    pub bet_total_wei: Decimal,
    /// Percent, rounded to two decimal places.
    pub implied_probability: f64,
}

impl From<&Market> for MarketResponse {
    fn from(market: &Market) -> Self {
        MarketResponse {
            token_id: market.token_id,
            is_bot: market.is_bot,
            bet_total_wei: market.bet_total_wei,
            implied_probability: market.implied_probability,
        }
    }
}

/// Markets of every participant, in participant order.
///
/// An absent or empty pool is fully uncertain: every entrant reports 100.
pub fn compute_market(race: &Race, pool: Option<&BettingPool>) -> Vec<Market> {
    let total = pool
        .map(|pool| pool.total_pool)
        .filter(|total| *total > Decimal::ZERO);

    race.participant_token_ids
        .iter()
        .map(|&token_id| {
            let bet_total_wei = pool.map(|p| p.bet_on(token_id)).unwrap_or(Decimal::ZERO);
            let implied_probability = match total {
                Some(total) => bet_total_wei
                    .checked_div(total)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .map(|percent| percent.round_dp(2))
                    .and_then(|percent| percent.to_f64())
                    .unwrap_or_default(),
                None => 100.0,
            };
            Market {
                token_id,
                is_bot: race.is_bot(token_id),
                bet_total_wei,
                implied_probability,
            }
        })
        .collect()
}

/// A cached race together with its pool, if one could be obtained.
#[derive(Debug, Clone)]
pub struct RaceWithPool {
    pub race: Arc<Race>,
    pub pool: Option<Arc<BettingPool>>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_races: usize,
    pub active_races: usize,
    pub finished_races: usize,
    pub races: Vec<RaceWithPool>,
}

impl From<&Dashboard> for DashboardResponse {
    fn from(dashboard: &Dashboard) -> Self {
        DashboardResponse {
            total_races: dashboard.total_races,
            active_races: dashboard.active_races,
            finished_races: dashboard.finished_races,
            races: dashboard
                .races
                .iter()
                .map(|entry| RaceWithPoolResponse {
                    race: entry.race.as_ref().into(),
                    betting_pool: entry.pool.as_deref().map(Into::into),
                })
                .collect(),
        }
    }
}

/// Derived views over the [`StateCache`].
///
/// Holds the odds history, which is the only state not rebuilt from the
/// ledger: it only grows from snapshots recorded while the service runs.
#[derive(Clone)]
pub struct MarketEngine {
    cache: StateCache,
    history: Arc<DashMap<RaceId, BoundedHistory<OddsHistoryEntry>>>,
}

impl MarketEngine {
    pub fn new(cache: StateCache) -> Self {
        Self {
            cache,
            history: Arc::new(DashMap::new()),
        }
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub async fn markets(&self, race_id: RaceId) -> Result<Vec<Market>, LedgerError> {
        let race = self.cache.get_or_pull(race_id).await?;
        let pool = self.cache.get_or_pull_pool(race_id).await?;
        Ok(compute_market(&race, Some(&pool)))
    }

    /// The market of one entrant. `Ok(None)` when the token does not run in
    /// this race.
    pub async fn market(
        &self,
        race_id: RaceId,
        token_id: TokenId,
    ) -> Result<Option<Market>, LedgerError> {
        let markets = self.markets(race_id).await?;
        Ok(markets.into_iter().find(|market| market.token_id == token_id))
    }

    /// The ledger's own odds figure. Failures are logged and reported as
    /// `None`.
    pub async fn ledger_odds(&self, race_id: RaceId, token_id: TokenId) -> Option<u64> {
        match self
            .cache
            .processor()
            .process(GetLedgerOdds { race_id, token_id })
            .await
        {
            Ok(odds) => Some(odds),
            Err(e) => {
                warn!(race_id, token_id, error = %e, "Failed to read ledger odds");
                None
            }
        }
    }

    /// Append a snapshot of the current markets to the race's history.
    ///
    /// Works only from cached state. Returns `false` (and records nothing)
    /// when the race or its pool is not cached.
    pub fn record_snapshot(&self, race_id: RaceId) -> bool {
        let (Some(race), Some(pool)) = (self.cache.get(race_id), self.cache.get_pool(race_id))
        else {
            debug!(race_id, "Skipping odds snapshot, race or pool not cached");
            return false;
        };

        let entry = OddsHistoryEntry {
            timestamp: OffsetDateTime::now_utc(),
            markets: compute_market(&race, Some(&pool)),
            total_pool_wei: pool.total_pool,
        };
        self.history
            .entry(race_id)
            .or_insert_with(|| BoundedHistory::new(ODDS_HISTORY_CAPACITY))
            .push(entry);
        true
    }

    /// The most recent `limit` snapshots, oldest first.
    pub fn history(&self, race_id: RaceId, limit: usize) -> Vec<OddsHistoryEntry> {
        self.history
            .get(&race_id)
            .map(|history| history.tail(limit))
            .unwrap_or_default()
    }

    /// Aggregate every cached race. Missing pools are pulled; a failed pull
    /// leaves only that race without a pool.
    pub async fn dashboard_snapshot(&self) -> Dashboard {
        let races = self.cache.list_all();
        let mut annotated = Vec::with_capacity(races.len());
        for race in races {
            let pool = match self.cache.get_or_pull_pool(race.race_id).await {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(race_id = race.race_id, error = %e, "Dashboard pool pull failed");
                    None
                }
            };
            annotated.push(RaceWithPool { race, pool });
        }

        Dashboard {
            total_races: annotated.len(),
            active_races: annotated.iter().filter(|r| r.race.is_active()).count(),
            finished_races: annotated.iter().filter(|r| r.race.is_finished()).count(),
            races: annotated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::betting_pool::tests::pool;
    use crate::entities::race::tests::active_race;
    use crate::ledger::mock::{MockLedger, pool_record, race_record};
    use std::sync::atomic::Ordering;

    fn engine() -> (MarketEngine, Arc<MockLedger>) {
        let ledger = Arc::new(MockLedger::new());
        let cache = StateCache::new(ledger.clone());
        (MarketEngine::new(cache), ledger)
    }

    #[test]
    fn test_two_entrant_split() {
        let race = active_race(1, &[101, 102]);
        let pool = pool(1, 1000, &[(101, 750), (102, 250)]);
        let markets = compute_market(&race, Some(&pool));
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].token_id, 101);
        assert_eq!(markets[0].implied_probability, 75.0);
        assert_eq!(markets[1].implied_probability, 25.0);
    }

    #[test]
    fn test_empty_or_absent_pool_is_fully_uncertain() {
        let race = active_race(1, &[101, 102, 103]);
        for markets in [
            compute_market(&race, None),
            compute_market(&race, Some(&pool(1, 0, &[]))),
        ] {
            assert_eq!(markets.len(), 3);
            assert!(markets.iter().all(|m| m.implied_probability == 100.0));
            assert!(markets.iter().all(|m| m.bet_total_wei.is_zero()));
        }
    }

    #[test]
    fn test_probabilities_sum_to_hundred() {
        let race = active_race(1, &[101, 102, 103]);
        let pool = pool(1, 3, &[(101, 1), (102, 1), (103, 1)]);
        let markets = compute_market(&race, Some(&pool));
        assert_eq!(markets[0].implied_probability, 33.33);
        let sum: f64 = markets.iter().map(|m| m.implied_probability).sum();
        assert!((sum - 100.0).abs() <= 0.01 * markets.len() as f64);
    }

    #[test]
    fn test_bot_flag() {
        let race = Race {
            bot_token_ids: vec![102],
            ..active_race(1, &[101, 102])
        };
        let markets = compute_market(&race, None);
        assert!(!markets[0].is_bot);
        assert!(markets[1].is_bot);
    }

    #[test]
    fn test_snapshot_requires_cached_race_and_pool() {
        let (engine, _) = engine();
        assert!(!engine.record_snapshot(1));

        engine.cache().put(active_race(1, &[101, 102]));
        assert!(!engine.record_snapshot(1));

        engine.cache().put_pool(pool(1, 1000, &[(101, 750), (102, 250)]));
        assert!(engine.record_snapshot(1));

        let history = engine.history(1, 50);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_pool_wei, Decimal::from(1000));
        assert_eq!(history[0].markets[0].implied_probability, 75.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let (engine, _) = engine();
        engine.cache().put(active_race(1, &[101]));
        engine.cache().put_pool(pool(1, 1, &[(101, 1)]));
        for _ in 0..=ODDS_HISTORY_CAPACITY {
            engine.record_snapshot(1);
        }
        assert_eq!(engine.history(1, usize::MAX).len(), ODDS_HISTORY_CAPACITY);
        assert_eq!(engine.history(1, 5).len(), 5);
        assert!(engine.history(2, 5).is_empty());
    }

    #[tokio::test]
    async fn test_market_for_unknown_token() {
        let (engine, ledger) = engine();
        ledger.set_race(race_record(1, &[101, 102]));
        ledger.set_pool(1, pool_record(1000, &[(101, 750), (102, 250)], false));

        let market = engine.market(1, 102).await.unwrap().unwrap();
        assert_eq!(market.implied_probability, 25.0);
        assert!(engine.market(1, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ledger_odds_is_best_effort() {
        let (engine, ledger) = engine();
        ledger.set_odds(1, 101, 250);
        assert_eq!(engine.ledger_odds(1, 101).await, Some(250));

        ledger.fail_reads.store(true, Ordering::SeqCst);
        assert_eq!(engine.ledger_odds(1, 101).await, None);
    }

    #[tokio::test]
    async fn test_dashboard_blanks_failed_pool_only() {
        let (engine, ledger) = engine();
        engine.cache().put(active_race(1, &[101]));
        engine
            .cache()
            .put(active_race(2, &[101]).finish(101, OffsetDateTime::now_utc()));
        engine.cache().put_pool(pool(2, 10, &[(101, 10)]));
        ledger.fail_reads.store(true, Ordering::SeqCst);

        let dashboard = engine.dashboard_snapshot().await;
        assert_eq!(dashboard.total_races, 2);
        assert_eq!(dashboard.active_races, 1);
        assert_eq!(dashboard.finished_races, 1);
        let pools: Vec<_> = dashboard
            .races
            .iter()
            .map(|r| (r.race.race_id, r.pool.is_some()))
            .collect();
        assert!(pools.contains(&(1, false)));
        assert!(pools.contains(&(2, true)));
    }
}
