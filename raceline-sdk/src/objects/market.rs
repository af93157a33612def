//! Market analytics objects derived from race and pool state.

use super::race::{BettingPoolResponse, RaceResponse};
use super::TokenId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Implied-probability market for one race entrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub token_id: TokenId,
    pub is_bot: bool,
    pub bet_total_wei: Decimal,
    /// Share of the pool in percent. Every entrant reports `100` while the
    /// pool is empty.
    pub implied_probability: f64,
}

/// A single market together with the odds the ledger itself reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleMarketResponse {
    #[serde(flatten)]
    pub market: MarketResponse,
    /// `None` when the ledger could not be queried.
    pub ledger_odds: Option<u64>,
}

/// One point of a race's odds trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsHistoryEntryResponse {
    /// Unix timestamp (milliseconds) of the snapshot.
    pub timestamp: i64,
    pub markets: Vec<MarketResponse>,
    pub total_pool_wei: Decimal,
}

/// A race annotated with its betting pool for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceWithPoolResponse {
    #[serde(flatten)]
    pub race: RaceResponse,
    /// `None` when the pool could not be pulled while assembling the snapshot.
    pub betting_pool: Option<BettingPoolResponse>,
}

/// Aggregate view over every cached race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_races: usize,
    pub active_races: usize,
    pub finished_races: usize,
    pub races: Vec<RaceWithPoolResponse>,
}
