//! Race, pool, market and dashboard read endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use raceline_core::entities::{RaceId, TokenId};
use raceline_sdk::objects::{
    BettingPoolResponse, DashboardResponse, MarketResponse, OddsHistoryEntryResponse,
    RaceResponse, SingleMarketResponse,
};
use serde::Deserialize;

use super::ApiError;
use crate::state::AppState;

/// Odds-history entries returned when the caller gives no `limit`.
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// `GET /races`: every cached race, most recent start first.
pub(super) async fn list_races(State(state): State<AppState>) -> Json<Vec<RaceResponse>> {
    let races = state
        .cache()
        .list_all()
        .iter()
        .map(|race| race.as_ref().into())
        .collect();
    Json(races)
}

/// `GET /races/{race_id}`
pub(super) async fn get_race(
    State(state): State<AppState>,
    Path(race_id): Path<RaceId>,
) -> Result<Json<RaceResponse>, ApiError> {
    let race = state.cache().get_or_pull(race_id).await?;
    Ok(Json(race.as_ref().into()))
}

/// `GET /races/{race_id}/pool`
pub(super) async fn get_pool(
    State(state): State<AppState>,
    Path(race_id): Path<RaceId>,
) -> Result<Json<BettingPoolResponse>, ApiError> {
    let pool = state.cache().get_or_pull_pool(race_id).await?;
    Ok(Json(pool.as_ref().into()))
}

/// `GET /races/{race_id}/markets`
pub(super) async fn list_markets(
    State(state): State<AppState>,
    Path(race_id): Path<RaceId>,
) -> Result<Json<Vec<MarketResponse>>, ApiError> {
    let markets = state.engine.markets(race_id).await?;
    Ok(Json(markets.iter().map(MarketResponse::from).collect()))
}

/// `GET /races/{race_id}/markets/{token_id}`
///
/// The ledger's own odds are attached best-effort and are `null` when the
/// ledger could not be asked.
pub(super) async fn get_market(
    State(state): State<AppState>,
    Path((race_id, token_id)): Path<(RaceId, TokenId)>,
) -> Result<Json<SingleMarketResponse>, ApiError> {
    let market = state
        .engine
        .market(race_id, token_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("token {token_id} does not run in race {race_id}"))
        })?;
    let ledger_odds = state.engine.ledger_odds(race_id, token_id).await;

    Ok(Json(SingleMarketResponse {
        market: (&market).into(),
        ledger_odds,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<usize>,
}

/// `GET /races/{race_id}/odds-history?limit=N`
///
/// Unknown races simply have no history.
pub(super) async fn odds_history(
    State(state): State<AppState>,
    Path(race_id): Path<RaceId>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<OddsHistoryEntryResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state
        .engine
        .history(race_id, limit)
        .iter()
        .map(OddsHistoryEntryResponse::from)
        .collect();
    Json(history)
}

/// `GET /dashboard`
pub(super) async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let snapshot = state.engine.dashboard_snapshot().await;
    Json((&snapshot).into())
}
