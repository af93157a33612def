//! Public HTTP API, mounted under `/api/v1`.
//!
//! # Endpoints
//!
//! - `GET  /races`                                – every cached race
//! - `GET  /races/{race_id}`                      – one race (pulled on miss)
//! - `GET  /races/{race_id}/pool`                 – betting pool (pulled on miss)
//! - `GET  /races/{race_id}/markets`              – markets of every entrant
//! - `GET  /races/{race_id}/markets/{token_id}`   – one market plus ledger odds
//! - `GET  /races/{race_id}/odds-history`         – recent odds snapshots
//! - `GET  /dashboard`                            – aggregate view
//! - `POST /races/{race_id}/telemetry/{token_id}` – submit a telemetry update
//! - `GET  /ws`                                   – notification stream

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use raceline_core::ledger::LedgerError;
use raceline_core::telemetry::EncodeError;
use serde::Serialize;

use crate::state::AppState;

mod races;
mod telemetry;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/races", get(races::list_races))
        .route("/races/{race_id}", get(races::get_race))
        .route("/races/{race_id}/pool", get(races::get_pool))
        .route("/races/{race_id}/markets", get(races::list_markets))
        .route("/races/{race_id}/markets/{token_id}", get(races::get_market))
        .route("/races/{race_id}/odds-history", get(races::odds_history))
        .route("/dashboard", get(races::dashboard))
        .route(
            "/races/{race_id}/telemetry/{token_id}",
            post(telemetry::submit_telemetry),
        )
        .route("/ws", get(ws::notifications_ws))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    NotFound(String),
    Ledger(LedgerError),
    Encode(EncodeError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::RaceNotFound(race_id) => {
                ApiError::NotFound(format!("race {race_id} not found"))
            }
            other => ApiError::Ledger(other),
        }
    }
}

impl From<EncodeError> for ApiError {
    fn from(e: EncodeError) -> Self {
        ApiError::Encode(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Ledger(e) => {
                tracing::warn!(error = %e, "API: ledger pull failed");
                (StatusCode::BAD_GATEWAY, format!("ledger unavailable: {e}"))
            }
            ApiError::Encode(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! Router tests against an in-memory ledger.

    use crate::state::AppState;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use raceline_core::cache::StateCache;
    use raceline_core::entities::{RaceId, TokenId};
    use raceline_core::events::{EventKind, LedgerEvent, NotificationBus};
    use raceline_core::ledger::{
        Ledger, LedgerError, PoolRecord, RaceRecord, SubmissionHandle, TokenBetRecord,
    };
    use raceline_core::market::MarketEngine;
    use raceline_core::telemetry::{EncodedTelemetry, TelemetrySubmitter};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::watch;
    use tower::ServiceExt;

    #[derive(Default)]
    pub(crate) struct StubLedger {
        pub races: Mutex<HashMap<RaceId, RaceRecord>>,
        pub pools: Mutex<HashMap<RaceId, PoolRecord>>,
        pub unavailable: AtomicBool,
        pub reject_submissions: AtomicBool,
    }

    impl StubLedger {
        pub fn with_race(
            self,
            race_id: RaceId,
            participants: &[TokenId],
            bets: &[(TokenId, u64)],
        ) -> Self {
            self.races.lock().unwrap().insert(
                race_id,
                RaceRecord {
                    race_id,
                    participant_token_ids: participants.to_vec(),
                    bot_token_ids: vec![],
                    total_laps: 3,
                    start_time: 1_700_000_000 + race_id as i64,
                    end_time: 0,
                    is_active: true,
                    is_finished: false,
                    winner_token_id: 0,
                    total_distance: 3_000,
                },
            );
            self.pools.lock().unwrap().insert(
                race_id,
                PoolRecord {
                    total_pool: bets.iter().map(|(_, amount)| amount).sum::<u64>().to_string(),
                    is_settled: false,
                    token_bets: bets
                        .iter()
                        .map(|(token_id, amount)| TokenBetRecord {
                            token_id: *token_id,
                            amount: amount.to_string(),
                        })
                        .collect(),
                },
            );
            self
        }

        fn check(&self) -> Result<(), LedgerError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(LedgerError::Rpc {
                    code: -32000,
                    message: "ledger unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Ledger for StubLedger {
        async fn get_race(&self, race_id: RaceId) -> Result<RaceRecord, LedgerError> {
            self.check()?;
            self.races
                .lock()
                .unwrap()
                .get(&race_id)
                .cloned()
                .ok_or(LedgerError::RaceNotFound(race_id))
        }

        async fn get_betting_pool(&self, race_id: RaceId) -> Result<PoolRecord, LedgerError> {
            self.check()?;
            self.pools
                .lock()
                .unwrap()
                .get(&race_id)
                .cloned()
                .ok_or(LedgerError::RaceNotFound(race_id))
        }

        async fn get_odds(&self, _race_id: RaceId, _token_id: TokenId) -> Result<u64, LedgerError> {
            self.check()?;
            Ok(250)
        }

        async fn block_number(&self) -> Result<u64, LedgerError> {
            self.check()?;
            Ok(0)
        }

        async fn query_events(
            &self,
            _kind: EventKind,
            _from_block: u64,
            _to_block: u64,
        ) -> Result<Vec<LedgerEvent>, LedgerError> {
            self.check()?;
            Ok(vec![])
        }

        async fn submit_telemetry_update(
            &self,
            _race_id: RaceId,
            _token_id: TokenId,
            _telemetry: EncodedTelemetry,
        ) -> Result<SubmissionHandle, LedgerError> {
            if self.reject_submissions.load(Ordering::SeqCst) {
                return Err(LedgerError::Rpc {
                    code: 3,
                    message: "execution reverted".to_string(),
                });
            }
            Ok(SubmissionHandle::new("0xfeed"))
        }
    }

    pub(crate) fn app_state(ledger: Arc<StubLedger>) -> AppState {
        let cache = StateCache::new(ledger.clone());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        AppState::new(
            MarketEngine::new(cache),
            NotificationBus::new(),
            TelemetrySubmitter::new(ledger),
            shutdown_rx,
        )
    }

    /// Send one request through the full router and decode the JSON body.
    pub(crate) async fn call(
        state: AppState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = crate::server::build_router(state)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
