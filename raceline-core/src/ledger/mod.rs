//! The external ledger collaborator.
//!
//! The ledger is the append-only source of truth for race and wagering
//! facts. This module defines what the service consumes from it
//! ([`Ledger`]), the raw records it returns, and a JSON-RPC implementation.
//! Raw records are turned into cache entities by
//! [`LedgerProcessor`](crate::framework::LedgerProcessor).

mod json_rpc;
#[cfg(test)]
pub(crate) mod mock;

pub use json_rpc::JsonRpcLedger;

use crate::entities::{RaceId, TokenId};
use crate::events::{EventKind, LedgerEvent};
use crate::telemetry::EncodedTelemetry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a single ledger call.
///
/// All of them are transient from the cache's point of view: the previous
/// cached value, if any, stays in place.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport failure (connection, timeout, TLS, …)
    #[error("ledger request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The ledger answered with a JSON-RPC error object
    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response could not be interpreted
    #[error("malformed ledger response: {0}")]
    Decode(String),

    /// The ledger has no race with this id
    #[error("race {0} not found on ledger")]
    RaceNotFound(RaceId),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Decode(e.to_string())
    }
}

/// Race as stored on the ledger.
///
/// The ledger has no notion of "unset": `end_time` and `winner_token_id`
/// are zero until the race finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceRecord {
    pub race_id: RaceId,
    pub participant_token_ids: Vec<TokenId>,
    #[serde(default)]
    pub bot_token_ids: Vec<TokenId>,
    pub total_laps: u32,
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    pub is_active: bool,
    pub is_finished: bool,
    #[serde(default)]
    pub winner_token_id: TokenId,
    pub total_distance: u64,
}

/// Betting pool as stored on the ledger. Amounts are decimal wei strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub total_pool: String,
    pub is_settled: bool,
    #[serde(default)]
    pub token_bets: Vec<TokenBetRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBetRecord {
    pub token_id: TokenId,
    pub amount: String,
}

/// Opaque handle of a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the service consumes from the ledger.
///
/// Live subscriptions are built on top of [`query_events`](Ledger::query_events)
/// by the [`EventListener`](crate::processors::EventListener) task.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_race(&self, race_id: RaceId) -> Result<RaceRecord, LedgerError>;

    async fn get_betting_pool(&self, race_id: RaceId) -> Result<PoolRecord, LedgerError>;

    /// The ledger's own odds figure for one entrant.
    async fn get_odds(&self, race_id: RaceId, token_id: TokenId) -> Result<u64, LedgerError>;

    /// Current chain head.
    async fn block_number(&self) -> Result<u64, LedgerError>;

    /// Events of one kind in the inclusive block range, in ledger order.
    async fn query_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError>;

    /// Submit a telemetry-update command. Returns once the ledger accepted
    /// the transaction; confirmation is not awaited.
    async fn submit_telemetry_update(
        &self,
        race_id: RaceId,
        token_id: TokenId,
        telemetry: EncodedTelemetry,
    ) -> Result<SubmissionHandle, LedgerError>;
}
