//! JSON-RPC 2.0 over HTTP implementation of [`Ledger`].
//!
//! Chain-head queries use the standard `eth_blockNumber` method (hex
//! quantity). Race-specific reads and the telemetry command go through the
//! ledger gateway's `race_*` namespace, which takes and returns plain JSON
//! numbers and decimal strings.

use super::{Ledger, LedgerError, PoolRecord, RaceRecord, SubmissionHandle};
use crate::entities::{RaceId, TokenId};
use crate::events::{EventKind, LedgerEvent};
use crate::telemetry::EncodedTelemetry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub struct JsonRpcLedger {
    endpoint: Url,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Create a client for the ledger gateway at `endpoint`.
    ///
    /// `request_timeout` bounds every individual call.
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("raceline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            endpoint,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Perform one call. `Ok(None)` means the ledger returned a `null`
    /// result without an error object.
    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<Option<R>, LedgerError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        trace!(method, id, "Sending ledger request");

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;

        decode_response(&body)
    }

    async fn call_required<P, R>(&self, method: &'static str, params: P) -> Result<R, LedgerError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.call(method, params)
            .await?
            .ok_or_else(|| LedgerError::Decode(format!("{method} returned no result")))
    }
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn get_race(&self, race_id: RaceId) -> Result<RaceRecord, LedgerError> {
        self.call("race_getRace", [race_id])
            .await?
            .ok_or(LedgerError::RaceNotFound(race_id))
    }

    async fn get_betting_pool(&self, race_id: RaceId) -> Result<PoolRecord, LedgerError> {
        self.call_required("race_getBettingPool", [race_id]).await
    }

    async fn get_odds(&self, race_id: RaceId, token_id: TokenId) -> Result<u64, LedgerError> {
        self.call_required("race_getOdds", [race_id, token_id]).await
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        let quantity: String = self
            .call_required("eth_blockNumber", [(); 0])
            .await?;
        parse_quantity(&quantity)
    }

    async fn query_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let filter = EventFilter {
            kind,
            from_block,
            to_block,
        };
        let events: Vec<LedgerEvent> = self.call_required("race_getEvents", [filter]).await?;
        debug!(
            kind = %kind,
            from_block,
            to_block,
            count = events.len(),
            "Queried ledger events"
        );
        Ok(events)
    }

    async fn submit_telemetry_update(
        &self,
        race_id: RaceId,
        token_id: TokenId,
        telemetry: EncodedTelemetry,
    ) -> Result<SubmissionHandle, LedgerError> {
        let params = TelemetryParams {
            race_id,
            token_id,
            telemetry,
        };
        let tx_hash: String = self.call_required("race_submitTelemetry", [params]).await?;
        Ok(SubmissionHandle::new(tx_hash))
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventFilter {
    kind: EventKind,
    from_block: u64,
    to_block: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryParams {
    race_id: RaceId,
    token_id: TokenId,
    telemetry: EncodedTelemetry,
}

fn decode_response<R: DeserializeOwned>(body: &[u8]) -> Result<Option<R>, LedgerError> {
    let response: RpcResponse<R> = serde_json::from_slice(body)?;
    if let Some(error) = response.error {
        return Err(LedgerError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result)
}

/// Parse an Ethereum-style hex quantity (`"0x1b4"`).
fn parse_quantity(quantity: &str) -> Result<u64, LedgerError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("invalid quantity: {quantity}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("invalid quantity {quantity}: {e}")))
}
