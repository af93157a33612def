//! Query API client (frontend or relay → Raceline server).

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::{
    BettingPoolResponse, DashboardResponse, MarketResponse, OddsHistoryEntryResponse, RaceId,
    RaceResponse, SingleMarketResponse, TelemetryUpdateRequest, TelemetryUpdateResponse, TokenId,
};

/// Typed HTTP client for the Raceline **query API**.
#[derive(Debug, Clone)]
pub struct RacelineClient {
    http: Client,
    base_url: Url,
}

impl RacelineClient {
    /// Create a new `RacelineClient`.
    ///
    /// * `base_url` – root URL of the Raceline server (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/races` – every cached race, newest start first.
    pub async fn list_races(&self) -> Result<Vec<RaceResponse>, ClientError> {
        self.get("/api/v1/races").await
    }

    /// `GET /api/v1/races/{race_id}`
    pub async fn get_race(&self, race_id: RaceId) -> Result<RaceResponse, ClientError> {
        self.get(&format!("/api/v1/races/{race_id}")).await
    }

    /// `GET /api/v1/races/{race_id}/pool`
    pub async fn get_betting_pool(
        &self,
        race_id: RaceId,
    ) -> Result<BettingPoolResponse, ClientError> {
        self.get(&format!("/api/v1/races/{race_id}/pool")).await
    }

    /// `GET /api/v1/races/{race_id}/markets`
    pub async fn list_markets(&self, race_id: RaceId) -> Result<Vec<MarketResponse>, ClientError> {
        self.get(&format!("/api/v1/races/{race_id}/markets")).await
    }

    /// `GET /api/v1/races/{race_id}/markets/{token_id}`
    pub async fn get_market(
        &self,
        race_id: RaceId,
        token_id: TokenId,
    ) -> Result<SingleMarketResponse, ClientError> {
        self.get(&format!("/api/v1/races/{race_id}/markets/{token_id}"))
            .await
    }

    /// `GET /api/v1/races/{race_id}/odds-history?limit={limit}`
    pub async fn odds_history(
        &self,
        race_id: RaceId,
        limit: usize,
    ) -> Result<Vec<OddsHistoryEntryResponse>, ClientError> {
        self.get(&format!(
            "/api/v1/races/{race_id}/odds-history?limit={limit}"
        ))
        .await
    }

    /// `GET /api/v1/dashboard`
    pub async fn dashboard(&self) -> Result<DashboardResponse, ClientError> {
        self.get("/api/v1/dashboard").await
    }

    /// `POST /api/v1/races/{race_id}/telemetry/{token_id}` – submit one
    /// telemetry frame. A ledger-side failure is returned as
    /// [`TelemetryUpdateResponse::Failed`], not as an error.
    pub async fn submit_telemetry(
        &self,
        race_id: RaceId,
        token_id: TokenId,
        frame: &TelemetryUpdateRequest,
    ) -> Result<TelemetryUpdateResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/races/{race_id}/telemetry/{token_id}"))?;

        let resp = self.http.post(url).json(frame).send().await?;

        parse_response(resp).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
