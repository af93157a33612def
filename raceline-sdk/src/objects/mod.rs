pub mod market;
pub mod race;
pub mod telemetry;
pub mod ws;

/// Ledger-assigned race identifier.
pub type RaceId = u64;

/// Identifier of a race entrant (vehicle token).
pub type TokenId = u64;

pub use market::{
    DashboardResponse, MarketResponse, OddsHistoryEntryResponse, RaceWithPoolResponse,
    SingleMarketResponse,
};
pub use race::{BettingPoolResponse, RaceResponse};
pub use telemetry::{TelemetryUpdateRequest, TelemetryUpdateResponse};
pub use ws::{WsCloseCode, WsServerMessage};
