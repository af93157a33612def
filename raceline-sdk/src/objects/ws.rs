//! WebSocket message types for the change notification stream.
//!
//! The `GET /api/v1/ws` endpoint upgrades to a WebSocket connection and
//! pushes [`WsServerMessage`] JSON frames.
//!
//! # Protocol
//!
//! 1. Nothing is replayed on connect; the first frame is the first cache
//!    mutation observed after the upgrade.
//! 2. One frame is sent per mutation, carrying the freshly written entity.
//! 3. Delivery is best-effort. A client that falls behind receives a
//!    [`WsServerMessage::Lagged`] frame telling it how many notifications it
//!    missed, and should re-read the affected state over HTTP.

use serde::{Deserialize, Serialize};

use super::race::{BettingPoolResponse, RaceResponse};

/// Server-to-client WebSocket message.
///
/// Serialized as an internally-tagged JSON object:
///
/// ```json
/// {"type":"race_created","race":{ ... }}
/// {"type":"betting_updated","pool":{ ... }}
/// {"type":"lagged","skipped":12}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    RaceCreated { race: RaceResponse },
    RaceFinished { race: RaceResponse },
    BettingUpdated { pool: BettingPoolResponse },
    BettingSettled { pool: BettingPoolResponse },

    /// The connection fell behind the notification bus.
    Lagged { skipped: u64 },
}

/// WebSocket close codes sent by the notification stream.
pub struct WsCloseCode;

impl WsCloseCode {
    /// The server is shutting down or the bus was closed.
    pub const GOING_AWAY: u16 = 1001;
}
