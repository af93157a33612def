use serde::{Deserialize, Serialize};

/// Telemetry in domain units, as sent by a simulation client.
///
/// Values outside the storable range are clamped by the server; non-finite
/// values are treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryUpdateRequest {
    pub position_x: f64,
    pub position_y: f64,
    pub speed: f64,
    pub current_lap: f64,
    pub lap_progress: f64,
    pub acceleration: f64,
}

/// Result of a telemetry submission.
///
/// Submission is fire-and-forget: `Submitted` only means the ledger accepted
/// the command, not that it was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TelemetryUpdateResponse {
    Submitted { transaction: String },
    Failed { reason: String },
}
