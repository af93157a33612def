use axum::{
    Json,
    extract::{Path, State},
};
use raceline_core::entities::{RaceId, TokenId};
use raceline_core::telemetry::{SubmissionOutcome, TelemetryFrame};
use raceline_sdk::objects::{TelemetryUpdateRequest, TelemetryUpdateResponse};

use super::ApiError;
use crate::state::AppState;

/// `POST /races/{race_id}/telemetry/{token_id}`: submit one telemetry frame.
///
/// A ledger failure is not an HTTP error: the response carries
/// `"status": "failed"` with the reason.
pub(super) async fn submit_telemetry(
    State(state): State<AppState>,
    Path((race_id, token_id)): Path<(RaceId, TokenId)>,
    Json(request): Json<TelemetryUpdateRequest>,
) -> Result<Json<TelemetryUpdateResponse>, ApiError> {
    let frame = TelemetryFrame {
        position_x: request.position_x,
        position_y: request.position_y,
        speed: request.speed,
        current_lap: request.current_lap,
        lap_progress: request.lap_progress,
        acceleration: request.acceleration,
    };

    let response = match state.submitter.submit(race_id, token_id, frame).await? {
        SubmissionOutcome::Submitted(handle) => TelemetryUpdateResponse::Submitted {
            transaction: handle.to_string(),
        },
        SubmissionOutcome::Failed { reason } => TelemetryUpdateResponse::Failed { reason },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{StubLedger, app_state, call};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn frame() -> serde_json::Value {
        json!({
            "positionX": 12.5,
            "positionY": -3.25,
            "speed": 180.0,
            "currentLap": 2.0,
            "lapProgress": 40.0,
            "acceleration": 15.0
        })
    }

    #[tokio::test]
    async fn test_submit_returns_transaction() {
        let state = app_state(Arc::new(StubLedger::default()));
        let (status, body) =
            call(state, "POST", "/api/v1/races/1/telemetry/101", Some(frame())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "submitted");
        assert_eq!(body["transaction"], "0xfeed");
    }

    #[tokio::test]
    async fn test_ledger_rejection_is_reported_in_body() {
        let ledger = Arc::new(StubLedger::default());
        ledger.reject_submissions.store(true, Ordering::SeqCst);
        let (status, body) =
            call(app_state(ledger), "POST", "/api/v1/races/1/telemetry/101", Some(frame())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failed");
        assert!(body["reason"].as_str().unwrap().contains("execution reverted"));
    }
}
