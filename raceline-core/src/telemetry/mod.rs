//! Vehicle telemetry: the ledger codec and the submission path.

pub mod codec;

pub use codec::{EncodeError, EncodedTelemetry, TelemetryFrame, decode, encode};

use crate::entities::{RaceId, TokenId};
use crate::ledger::{Ledger, SubmissionHandle};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a submission that got past encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The ledger accepted the transaction. Confirmation is not awaited.
    Submitted(SubmissionHandle),
    /// The ledger call failed. Nothing is retried.
    Failed { reason: String },
}

/// Encodes telemetry frames and hands them to the ledger.
#[derive(Clone)]
pub struct TelemetrySubmitter {
    ledger: Arc<dyn Ledger>,
}

impl TelemetrySubmitter {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Encode `frame` and submit it once.
    ///
    /// An encoding failure is returned before the ledger is contacted. A
    /// ledger failure is reported through [`SubmissionOutcome::Failed`].
    pub async fn submit(
        &self,
        race_id: RaceId,
        token_id: TokenId,
        frame: TelemetryFrame,
    ) -> Result<SubmissionOutcome, EncodeError> {
        let encoded = encode(frame)?;
        match self
            .ledger
            .submit_telemetry_update(race_id, token_id, encoded)
            .await
        {
            Ok(handle) => {
                info!(race_id, token_id, transaction = %handle, "Submitted telemetry update");
                Ok(SubmissionOutcome::Submitted(handle))
            }
            Err(e) => {
                warn!(race_id, token_id, error = %e, "Telemetry submission failed");
                Ok(SubmissionOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }
}
