//! Ledger reads as [`Processor`] commands.
//!
//! Every read the cache performs is a small command struct processed by
//! [`LedgerProcessor`]. The processors are where raw ledger records are
//! normalized into cache entities, so nothing downstream ever sees the
//! ledger's zero-means-unset conventions.

use crate::entities::{BettingPool, Race, RaceId, RaceStatus, TokenId};
use crate::ledger::{Ledger, LedgerError};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::warn;

#[derive(Clone)]
pub struct LedgerProcessor {
    pub ledger: Arc<dyn Ledger>,
}

#[derive(Debug, Clone, Copy)]
/// Read one race from the ledger.
pub struct PullRace {
    pub race_id: RaceId,
}

impl Processor<PullRace> for LedgerProcessor {
    type Output = Race;
    type Error = LedgerError;
    #[tracing::instrument(skip_all, err, name = "Ledger:PullRace", fields(race_id = query.race_id))]
    async fn process(&self, query: PullRace) -> Result<Race, LedgerError> {
        let record = self.ledger.get_race(query.race_id).await?;
        let status = RaceStatus::from_flags(record.is_active, record.is_finished);
        let finished = status == RaceStatus::Finished;

        let winner_token_id = match (finished, record.winner_token_id) {
            (false, _) => None,
            (true, winner) if record.participant_token_ids.contains(&winner) => Some(winner),
            (true, 0) => None,
            (true, winner) => {
                warn!(race_id = query.race_id, winner, "Ledger winner is not a participant");
                Some(winner)
            }
        };

        Ok(Race {
            race_id: query.race_id,
            participant_token_ids: record.participant_token_ids,
            bot_token_ids: record.bot_token_ids,
            total_laps: record.total_laps,
            start_time: record.start_time,
            end_time: (finished && record.end_time > 0).then_some(record.end_time),
            status,
            winner_token_id,
            total_distance: record.total_distance,
            updated_at: OffsetDateTime::now_utc(),
        })
    }
}

#[derive(Debug, Clone)]
/// Read the betting pool of a race.
///
/// `participants` is the participant list of the owning race. The resulting
/// breakdown holds exactly these tokens; a participant the ledger has no
/// entry for gets a zero bet.
pub struct PullBettingPool {
    pub race_id: RaceId,
    pub participants: Vec<TokenId>,
}

impl Processor<PullBettingPool> for LedgerProcessor {
    type Output = BettingPool;
    type Error = LedgerError;
    #[tracing::instrument(
        skip_all,
        err,
        name = "Ledger:PullBettingPool",
        fields(race_id = query.race_id)
    )]
    async fn process(&self, query: PullBettingPool) -> Result<BettingPool, LedgerError> {
        let record = self.ledger.get_betting_pool(query.race_id).await?;
        let total_pool = parse_amount(&record.total_pool)?;
        let breakdown_available = !record.token_bets.is_empty();

        let mut token_bets: BTreeMap<TokenId, Decimal> = query
            .participants
            .iter()
            .map(|token_id| (*token_id, Decimal::ZERO))
            .collect();
        for bet in record.token_bets {
            let amount = parse_amount(&bet.amount)?;
            match token_bets.get_mut(&bet.token_id) {
                Some(slot) => *slot += amount,
                None => warn!(
                    race_id = query.race_id,
                    token_id = bet.token_id,
                    "Dropping bet on a token that is not a participant"
                ),
            }
        }

        Ok(BettingPool {
            race_id: query.race_id,
            total_pool,
            is_settled: record.is_settled,
            token_bets,
            breakdown_available,
            updated_at: OffsetDateTime::now_utc(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
/// Read the ledger's own odds figure for one entrant.
pub struct GetLedgerOdds {
    pub race_id: RaceId,
    pub token_id: TokenId,
}

impl Processor<GetLedgerOdds> for LedgerProcessor {
    type Output = u64;
    type Error = LedgerError;
    #[tracing::instrument(skip_all, err, name = "Ledger:GetLedgerOdds")]
    async fn process(&self, query: GetLedgerOdds) -> Result<u64, LedgerError> {
        self.ledger.get_odds(query.race_id, query.token_id).await
    }
}

/// Parse a wei string: a non-negative integer in decimal notation.
///
/// `Decimal` holds at most 96 bits, so amounts above roughly 7.9e28 wei
/// are rejected as undecodable.
fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|e| LedgerError::Decode(format!("invalid amount {raw:?}: {e}")))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Decode(format!("negative amount {raw:?}")));
    }
    if amount.scale() != 0 {
        return Err(LedgerError::Decode(format!("fractional amount {raw:?}")));
    }
    Ok(amount)
}
