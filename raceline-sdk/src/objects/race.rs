use super::{RaceId, TokenId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A race as served by the query API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResponse {
    pub race_id: RaceId,
    pub participant_token_ids: Vec<TokenId>,
    pub bot_token_ids: Vec<TokenId>,
    pub total_laps: u32,
    /// Unix timestamp (seconds) reported by the ledger.
    pub start_time: i64,
    /// Unix timestamp (seconds), unset until the race finishes.
    pub end_time: Option<i64>,
    pub is_active: bool,
    pub is_finished: bool,
    pub winner_token_id: Option<TokenId>,
    pub total_distance: u64,
    /// Unix timestamp (milliseconds) of the last cache write.
    pub updated_at: i64,
}

/// The wagering pool of a race.
///
/// Amounts are wei-denominated integers carried as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BettingPoolResponse {
    pub race_id: RaceId,
    pub total_pool: Decimal,
    pub is_settled: bool,
    pub token_bets: BTreeMap<TokenId, Decimal>,
    /// `false` when the ledger returned no per-token breakdown and every
    /// participant was defaulted to zero.
    pub breakdown_available: bool,
    /// Unix timestamp (milliseconds) of the last cache write.
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_amounts_are_strings_on_the_wire() {
        let pool = BettingPoolResponse {
            race_id: 1,
            total_pool: Decimal::from(1_000_000_000_000_000_000u64),
            is_settled: false,
            token_bets: BTreeMap::from([(101, Decimal::from(750)), (102, Decimal::ZERO)]),
            breakdown_available: true,
            updated_at: 0,
        };
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["totalPool"], "1000000000000000000");
        assert_eq!(json["tokenBets"]["101"], "750");

        let back: BettingPoolResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, pool);
    }
}
