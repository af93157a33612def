use super::{RaceId, TokenId, unix_millis};
use raceline_sdk::objects::BettingPoolResponse;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Wagering state of one race.
///
/// `token_bets` only ever holds participants of the owning race. When the
/// ledger reports no breakdown, every participant is present with a zero bet
/// and `breakdown_available` is `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BettingPool {
    pub race_id: RaceId,
    /// Total wagered amount in wei.
    pub total_pool: Decimal,
    pub is_settled: bool,
    pub token_bets: BTreeMap<TokenId, Decimal>,
    pub breakdown_available: bool,
    pub updated_at: OffsetDateTime,
}

impl BettingPool {
    /// Amount wagered on `token_id`, zero if there is none.
    pub fn bet_on(&self, token_id: TokenId) -> Decimal {
        self.token_bets
            .get(&token_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Merge a freshly pulled record over the cached one. Settlement is
    /// final: an unsettled record never replaces a settled one.
    pub fn reconcile(self, cached: Option<&BettingPool>) -> BettingPool {
        match cached {
            Some(previous) if previous.is_settled && !self.is_settled => previous.clone(),
            _ => self,
        }
    }
}

impl From<&BettingPool> for BettingPoolResponse {
    fn from(pool: &BettingPool) -> Self {
        BettingPoolResponse {
            race_id: pool.race_id,
            total_pool: pool.total_pool,
            is_settled: pool.is_settled,
            token_bets: pool.token_bets.clone(),
            breakdown_available: pool.breakdown_available,
            updated_at: unix_millis(pool.updated_at),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn pool(race_id: RaceId, total: u64, bets: &[(TokenId, u64)]) -> BettingPool {
        BettingPool {
            race_id,
            total_pool: Decimal::from(total),
            is_settled: false,
            token_bets: bets
                .iter()
                .map(|(token, amount)| (*token, Decimal::from(*amount)))
                .collect(),
            breakdown_available: true,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_bet_on_missing_token_is_zero() {
        let pool = pool(1, 1000, &[(101, 750)]);
        assert_eq!(pool.bet_on(101), Decimal::from(750));
        assert_eq!(pool.bet_on(999), Decimal::ZERO);
    }

    #[test]
    fn test_settlement_is_monotonic() {
        let settled = BettingPool {
            is_settled: true,
            ..pool(1, 1000, &[(101, 1000)])
        };
        let stale = pool(1, 900, &[(101, 900)]);
        assert_eq!(stale.reconcile(Some(&settled)), settled);

        let newer = BettingPool {
            is_settled: true,
            ..pool(1, 1200, &[(101, 1200)])
        };
        assert_eq!(newer.clone().reconcile(Some(&settled)), newer);
    }
}
