pub mod betting_pool;
pub mod odds_history;
pub mod race;

pub use betting_pool::BettingPool;
pub use odds_history::{BoundedHistory, OddsHistoryEntry};
pub use race::{Race, RaceStatus};
pub use raceline_sdk::objects::{RaceId, TokenId};

/// Unix timestamp in milliseconds, the resolution used on the wire for
/// local cache stamps.
pub fn unix_millis(at: time::OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
