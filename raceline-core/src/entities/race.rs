use super::{RaceId, TokenId, unix_millis};
use raceline_sdk::objects::RaceResponse;
use time::OffsetDateTime;

/// Lifecycle of a race.
///
/// Carried as one enum so "active" and "finished" can never both hold.
/// A finished race never leaves `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceStatus {
    /// Created on the ledger, not started yet.
    Scheduled,
    Active,
    Finished,
}

impl RaceStatus {
    /// Normalize the ledger's pair of flags. A record claiming both is
    /// treated as finished.
    pub fn from_flags(is_active: bool, is_finished: bool) -> Self {
        match (is_active, is_finished) {
            (_, true) => RaceStatus::Finished,
            (true, false) => RaceStatus::Active,
            (false, false) => RaceStatus::Scheduled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub race_id: RaceId,
    pub participant_token_ids: Vec<TokenId>,
    pub bot_token_ids: Vec<TokenId>,
    pub total_laps: u32,
    /// Unix seconds, as reported by the ledger.
    pub start_time: i64,
    /// Unix seconds. Unset until the race finishes.
    pub end_time: Option<i64>,
    pub status: RaceStatus,
    pub winner_token_id: Option<TokenId>,
    pub total_distance: u64,
    /// Local wall-clock time of the last cache write.
    pub updated_at: OffsetDateTime,
}

impl Race {
    pub fn is_active(&self) -> bool {
        self.status == RaceStatus::Active
    }

    pub fn is_finished(&self) -> bool {
        self.status == RaceStatus::Finished
    }

    pub fn is_participant(&self, token_id: TokenId) -> bool {
        self.participant_token_ids.contains(&token_id)
    }

    pub fn is_bot(&self, token_id: TokenId) -> bool {
        self.bot_token_ids.contains(&token_id)
    }

    /// Apply a finish event.
    ///
    /// An already finished race is returned unchanged: the first observed
    /// winner and end time stick.
    pub fn finish(&self, winner_token_id: TokenId, now: OffsetDateTime) -> Race {
        if self.is_finished() {
            return self.clone();
        }
        Race {
            status: RaceStatus::Finished,
            winner_token_id: Some(winner_token_id),
            end_time: Some(now.unix_timestamp()),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Merge a freshly pulled record over the cached one without letting
    /// the race fall back out of `Finished`.
    pub fn reconcile(self, cached: Option<&Race>) -> Race {
        match cached {
            Some(previous) if previous.is_finished() && !self.is_finished() => Race {
                status: RaceStatus::Finished,
                winner_token_id: previous.winner_token_id,
                end_time: previous.end_time,
                ..self
            },
            _ => self,
        }
    }
}

impl From<&Race> for RaceResponse {
    fn from(race: &Race) -> Self {
        RaceResponse {
            race_id: race.race_id,
            participant_token_ids: race.participant_token_ids.clone(),
            bot_token_ids: race.bot_token_ids.clone(),
            total_laps: race.total_laps,
            start_time: race.start_time,
            end_time: race.end_time,
            is_active: race.is_active(),
            is_finished: race.is_finished(),
            winner_token_id: race.winner_token_id,
            total_distance: race.total_distance,
            updated_at: unix_millis(race.updated_at),
        }
    }
}
