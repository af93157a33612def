//! Event type definitions.
//!
//! Ledger events carry identifiers only (plus the winner for finish events).
//! Handlers re-pull the current entity from the ledger instead of trusting
//! anything else in the event.

use crate::entities::{BettingPool, Race, RaceId, TokenId};
use raceline_sdk::objects::WsServerMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The four ledger event kinds the service follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    RaceCreated,
    RaceFinished,
    BetPlaced,
    BettingPoolSettled,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::RaceCreated,
        EventKind::RaceFinished,
        EventKind::BetPlaced,
        EventKind::BettingPoolSettled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RaceCreated => "RaceCreated",
            EventKind::RaceFinished => "RaceFinished",
            EventKind::BetPlaced => "BetPlaced",
            EventKind::BettingPoolSettled => "BettingPoolSettled",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event observed on the ledger, with its position in ledger order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub block_number: u64,
    pub log_index: u32,
    #[serde(flatten)]
    pub payload: LedgerEventPayload,
}

impl LedgerEvent {
    pub fn race_id(&self) -> RaceId {
        self.payload.race_id()
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum LedgerEventPayload {
    RaceCreated {
        race_id: RaceId,
    },
    RaceFinished {
        race_id: RaceId,
        winner_token_id: TokenId,
    },
    BetPlaced {
        race_id: RaceId,
    },
    BettingPoolSettled {
        race_id: RaceId,
    },
}

impl LedgerEventPayload {
    pub fn race_id(&self) -> RaceId {
        match self {
            LedgerEventPayload::RaceCreated { race_id }
            | LedgerEventPayload::RaceFinished { race_id, .. }
            | LedgerEventPayload::BetPlaced { race_id }
            | LedgerEventPayload::BettingPoolSettled { race_id } => *race_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEventPayload::RaceCreated { .. } => EventKind::RaceCreated,
            LedgerEventPayload::RaceFinished { .. } => EventKind::RaceFinished,
            LedgerEventPayload::BetPlaced { .. } => EventKind::BetPlaced,
            LedgerEventPayload::BettingPoolSettled { .. } => EventKind::BettingPoolSettled,
        }
    }
}

/// A cache mutation, broadcast on the
/// [`NotificationBus`](super::NotificationBus) after it was written.
#[derive(Debug, Clone)]
pub enum Notification {
    RaceCreated(Arc<Race>),
    RaceFinished(Arc<Race>),
    BettingUpdated(Arc<BettingPool>),
    BettingSettled(Arc<BettingPool>),
}

impl Notification {
    pub fn race_id(&self) -> RaceId {
        match self {
            Notification::RaceCreated(race) | Notification::RaceFinished(race) => race.race_id,
            Notification::BettingUpdated(pool) | Notification::BettingSettled(pool) => {
                pool.race_id
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Notification::RaceCreated(_) => "raceCreated",
            Notification::RaceFinished(_) => "raceFinished",
            Notification::BettingUpdated(_) => "bettingUpdated",
            Notification::BettingSettled(_) => "bettingSettled",
        }
    }
}

impl From<&Notification> for WsServerMessage {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::RaceCreated(race) => WsServerMessage::RaceCreated {
                race: race.as_ref().into(),
            },
            Notification::RaceFinished(race) => WsServerMessage::RaceFinished {
                race: race.as_ref().into(),
            },
            Notification::BettingUpdated(pool) => WsServerMessage::BettingUpdated {
                pool: pool.as_ref().into(),
            },
            Notification::BettingSettled(pool) => WsServerMessage::BettingSettled {
                pool: pool.as_ref().into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format_ignores_extra_arguments() {
        let event: LedgerEvent = serde_json::from_str(
            r#"{"blockNumber":42,"logIndex":1,"kind":"BetPlaced","raceId":9,
                "bettor":"0xabc","tokenId":101,"amount":"1000"}"#,
        )
        .unwrap();
        assert_eq!(event.block_number, 42);
        assert_eq!(event.kind(), EventKind::BetPlaced);
        assert_eq!(event.race_id(), 9);
    }

    #[test]
    fn test_event_kind_names_match_wire_tags() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
