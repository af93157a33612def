//! In-memory ledger for unit tests.

use super::{Ledger, LedgerError, PoolRecord, RaceRecord, SubmissionHandle, TokenBetRecord};
use crate::entities::{RaceId, TokenId};
use crate::events::{EventKind, LedgerEvent, LedgerEventPayload};
use crate::telemetry::EncodedTelemetry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct MockLedger {
    state: Mutex<MockState>,
    pub fail_reads: AtomicBool,
    pub fail_submissions: AtomicBool,
    pub race_reads: AtomicUsize,
    pub pool_reads: AtomicUsize,
}

#[derive(Default)]
struct MockState {
    races: HashMap<RaceId, RaceRecord>,
    pools: HashMap<RaceId, PoolRecord>,
    odds: HashMap<(RaceId, TokenId), u64>,
    events: Vec<LedgerEvent>,
    head: u64,
    submissions: Vec<(RaceId, TokenId, EncodedTelemetry)>,
}

pub(crate) fn race_record(race_id: RaceId, participants: &[TokenId]) -> RaceRecord {
    RaceRecord {
        race_id,
        participant_token_ids: participants.to_vec(),
        bot_token_ids: Vec::new(),
        total_laps: 3,
        start_time: 1_700_000_000 + race_id as i64,
        end_time: 0,
        is_active: true,
        is_finished: false,
        winner_token_id: 0,
        total_distance: 3_000,
    }
}

pub(crate) fn pool_record(total: u64, bets: &[(TokenId, u64)], is_settled: bool) -> PoolRecord {
    PoolRecord {
        total_pool: total.to_string(),
        is_settled,
        token_bets: bets
            .iter()
            .map(|(token_id, amount)| TokenBetRecord {
                token_id: *token_id,
                amount: amount.to_string(),
            })
            .collect(),
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_race(&self, record: RaceRecord) {
        self.lock().races.insert(record.race_id, record);
    }

    pub fn set_pool(&self, race_id: RaceId, record: PoolRecord) {
        self.lock().pools.insert(race_id, record);
    }

    pub fn set_odds(&self, race_id: RaceId, token_id: TokenId, odds: u64) {
        self.lock().odds.insert((race_id, token_id), odds);
    }

    pub fn set_head(&self, head: u64) {
        self.lock().head = head;
    }

    /// Append an event at `block_number` and move the head up to it.
    pub fn push_event(&self, block_number: u64, payload: LedgerEventPayload) {
        let mut state = self.lock();
        let log_index = state
            .events
            .iter()
            .filter(|e| e.block_number == block_number)
            .count() as u32;
        state.events.push(LedgerEvent {
            block_number,
            log_index,
            payload,
        });
        state.head = state.head.max(block_number);
    }

    pub fn submissions(&self) -> Vec<(RaceId, TokenId, EncodedTelemetry)> {
        self.lock().submissions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_reads(&self) -> Result<(), LedgerError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc {
                code: -32000,
                message: "ledger unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_race(&self, race_id: RaceId) -> Result<RaceRecord, LedgerError> {
        self.race_reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        self.lock()
            .races
            .get(&race_id)
            .cloned()
            .ok_or(LedgerError::RaceNotFound(race_id))
    }

    async fn get_betting_pool(&self, race_id: RaceId) -> Result<PoolRecord, LedgerError> {
        self.pool_reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self
            .lock()
            .pools
            .get(&race_id)
            .cloned()
            .unwrap_or_else(|| pool_record(0, &[], false)))
    }

    async fn get_odds(&self, race_id: RaceId, token_id: TokenId) -> Result<u64, LedgerError> {
        self.check_reads()?;
        Ok(self
            .lock()
            .odds
            .get(&(race_id, token_id))
            .copied()
            .unwrap_or(0))
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.check_reads()?;
        Ok(self.lock().head)
    }

    async fn query_events(
        &self,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.check_reads()?;
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| e.kind() == kind)
            .filter(|e| (from_block..=to_block).contains(&e.block_number))
            .cloned()
            .collect())
    }

    async fn submit_telemetry_update(
        &self,
        race_id: RaceId,
        token_id: TokenId,
        telemetry: EncodedTelemetry,
    ) -> Result<SubmissionHandle, LedgerError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            });
        }
        let mut state = self.lock();
        state.submissions.push((race_id, token_id, telemetry));
        Ok(SubmissionHandle::new(format!("0x{:064x}", state.submissions.len())))
    }
}
