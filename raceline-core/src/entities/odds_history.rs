use super::unix_millis;
use crate::market::Market;
use raceline_sdk::objects::{MarketResponse, OddsHistoryEntryResponse};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use time::OffsetDateTime;

/// Immutable snapshot of a race's markets at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsHistoryEntry {
    pub timestamp: OffsetDateTime,
    pub markets: Vec<Market>,
    pub total_pool_wei: Decimal,
}

impl From<&OddsHistoryEntry> for OddsHistoryEntryResponse {
    fn from(entry: &OddsHistoryEntry) -> Self {
        OddsHistoryEntryResponse {
            timestamp: unix_millis(entry.timestamp),
            markets: entry.markets.iter().map(MarketResponse::from).collect(),
            total_pool_wei: entry.total_pool_wei,
        }
    }
}

/// Fixed-capacity sequence that evicts its oldest element first.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The most recent `limit` entries, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<T> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
