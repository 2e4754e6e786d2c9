// Ordered bid history for the active auction round.

use serde::{Deserialize, Serialize};

use crate::model::BidRecord;

/// Append-only list of accepted bids, reversible by popping the tail.
///
/// The ledger does no validation of its own; the state machine checks a bid
/// before appending it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidLedger {
    records: Vec<BidRecord>,
}

impl BidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: BidRecord) {
        self.records.push(record);
    }

    /// Remove and return the most recent bid. `None` when already empty.
    pub fn pop_last(&mut self) -> Option<BidRecord> {
        self.records.pop()
    }

    pub fn last(&self) -> Option<&BidRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[BidRecord] {
        &self.records
    }
}
