//! Record of rows a test inserted, so cleanup can delete them again.

use common::Criteria;

/// One row the test caused to exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub table: String,
    /// Filters that select the row for deletion. For tracked inserts this is
    /// the full inserted data.
    pub criteria: Criteria,
}

/// Ordered list of rows to remove during cleanup.
///
/// Entries are independent of each other; they are deleted in the order
/// they were recorded.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, table: impl Into<String>, criteria: Criteria) {
        self.entries.push(LedgerEntry {
            table: table.into(),
            criteria,
        });
    }

    /// Take every entry, leaving the ledger empty.
    pub fn drain(&mut self) -> Vec<LedgerEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_entries_in_record_order() {
        let mut ledger = Ledger::new();
        ledger.record("users", Criteria::new().with("id", 1));
        ledger.record("orders", Criteria::new().with("id", 5));

        let drained = ledger.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].table, "users");
        assert_eq!(drained[1].table, "orders");
        assert!(ledger.is_empty());
    }

    #[test]
    fn second_drain_is_empty() {
        let mut ledger = Ledger::new();
        ledger.record("users", Criteria::new().with("id", 1));
        ledger.drain();
        assert!(ledger.drain().is_empty());
    }

    #[test]
    fn identical_entries_are_kept() {
        let mut ledger = Ledger::new();
        let row = Criteria::new().with("id", 1);
        ledger.record("users", row.clone());
        ledger.record("users", row);
        assert_eq!(ledger.len(), 2);
    }
}
