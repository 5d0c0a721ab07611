use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single ledger record: one income or expense line.
///
/// An `id` of 0 marks an entry that has not been persisted yet; the store
/// assigns a fresh non-zero id on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub amount: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    /// Creates an unpersisted entry stamped with the current time.
    pub fn new(amount: f64, description: impl Into<String>) -> Self {
        Entry {
            id: 0,
            amount,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The two ledger categories. Each kind is stored in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    /// Table name used by persistent stores and log messages.
    pub fn table(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Income => "Income",
            EntryKind::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
