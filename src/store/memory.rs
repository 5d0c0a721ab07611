use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use super::LiveTable;
use crate::core::entry::{Entry, EntryKind};
use crate::core::store::{EntryStore, StoreError};

struct TableState {
    rows: Vec<Entry>,
    next_id: u64,
}

struct Table {
    state: Mutex<TableState>,
    live: LiveTable,
}

impl Table {
    fn new() -> Self {
        Table {
            state: Mutex::new(TableState {
                rows: Vec::new(),
                next_id: 1,
            }),
            live: LiveTable::new(),
        }
    }
}

/// In-memory entry store. Nothing survives the process; used by tests and as
/// the store for throwaway sessions.
pub struct MemoryStore {
    income: Table,
    expense: Table,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            income: Table::new(),
            expense: Table::new(),
        }
    }

    fn table(&self, kind: EntryKind) -> &Table {
        match kind {
            EntryKind::Income => &self.income,
            EntryKind::Expense => &self.expense,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert(&self, kind: EntryKind, mut entry: Entry) -> Result<Entry, StoreError> {
        let table = self.table(kind);
        let mut state = table.state.lock().await;
        entry.id = state.next_id;
        state.next_id += 1;
        state.rows.push(entry.clone());
        debug!(id = entry.id, table = kind.table(), "Inserted entry");
        table.live.publish(state.rows.clone());
        Ok(entry)
    }

    async fn update(&self, kind: EntryKind, entry: &Entry) -> Result<(), StoreError> {
        let table = self.table(kind);
        let mut state = table.state.lock().await;
        let row = state
            .rows
            .iter_mut()
            .find(|row| row.id == entry.id)
            .ok_or(StoreError::NotFound {
                kind,
                id: entry.id,
            })?;
        *row = entry.clone();
        debug!(id = entry.id, table = kind.table(), "Updated entry");
        table.live.publish(state.rows.clone());
        Ok(())
    }

    async fn delete(&self, kind: EntryKind, entry: &Entry) -> Result<(), StoreError> {
        let table = self.table(kind);
        let mut state = table.state.lock().await;
        let before = state.rows.len();
        state.rows.retain(|row| row.id != entry.id);
        if state.rows.len() == before {
            return Err(StoreError::NotFound {
                kind,
                id: entry.id,
            });
        }
        debug!(id = entry.id, table = kind.table(), "Deleted entry");
        table.live.publish(state.rows.clone());
        Ok(())
    }

    fn entries(&self, kind: EntryKind) -> watch::Receiver<Vec<Entry>> {
        self.table(kind).live.entries()
    }

    fn sum(&self, kind: EntryKind) -> watch::Receiver<Option<f64>> {
        self.table(kind).live.sum()
    }
}
