use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
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
    partition: PartitionHandle,
    state: Mutex<TableState>,
    live: LiveTable,
}

impl Table {
    fn open(keyspace: &Keyspace, kind: EntryKind) -> Result<Self, StoreError> {
        let partition =
            keyspace.open_partition(kind.table(), PartitionCreateOptions::default())?;

        let mut rows = Vec::new();
        for pair in partition.iter() {
            let (_, value) = pair?;
            rows.push(serde_json::from_slice::<Entry>(&value)?);
        }
        debug!(table = kind.table(), count = rows.len(), "Loaded entries");

        // Ids are monotonic per table, continuing past anything on disk.
        let next_id = rows.iter().map(|e| e.id).max().unwrap_or(0) + 1;

        let live = LiveTable::new();
        live.publish(rows.clone());

        Ok(Table {
            partition,
            state: Mutex::new(TableState { rows, next_id }),
            live,
        })
    }
}

/// Durable entry store on top of a fjall keyspace, one partition per table.
///
/// Entries live under big-endian id keys as JSON values. The full table is
/// held in memory as well; disk is read once at open and written through on
/// every mutation.
pub struct DiskStore {
    keyspace: Keyspace,
    income: Table,
    expense: Table,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let keyspace = fjall::Config::new(path).open()?;
        let income = Table::open(&keyspace, EntryKind::Income)?;
        let expense = Table::open(&keyspace, EntryKind::Expense)?;
        Ok(DiskStore {
            keyspace,
            income,
            expense,
        })
    }

    fn table(&self, kind: EntryKind) -> &Table {
        match kind {
            EntryKind::Income => &self.income,
            EntryKind::Expense => &self.expense,
        }
    }
}

#[async_trait]
impl EntryStore for DiskStore {
    async fn insert(&self, kind: EntryKind, mut entry: Entry) -> Result<Entry, StoreError> {
        let table = self.table(kind);
        let mut state = table.state.lock().await;
        entry.id = state.next_id;
        state.next_id += 1;

        table
            .partition
            .insert(entry.id.to_be_bytes(), serde_json::to_vec(&entry)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        debug!(id = entry.id, table = kind.table(), "Inserted entry");
        state.rows.push(entry.clone());
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

        table
            .partition
            .insert(entry.id.to_be_bytes(), serde_json::to_vec(entry)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        debug!(id = entry.id, table = kind.table(), "Updated entry");
        *row = entry.clone();
        table.live.publish(state.rows.clone());
        Ok(())
    }

    async fn delete(&self, kind: EntryKind, entry: &Entry) -> Result<(), StoreError> {
        let table = self.table(kind);
        let mut state = table.state.lock().await;
        if !state.rows.iter().any(|row| row.id == entry.id) {
            return Err(StoreError::NotFound {
                kind,
                id: entry.id,
            });
        }

        table.partition.remove(entry.id.to_be_bytes())?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        debug!(id = entry.id, table = kind.table(), "Deleted entry");
        state.rows.retain(|row| row.id != entry.id);
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
