//! Ledger storage abstractions.
//!
//! A store keeps the two entry tables durable and publishes live views over
//! them: an ordered snapshot per table plus a running sum. Views are
//! `tokio::sync::watch` channels, so every observer shares one underlying
//! query and late subscribers resume from the last published value.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::core::entry::{Entry, EntryKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {kind} entry with id {id}")]
    NotFound { kind: EntryKind, id: u64 },
    #[error("storage backend error: {0}")]
    Backend(#[from] fjall::Error),
    #[error("corrupt stored entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Keyed storage for income and expense entries.
///
/// Writes are serialized internally; no call blocks the caller beyond its own
/// await. `entries` snapshots replace each other wholesale (no diffing) and
/// are ordered newest first. `sum` mirrors SQL `SUM`: `None` while the table
/// is empty.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persists `entry` and returns it with its assigned id.
    async fn insert(&self, kind: EntryKind, entry: Entry) -> Result<Entry, StoreError>;

    /// Replaces the stored entry with the same id.
    async fn update(&self, kind: EntryKind, entry: &Entry) -> Result<(), StoreError>;

    /// Removes the stored entry with the same id.
    async fn delete(&self, kind: EntryKind, entry: &Entry) -> Result<(), StoreError>;

    /// Live ordered snapshot of one table, re-emitted on every change.
    fn entries(&self, kind: EntryKind) -> watch::Receiver<Vec<Entry>>;

    /// Live sum of one table's amounts, re-emitted on every change.
    fn sum(&self, kind: EntryKind) -> watch::Receiver<Option<f64>>;
}
