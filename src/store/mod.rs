pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use tokio::sync::watch;

use crate::core::entry::Entry;

/// Live views over one entry table: an ordered snapshot plus a running sum.
///
/// Both channels retain the last published value, so any number of observers
/// can subscribe without re-running the underlying query, and a late
/// subscriber starts from the current state.
pub(crate) struct LiveTable {
    entries: watch::Sender<Vec<Entry>>,
    sum: watch::Sender<Option<f64>>,
}

impl LiveTable {
    pub(crate) fn new() -> Self {
        let (entries, _) = watch::channel(Vec::new());
        let (sum, _) = watch::channel(None);
        LiveTable { entries, sum }
    }

    /// Publishes a new snapshot, newest first. An empty table sums to `None`,
    /// mirroring SQL `SUM`.
    pub(crate) fn publish(&self, mut snapshot: Vec<Entry>) {
        snapshot.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        let sum = if snapshot.is_empty() {
            None
        } else {
            Some(snapshot.iter().map(|e| e.amount).sum())
        };
        self.entries.send_replace(snapshot);
        self.sum.send_replace(sum);
    }

    pub(crate) fn entries(&self) -> watch::Receiver<Vec<Entry>> {
        self.entries.subscribe()
    }

    pub(crate) fn sum(&self) -> watch::Receiver<Option<f64>> {
        self.sum.subscribe()
    }
}
