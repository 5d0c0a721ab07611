//! Live balance aggregation.
//!
//! [`BalanceTracker`] sits between the entry store, the rate provider and
//! whatever presents the numbers. It combines the two live table sums into a
//! running local balance, converts that through the last-known exchange rate,
//! and relays mutation commands to the store as fire-and-forget tasks.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::warn;

use crate::core::entry::{Entry, EntryKind};
use crate::core::rate::RateProvider;
use crate::core::store::EntryStore;

#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),
}

/// Net balance from the two optional table sums; an empty table counts as 0.
fn net(income: Option<f64>, expense: Option<f64>) -> f64 {
    income.unwrap_or(0.0) - expense.unwrap_or(0.0)
}

/// Balance converted through the exchange rate. Defined as 0 whenever no
/// usable rate is known; never an error, never infinity.
fn convert(balance: f64, rate: Option<f64>) -> f64 {
    match rate {
        Some(rate) if rate > 0.0 => balance / rate,
        _ => 0.0,
    }
}

/// One tracker per active session. All observable values are `watch`
/// channels: multicast, last-value-retaining, and a resubscriber resumes from
/// the current value instead of resetting.
///
/// Every task the tracker spawns (balance recomputation, rate fetches,
/// store writes) lives on the ambient Tokio runtime and is aborted when the
/// tracker is dropped.
pub struct BalanceTracker {
    store: Arc<dyn EntryStore>,
    rates: Arc<dyn RateProvider>,
    income: watch::Receiver<Vec<Entry>>,
    expenses: watch::Receiver<Vec<Entry>>,
    rate_tx: Arc<watch::Sender<Option<f64>>>,
    local: watch::Receiver<f64>,
    converted: watch::Receiver<f64>,
    // Combine loops; live for the tracker's lifetime.
    _derive_tasks: Mutex<JoinSet<()>>,
    // In-flight fire-and-forget commands, drained by settle().
    pending: Mutex<JoinSet<()>>,
}

impl BalanceTracker {
    pub fn new(store: Arc<dyn EntryStore>, rates: Arc<dyn RateProvider>) -> Self {
        let income = store.entries(EntryKind::Income);
        let expenses = store.entries(EntryKind::Expense);
        let mut income_sum = store.sum(EntryKind::Income);
        let mut expense_sum = store.sum(EntryKind::Expense);

        let (rate_tx, rate_rx) = watch::channel(None);
        let rate_tx = Arc::new(rate_tx);

        let mut derive_tasks = JoinSet::new();

        // Local balance: combine-latest over the two table sums. The initial
        // value is computed here so a freshly built tracker already reflects
        // whatever the store loaded.
        let (local_tx, local) =
            watch::channel(net(*income_sum.borrow(), *expense_sum.borrow()));
        derive_tasks.spawn(async move {
            loop {
                tokio::select! {
                    changed = income_sum.changed() => if changed.is_err() { break },
                    changed = expense_sum.changed() => if changed.is_err() { break },
                }
                let next = net(
                    *income_sum.borrow_and_update(),
                    *expense_sum.borrow_and_update(),
                );
                local_tx.send_replace(next);
            }
        });

        // Converted balance: combine-latest over the local balance and the
        // last-known rate. Recomputed on every rate overwrite, including a
        // failed fetch replacing a known rate with "unknown".
        let mut local_for_conversion = local.clone();
        let mut rate_for_conversion = rate_rx;
        let (converted_tx, converted) = watch::channel(convert(
            *local_for_conversion.borrow(),
            *rate_for_conversion.borrow(),
        ));
        derive_tasks.spawn(async move {
            loop {
                tokio::select! {
                    changed = local_for_conversion.changed() => if changed.is_err() { break },
                    changed = rate_for_conversion.changed() => if changed.is_err() { break },
                }
                let next = convert(
                    *local_for_conversion.borrow_and_update(),
                    *rate_for_conversion.borrow_and_update(),
                );
                converted_tx.send_replace(next);
            }
        });

        BalanceTracker {
            store,
            rates,
            income,
            expenses,
            rate_tx,
            local,
            converted,
            _derive_tasks: Mutex::new(derive_tasks),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Live ordered snapshot of income entries, newest first.
    pub fn income(&self) -> watch::Receiver<Vec<Entry>> {
        self.income.clone()
    }

    /// Live ordered snapshot of expense entries, newest first.
    pub fn expenses(&self) -> watch::Receiver<Vec<Entry>> {
        self.expenses.clone()
    }

    /// Live `sum(income) - sum(expense)`; 0 before any data arrives.
    pub fn local_balance(&self) -> watch::Receiver<f64> {
        self.local.clone()
    }

    /// Live converted balance; 0 unless a strictly positive rate is known.
    pub fn converted_balance(&self) -> watch::Receiver<f64> {
        self.converted.clone()
    }

    /// Last-known exchange rate; `None` until a fetch succeeds, and again
    /// after any fetch fails.
    pub fn rate(&self) -> watch::Receiver<Option<f64>> {
        self.rate_tx.subscribe()
    }

    /// Triggers one rate fetch. The outcome overwrites the rate cell either
    /// way; the caller only ever observes presence or absence of a value,
    /// failure reasons go to the log.
    pub fn refresh_rate(&self) {
        let rates = Arc::clone(&self.rates);
        let rate_tx = Arc::clone(&self.rate_tx);
        self.spawn(async move {
            let fetched = rates.fetch_rate().await;
            if let Err(reason) = &fetched {
                warn!(%reason, "Exchange rate unavailable");
            }
            rate_tx.send_replace(fetched.ok());
        });
    }

    /// Records an income entry. Amount validation happens here, before the
    /// asynchronous write is issued.
    pub fn add_income(&self, amount: f64, description: &str) -> Result<(), TrackerError> {
        self.add(EntryKind::Income, amount, description)
    }

    /// Records an expense entry.
    pub fn add_expense(&self, amount: f64, description: &str) -> Result<(), TrackerError> {
        self.add(EntryKind::Expense, amount, description)
    }

    pub fn update_income(&self, entry: Entry) -> Result<(), TrackerError> {
        self.update(EntryKind::Income, entry)
    }

    pub fn update_expense(&self, entry: Entry) -> Result<(), TrackerError> {
        self.update(EntryKind::Expense, entry)
    }

    pub fn delete_income(&self, entry: Entry) {
        self.delete(EntryKind::Income, entry)
    }

    pub fn delete_expense(&self, entry: Entry) {
        self.delete(EntryKind::Expense, entry)
    }

    /// Waits for every fire-and-forget command issued so far to finish.
    /// Commands issued while settling are not waited on.
    pub async fn settle(&self) {
        let mut drained = {
            let mut pending = self.pending.lock().unwrap();
            std::mem::take(&mut *pending)
        };
        while let Some(result) = drained.join_next().await {
            if let Err(error) = result {
                warn!(%error, "Background command failed");
            }
        }
    }

    fn add(&self, kind: EntryKind, amount: f64, description: &str) -> Result<(), TrackerError> {
        let entry = Entry::new(checked_amount(amount)?, description);
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            if let Err(error) = store.insert(kind, entry).await {
                warn!(%error, table = kind.table(), "Insert failed");
            }
        });
        Ok(())
    }

    fn update(&self, kind: EntryKind, entry: Entry) -> Result<(), TrackerError> {
        checked_amount(entry.amount)?;
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            if let Err(error) = store.update(kind, &entry).await {
                warn!(%error, table = kind.table(), "Update failed");
            }
        });
        Ok(())
    }

    fn delete(&self, kind: EntryKind, entry: Entry) {
        let store = Arc::clone(&self.store);
        self.spawn(async move {
            if let Err(error) = store.delete(kind, &entry).await {
                warn!(%error, table = kind.table(), "Delete failed");
            }
        });
    }

    fn spawn(&self, command: impl Future<Output = ()> + Send + 'static) {
        let mut pending = self.pending.lock().unwrap();
        // Reap whatever already finished so the set does not grow unbounded.
        while pending.try_join_next().is_some() {}
        pending.spawn(command);
    }
}

/// The tracker is the single validation point for amounts: non-positive and
/// non-finite values are rejected before anything is submitted.
fn checked_amount(amount: f64) -> Result<f64, TrackerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(TrackerError::InvalidAmount(amount))
    }
}
