use anyhow::{Result, bail};
use comfy_table::Cell;

use super::ui;
use crate::core::entry::{Entry, EntryKind};
use crate::tracker::BalanceTracker;

/// Parses user-typed money input. Accepts both `1234.56` and the
/// `1.234,56` comma-decimal style; currency symbols and spaces are ignored.
pub fn parse_amount(text: &str) -> Result<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        bail!("'{text}' is not an amount");
    }

    // A comma anywhere means comma-decimal input, with dots as thousands
    // separators.
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    match normalized.parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => bail!("'{text}' is not an amount"),
    }
}

fn snapshot(tracker: &BalanceTracker, kind: EntryKind) -> Vec<Entry> {
    match kind {
        EntryKind::Income => tracker.income().borrow().clone(),
        EntryKind::Expense => tracker.expenses().borrow().clone(),
    }
}

fn find_entry(tracker: &BalanceTracker, kind: EntryKind, id: u64) -> Result<Entry> {
    match snapshot(tracker, kind).into_iter().find(|e| e.id == id) {
        Some(entry) => Ok(entry),
        None => bail!("no {kind} entry with id {id}"),
    }
}

pub fn render_table(kind: EntryKind, entries: &[Entry], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Date"),
        ui::header_cell("Description"),
        ui::header_cell(&format!("Amount ({currency})")),
    ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(&entry.description),
            ui::amount_cell(entry.amount, false),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(&format!("{} entries", kind.label()), ui::StyleType::Title),
        table
    )
}

/// Records a new entry in the given table.
pub async fn add(
    tracker: &BalanceTracker,
    kind: EntryKind,
    amount_text: &str,
    description: Option<String>,
    currency: &str,
) -> Result<()> {
    let amount = parse_amount(amount_text)?;
    let description = description
        .unwrap_or_else(|| format!("{} of {amount:.2} {currency}", kind.label()));

    match kind {
        EntryKind::Income => tracker.add_income(amount, &description)?,
        EntryKind::Expense => tracker.add_expense(amount, &description)?,
    }
    tracker.settle().await;

    println!(
        "Recorded {}: {} ({currency} {amount:.2})",
        kind,
        ui::style_text(&description, ui::StyleType::TotalLabel),
    );
    Ok(())
}

pub fn list(tracker: &BalanceTracker, kind: EntryKind, currency: &str) {
    let entries = snapshot(tracker, kind);
    if entries.is_empty() {
        println!(
            "{}",
            ui::style_text(&format!("No {kind} entries yet"), ui::StyleType::Subtle)
        );
        return;
    }
    println!("{}", render_table(kind, &entries, currency));
}

/// Rewrites an entry's amount and/or description, keeping its timestamp.
pub async fn edit(
    tracker: &BalanceTracker,
    kind: EntryKind,
    id: u64,
    amount_text: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let mut entry = find_entry(tracker, kind, id)?;

    if let Some(text) = amount_text {
        entry.amount = parse_amount(&text)?;
    }
    if let Some(description) = description {
        entry.description = description;
    }

    match kind {
        EntryKind::Income => tracker.update_income(entry)?,
        EntryKind::Expense => tracker.update_expense(entry)?,
    }
    tracker.settle().await;

    println!("Updated {kind} entry {id}");
    Ok(())
}

pub async fn remove(tracker: &BalanceTracker, kind: EntryKind, id: u64) -> Result<()> {
    let entry = find_entry(tracker, kind, id)?;

    match kind {
        EntryKind::Income => tracker.delete_income(entry),
        EntryKind::Expense => tracker.delete_expense(entry),
    }
    tracker.settle().await;

    println!("Removed {kind} entry {id}");
    Ok(())
}
