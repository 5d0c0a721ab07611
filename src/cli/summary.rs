use anyhow::Result;
use std::time::Duration;

use super::ui;
use crate::config::AppConfig;
use crate::tracker::BalanceTracker;

/// Point-in-time view of the live balances, for rendering and sharing.
#[derive(Debug)]
pub struct BalanceSummary {
    pub local: f64,
    pub converted: f64,
    pub rate: Option<f64>,
    pub local_currency: String,
    pub foreign_currency: String,
    pub pair: String,
}

impl BalanceSummary {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell(""), ui::header_cell("Amount")]);
        table.add_row(vec![
            comfy_table::Cell::new(format!("Balance ({})", self.local_currency)),
            ui::amount_cell(self.local, true),
        ]);
        table.add_row(vec![
            comfy_table::Cell::new(format!("Balance ({})", self.foreign_currency)),
            ui::amount_cell(self.converted, true),
        ]);

        let rate_line = match self.rate {
            Some(rate) => format!(
                "Rate ({}): {}",
                self.pair,
                ui::style_text(&format!("{rate:.4}"), ui::StyleType::TotalValue)
            ),
            None => format!(
                "Rate ({}): {}",
                self.pair,
                ui::style_text("unavailable", ui::StyleType::Error)
            ),
        };

        format!(
            "{}\n\n{}\n\n{}",
            ui::style_text("Balance summary", ui::StyleType::Title),
            table,
            rate_line
        )
    }

    /// Plain-text block suitable for pasting into a message.
    pub fn share_text(&self) -> String {
        let rate = match self.rate {
            Some(rate) => format!("{} rate: {rate:.4}", self.pair),
            None => "rate unavailable".to_string(),
        };
        format!(
            "Financial summary\n\nBalance ({}): {:.2}\nBalance ({}): {:.2}\n({rate})",
            self.local_currency, self.local, self.foreign_currency, self.converted,
        )
    }
}

/// Refreshes the exchange rate, waits for the live values to catch up and
/// prints the summary.
pub async fn run(tracker: &BalanceTracker, config: &AppConfig) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rate...");

    // Subscribe before triggering the refresh so the recomputation that
    // follows the rate overwrite is observed, whatever its outcome.
    let mut converted = tracker.converted_balance();
    converted.borrow_and_update();

    tracker.refresh_rate();
    tracker.settle().await;
    let _ = tokio::time::timeout(Duration::from_millis(500), converted.changed()).await;

    spinner.finish_and_clear();

    let summary = BalanceSummary {
        local: *tracker.local_balance().borrow(),
        converted: *converted.borrow(),
        rate: *tracker.rate().borrow(),
        local_currency: config.local_currency().to_string(),
        foreign_currency: config.foreign_currency().to_string(),
        pair: config.pair.clone(),
    };

    println!("{}", summary.display_as_table());
    println!("\n{}", summary.share_text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rate: Option<f64>) -> BalanceSummary {
        BalanceSummary {
            local: 300.0,
            converted: rate.map_or(0.0, |r| 300.0 / r),
            rate,
            local_currency: "BRL".to_string(),
            foreign_currency: "USD".to_string(),
            pair: "USD-BRL".to_string(),
        }
    }

    #[test]
    fn test_share_text_with_rate() {
        let text = summary(Some(5.0)).share_text();
        assert!(text.contains("Balance (BRL): 300.00"));
        assert!(text.contains("Balance (USD): 60.00"));
        assert!(text.contains("USD-BRL rate: 5.0000"));
    }

    #[test]
    fn test_share_text_without_rate() {
        let text = summary(None).share_text();
        assert!(text.contains("Balance (USD): 0.00"));
        assert!(text.contains("rate unavailable"));
    }

    #[test]
    fn test_table_marks_missing_rate() {
        let rendered = summary(None).display_as_table();
        assert!(rendered.contains("unavailable"));
        assert!(rendered.contains("Balance (BRL)"));
    }
}
