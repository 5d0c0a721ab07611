use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::rate::{RateError, RateProvider};

pub const DEFAULT_ENDPOINT: &str = "https://economia.awesomeapi.com.br";
pub const DEFAULT_PAIR: &str = "USD-BRL";

// AwesomeAPI quote provider for currency pairs, e.g. USD-BRL.
//
// The endpoint answers `GET /json/last/<PAIR>` with a body keyed by the pair
// without the dash: {"USDBRL": {"bid": "5.25", ...}}. Only the bid price is
// consumed; it arrives as a string and is parsed without rounding.
pub struct AwesomeRateProvider {
    endpoint: String,
    pair: String,
}

#[derive(Debug, Deserialize)]
struct PairQuote {
    bid: Option<String>,
}

impl AwesomeRateProvider {
    pub fn new(endpoint: &str, pair: &str) -> Self {
        AwesomeRateProvider {
            endpoint: endpoint.to_string(),
            pair: pair.to_string(),
        }
    }

    /// Response key for the configured pair ("USD-BRL" -> "USDBRL").
    fn quote_key(&self) -> String {
        self.pair.chars().filter(|c| *c != '-').collect()
    }
}

#[async_trait]
impl RateProvider for AwesomeRateProvider {
    async fn fetch_rate(&self) -> Result<f64, RateError> {
        let url = format!("{}/json/last/{}", self.endpoint, self.pair);
        debug!("Requesting exchange rate from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fintrack/0.1")
            .build()
            .map_err(RateError::Transport)?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(RateError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status));
        }

        let text = response.text().await.map_err(RateError::Transport)?;

        let quotes: HashMap<String, PairQuote> = serde_json::from_str(&text)
            .map_err(|e| RateError::Malformed(format!("undecodable body: {e}")))?;

        let key = self.quote_key();
        let bid = quotes
            .get(&key)
            .ok_or_else(|| RateError::Malformed(format!("no quote for {key}")))?
            .bid
            .as_deref()
            .ok_or_else(|| RateError::Malformed(format!("quote for {key} carries no bid")))?;

        let rate = bid
            .parse::<f64>()
            .map_err(|_| RateError::Malformed(format!("bid is not a number: {bid:?}")))?;

        debug!(rate, pair = %self.pair, "Fetched exchange rate");
        Ok(rate)
    }
}
