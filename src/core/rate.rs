//! Exchange rate lookup abstractions.

use async_trait::async_trait;
use thiserror::Error;

/// Why a rate lookup produced no value.
///
/// Callers that only care about presence collapse this to "rate unknown";
/// the reason still reaches the logs.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed rate payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch the current bid price for the configured currency pair.
    async fn fetch_rate(&self) -> Result<f64, RateError>;
}
