mod helpers;
pub mod types;
mod yahoo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use helpers::create_http_client;
pub use yahoo::YahooChartClient;

pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Failed to send request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unexpected status {status} while fetching {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("Malformed chart payload: {0}")]
    Malformed(String),

    #[error("{0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl MarketError {
    /// Malformed payloads will not improve on a retry; everything else might.
    pub fn is_transient(&self) -> bool {
        !matches!(self, MarketError::Malformed(_) | MarketError::Serde(_))
    }
}

impl From<String> for MarketError {
    fn from(value: String) -> Self {
        MarketError::Custom(value)
    }
}

/// One daily candle. Only close and volume are consumed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub ts: DateTime<Utc>,
    pub close: f64,
    pub volume: u64,
}

/// Source of recent daily price history for a ticker.
///
/// Bars come back oldest first. An empty vector means the provider has no
/// data for the symbol, which is not an error.
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn fetch_history(&self, symbol: &str, window_days: u32) -> MarketResult<Vec<DailyBar>>;
}
