use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::types::chart::ChartResponse;
use crate::{create_http_client, DailyBar, HistorySource, MarketError, MarketResult};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily history from the public Yahoo Finance chart endpoint.
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(timeout: Duration) -> MarketResult<Self> {
        Ok(Self { client: create_http_client(timeout)?, base_url: DEFAULT_BASE_URL.to_string() })
    }

    pub fn with_base_url(timeout: Duration, base_url: impl Into<String>) -> MarketResult<Self> {
        Ok(Self { client: create_http_client(timeout)?, base_url: base_url.into() })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url.trim_end_matches('/'), symbol)
    }
}

#[async_trait]
impl HistorySource for YahooChartClient {
    fn provider(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_history(&self, symbol: &str, window_days: u32) -> MarketResult<Vec<DailyBar>> {
        let range = format!("{window_days}d");
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("range", range.as_str()), ("interval", "1d")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("chart {symbol} -> {status} ({} bytes)", body.len());

        // Unknown symbols come back as 404 with a chart error body.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(MarketError::Status { symbol: symbol.to_string(), status: status.as_u16() });
        }

        let payload: ChartResponse = serde_json::from_str(&body)?;
        payload.into_bars()
    }
}
