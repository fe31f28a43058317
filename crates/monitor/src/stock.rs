//! 行情获取

use crate::retry::RetryPolicy;
use crate::types::{ErrorKind, FetchError, StockQuote};
use market::{DailyBar, HistorySource};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 默认取最近 5 个交易日
pub const DEFAULT_WINDOW_DAYS: u32 = 5;

/// 行情获取器：最新收盘价、涨跌幅、成交量
pub struct MarketDataFetcher {
    source: Arc<dyn HistorySource>,
    retry: RetryPolicy,
    window_days: u32,
}

impl MarketDataFetcher {
    pub fn new(source: Arc<dyn HistorySource>, retry: RetryPolicy) -> Self {
        Self { source, retry, window_days: DEFAULT_WINDOW_DAYS }
    }

    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days.max(1);
        self
    }

    /// 获取行情；任何失败都返回 [`StockQuote::UNAVAILABLE`]
    pub async fn fetch(&self, symbol: &str) -> StockQuote {
        match self.try_fetch(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                match e.kind() {
                    ErrorKind::DataAbsent => warn!("No stock data available for {}", symbol),
                    ErrorKind::Malformed => error!("Invalid data format for {}: {}", symbol, e),
                    _ => error!(
                        "Failed to fetch stock data for {} after {} attempts: {}",
                        symbol, self.retry.max_attempts, e
                    ),
                }
                StockQuote::UNAVAILABLE
            }
        }
    }

    /// 获取行情并保留失败原因
    ///
    /// 只有 `Transient` 会重试；空窗口返回 `DataAbsent`，不重试。
    pub async fn try_fetch(&self, symbol: &str) -> Result<StockQuote, FetchError> {
        let source = &self.source;
        let window_days = self.window_days;
        let label = format!("stock data for {symbol}");
        let max_attempts = self.retry.max_attempts;

        let bars = self
            .retry
            .run(
                &label,
                |attempt| async move {
                    debug!(
                        "Fetching stock data for {} from {} (attempt {}/{})",
                        symbol,
                        source.provider(),
                        attempt + 1,
                        max_attempts
                    );
                    source.fetch_history(symbol, window_days).await.map_err(FetchError::from)
                },
                |e| e.kind() == ErrorKind::Transient,
            )
            .await?;

        let quote = quote_from_bars(&bars)
            .ok_or_else(|| FetchError::DataAbsent(format!("empty history for {symbol}")))?;
        debug!(
            "Successfully fetched stock data for {}: ${} ({:+.2}%)",
            symbol, quote.close_price, quote.percent_change
        );
        Ok(quote)
    }
}

/// 由日线计算行情；没有日线时返回 None
///
/// 涨跌幅使用四舍五入后的最新收盘价与原始的前一日收盘价计算。
pub fn quote_from_bars(bars: &[DailyBar]) -> Option<StockQuote> {
    let latest = bars.last()?;
    let close_price = round2(latest.close);

    let percent_change = match bars.len() {
        0 | 1 => {
            debug!("Only one day of data available, using 0% change");
            0.0
        }
        n => {
            let prev_close = bars[n - 2].close;
            if prev_close == 0.0 {
                0.0
            } else {
                round2((close_price - prev_close) / prev_close * 100.0)
            }
        }
    };

    Some(StockQuote { close_price, percent_change, volume: latest.volume })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
