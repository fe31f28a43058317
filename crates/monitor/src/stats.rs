//! 运行统计

use serde::Serialize;
use tracing::{info, warn};

/// 汇总中最多列出的错误条数
pub const MAX_LISTED_ERRORS: usize = 5;

const RULE: &str = "============================================================";

/// 运行统计，只由编排层写入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total_vendors: usize,
    pub skipped_vendors: usize,
    pub stock_successes: usize,
    pub stock_failures: usize,
    pub news_successes: usize,
    pub news_failures: usize,
    pub total_headlines: usize,
    pub errors: Vec<String>,
}

impl RunStatistics {
    pub fn new(total_vendors: usize) -> Self {
        Self { total_vendors, ..Default::default() }
    }

    pub fn record_skipped(&mut self) {
        self.skipped_vendors += 1;
    }

    pub fn record_stock(&mut self, symbol: &str, available: bool) {
        if available {
            self.stock_successes += 1;
        } else {
            self.stock_failures += 1;
            self.errors.push(format!("{symbol}: No stock data available"));
        }
    }

    pub fn record_news(&mut self, symbol: &str, headlines: usize) {
        if headlines > 0 {
            self.news_successes += 1;
            self.total_headlines += headlines;
        } else {
            self.news_failures += 1;
            self.errors.push(format!("{symbol}: No articles found"));
        }
    }

    /// 供应商处理过程中的意外错误
    pub fn record_unexpected(&mut self, row: usize, message: &str) {
        self.stock_failures += 1;
        self.news_failures += 1;
        self.errors.push(format!("Row {row}: Unexpected error - {message}"));
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// 汇总中展示的错误，超出部分只给出数量
    pub fn error_digest(&self) -> (&[String], usize) {
        let shown = self.errors.len().min(MAX_LISTED_ERRORS);
        (&self.errors[..shown], self.errors.len() - shown)
    }

    pub fn log_summary(&self, log_file: &str) {
        let total = self.total_vendors;

        info!("{}", RULE);
        info!("SUMMARY");
        info!("{}", RULE);
        info!("Total vendors processed:  {}", total);
        info!("Vendors skipped:          {}", self.skipped_vendors);
        info!("Stock data success:       {}/{}", self.stock_successes, total);
        info!("Stock data failures:      {}/{}", self.stock_failures, total);
        info!("News data success:        {}/{}", self.news_successes, total);
        info!("News data failures:       {}/{}", self.news_failures, total);
        info!("Total headlines fetched:  {}", self.total_headlines);

        if !self.errors.is_empty() {
            warn!("Warnings/Errors: {}", self.errors.len());
            let (shown, hidden) = self.error_digest();
            for error in shown {
                warn!("  - {}", error);
            }
            if hidden > 0 {
                warn!("  ... and {} more (check log file)", hidden);
            }
        }

        info!("{}", RULE);
        info!("Processing complete!");
        info!("Log file: {}", log_file);
        info!("{}", RULE);
    }
}
