//! 核心类型定义

use market::MarketError;
use sentiment::SentimentLabel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Invalid NewsAPI key: {0}")]
    InvalidCredential(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Market data client error: {0}")]
    Market(#[from] MarketError),

    #[error("Data source error: {0}")]
    Fetch(FetchError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// 错误分类，编排层按分类决定重试、跳过还是终止
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 网络故障、超时、5xx
    Transient,
    /// 数据源明确表示没有数据
    DataAbsent,
    /// 配额耗尽，当前供应商的新闻搜索立即停止
    RateLimited,
    /// 密钥无效，整个运行终止
    InvalidCredential,
    /// 响应结构不符合预期
    Malformed,
    /// 未预料的错误（含 panic），在供应商边界捕获
    Unexpected,
}

/// 外部数据源调用失败
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("no data: {0}")]
    DataAbsent(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transient(_) => ErrorKind::Transient,
            FetchError::DataAbsent(_) => ErrorKind::DataAbsent,
            FetchError::RateLimited(_) => ErrorKind::RateLimited,
            FetchError::InvalidCredential(_) => ErrorKind::InvalidCredential,
            FetchError::Malformed(_) => ErrorKind::Malformed,
            FetchError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

impl From<MarketError> for FetchError {
    fn from(e: MarketError) -> Self {
        if e.is_transient() {
            FetchError::Transient(e.to_string())
        } else {
            FetchError::Malformed(e.to_string())
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transient(e.to_string())
    }
}

impl From<FetchError> for MonitorError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidCredential(msg) => MonitorError::InvalidCredential(msg),
            other => MonitorError::Fetch(other),
        }
    }
}

/// 输入文件中的一行，未经校验
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRecord {
    pub symbol: String,
    pub company_name: String,
}

impl VendorRecord {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), company_name: company_name.into() }
    }

    /// 规范化；代码为空时返回 None
    pub fn normalize(&self) -> Option<Vendor> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return None;
        }
        Some(Vendor { symbol, company_name: self.company_name.trim().to_string() })
    }
}

/// 供应商（已校验：代码非空、去空白、大写）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub symbol: String,
    pub company_name: String,
}

/// 最新行情
///
/// `close_price == 0.0` 表示行情不可用。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StockQuote {
    pub close_price: f64,
    pub percent_change: f64,
    pub volume: u64,
}

impl StockQuote {
    pub const UNAVAILABLE: StockQuote = StockQuote { close_price: 0.0, percent_change: 0.0, volume: 0 };

    pub fn is_available(&self) -> bool {
        self.close_price > 0.0
    }
}

/// 可评分的新闻文章
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub content: String,
    /// 标题 + 描述 + 正文，用于情感分析
    pub full_text: String,
}

impl Article {
    /// 新闻源屏蔽的文章用这个标题占位
    pub const REMOVED: &'static str = "[Removed]";

    /// 标题为空或被屏蔽时返回 None
    pub fn new(title: &str, description: &str, content: &str) -> Option<Self> {
        if title.is_empty() || title == Self::REMOVED {
            return None;
        }
        let full_text = format!("{title}. {description} {content}").trim().to_string();
        Some(Self {
            title: title.to_string(),
            description: description.to_string(),
            content: content.to_string(),
            full_text,
        })
    }
}

/// 单个供应商的处理结果
#[derive(Debug, Clone)]
pub struct VendorResult {
    pub vendor: Vendor,
    pub quote: StockQuote,
    pub articles: Vec<(Article, SentimentLabel)>,
    pub aggregated_sentiment: SentimentLabel,
}

impl VendorResult {
    /// 行情与新闻都不可用时的占位结果
    pub fn unavailable(vendor: Vendor) -> Self {
        Self {
            vendor,
            quote: StockQuote::UNAVAILABLE,
            articles: Vec::new(),
            aggregated_sentiment: SentimentLabel::NotAvailable,
        }
    }

    pub fn stock_row(&self) -> StockReportRow {
        StockReportRow {
            symbol: self.vendor.symbol.clone(),
            companyname: self.vendor.company_name.clone(),
            closeprice: self.quote.close_price,
            pctchange: self.quote.percent_change,
            volume: self.quote.volume,
            sentiment: self.aggregated_sentiment,
        }
    }

    /// 每篇文章一行；没有文章时输出一行 `N/A` 占位
    pub fn headline_rows(&self) -> Vec<HeadlineReportRow> {
        if self.articles.is_empty() {
            return vec![HeadlineReportRow {
                symbol: self.vendor.symbol.clone(),
                headline: SentimentLabel::NOT_AVAILABLE.to_string(),
                sentiment: SentimentLabel::NotAvailable,
            }];
        }

        self.articles
            .iter()
            .map(|(article, label)| HeadlineReportRow {
                symbol: self.vendor.symbol.clone(),
                headline: article.title.clone(),
                sentiment: *label,
            })
            .collect()
    }
}

/// 行情报表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReportRow {
    pub symbol: String,
    pub companyname: String,
    pub closeprice: f64,
    pub pctchange: f64,
    pub volume: u64,
    pub sentiment: SentimentLabel,
}

impl StockReportRow {
    pub const HEADERS: [&'static str; 6] =
        ["symbol", "companyname", "closeprice", "pctchange", "volume", "sentiment"];
}

/// 标题报表行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineReportRow {
    pub symbol: String,
    pub headline: String,
    pub sentiment: SentimentLabel,
}

impl HeadlineReportRow {
    pub const HEADERS: [&'static str; 3] = ["symbol", "headline", "sentiment"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vendor() {
        let vendor = VendorRecord::new("  pcty ", " Paylocity Holding Corp. ").normalize().unwrap();
        assert_eq!(vendor.symbol, "PCTY");
        assert_eq!(vendor.company_name, "Paylocity Holding Corp.");

        assert!(VendorRecord::new("   ", "Nameless").normalize().is_none());
    }

    #[test]
    fn test_article_full_text() {
        let article = Article::new("Fiserv slashes guidance", "Shares fell", "").unwrap();
        assert_eq!(article.full_text, "Fiserv slashes guidance. Shares fell");

        assert!(Article::new("[Removed]", "x", "y").is_none());
        assert!(Article::new("", "x", "y").is_none());
    }

    #[test]
    fn test_placeholder_rows() {
        let vendor = VendorRecord::new("FI", "Fiserv").normalize().unwrap();
        let result = VendorResult::unavailable(vendor);

        let stock = result.stock_row();
        assert_eq!(stock.closeprice, 0.0);
        assert_eq!(stock.sentiment, SentimentLabel::NotAvailable);

        let headlines = result.headline_rows();
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].headline, "N/A");
        assert_eq!(headlines[0].sentiment, SentimentLabel::NotAvailable);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FetchError::RateLimited("429".into()).kind(), ErrorKind::RateLimited);
        assert_eq!(FetchError::Unexpected("panic".into()).kind(), ErrorKind::Unexpected);
        assert_eq!(
            FetchError::from(MarketError::Malformed("no quote".into())).kind(),
            ErrorKind::Malformed
        );
        assert_eq!(
            FetchError::from(MarketError::Status { symbol: "FI".into(), status: 502 }).kind(),
            ErrorKind::Transient
        );
        assert!(matches!(
            MonitorError::from(FetchError::InvalidCredential("apiKeyInvalid".into())),
            MonitorError::InvalidCredential(_)
        ));
        assert!(matches!(
            MonitorError::from(FetchError::Transient("timeout".into())),
            MonitorError::Fetch(FetchError::Transient(_))
        ));
    }
}
