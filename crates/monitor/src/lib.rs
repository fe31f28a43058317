//! # Monitor
//!
//! 供应商行情与新闻情感监控
//!
//! ## 功能
//!
//! - 行情获取（有界重试 + 指数退避）
//! - 新闻级联检索：检索词逐步放宽，先限定财经媒体再放开来源
//! - 文章情感打分与供应商维度聚合
//! - 运行统计与 CSV 报表

pub mod config;
pub mod news;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod stats;
pub mod stock;
pub mod types;

pub use config::{AnalyzerKind, MonitorConfig, BUSINESS_DOMAINS};
pub use news::{
    derive_queries, plan_attempts, DomainTier, NewsApiClient, NewsOutcome, NewsSearch,
    NewsSearchFetcher, RateLimitedSearch, RawArticle, SearchAttempt, SearchRequest, SearchResponse,
};
pub use pipeline::{build_classifier, RunReport, VendorPipeline, VendorPipelineBuilder};
pub use report::{read_vendors, ReportPaths, ReportWriter};
pub use retry::{Backoff, RetryPolicy};
pub use stats::RunStatistics;
pub use stock::MarketDataFetcher;
pub use types::{
    Article, ErrorKind, FetchError, HeadlineReportRow, MonitorError, MonitorResult, StockQuote,
    StockReportRow, Vendor, VendorRecord, VendorResult,
};
