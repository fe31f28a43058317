//! 供应商监控管道

use crate::config::{AnalyzerKind, MonitorConfig};
use crate::news::{NewsOutcome, NewsSearch, NewsSearchFetcher};
use crate::retry::{Backoff, RetryPolicy};
use crate::stats::RunStatistics;
use crate::stock::MarketDataFetcher;
use crate::types::{
    Article, ErrorKind, FetchError, HeadlineReportRow, MonitorError, MonitorResult, StockReportRow,
    Vendor, VendorRecord, VendorResult,
};
use futures::FutureExt;
use market::{HistorySource, YahooChartClient};
use sentiment::{
    aggregate, score_text, LexiconClassifier, ModelClassifier, ModelSource, SentimentClassifier,
    SentimentLabel,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 控制台显示标题的最大长度
const HEADLINE_DISPLAY_CHARS: usize = 75;

/// 一次运行的产出
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stock_rows: Vec<StockReportRow>,
    pub headline_rows: Vec<HeadlineReportRow>,
    pub stats: RunStatistics,
    /// 是否被外部中断
    pub interrupted: bool,
}

/// 按配置创建情感分类器
///
/// 模型文件不存在时直接报配置错误，不等到首次分类。
pub fn build_classifier(config: &MonitorConfig) -> MonitorResult<Arc<dyn SentimentClassifier>> {
    match config.analyzer {
        AnalyzerKind::Vader => {
            info!("✓ VADER sentiment analyzer initialized");
            Ok(Arc::new(LexiconClassifier::new()))
        }
        AnalyzerKind::Finbert => {
            let source = match &config.model_path {
                Some(path) if !path.is_file() => {
                    return Err(MonitorError::Config(format!(
                        "model file '{}' not found",
                        path.display()
                    )));
                }
                Some(path) => ModelSource::File(path.clone()),
                None => ModelSource::Embedded,
            };
            info!("FinBERT model ({source}) will be loaded on first analysis");
            Ok(Arc::new(ModelClassifier::shared(source)))
        }
    }
}

/// 供应商监控管道
///
/// 供应商严格按顺序处理，同一时刻只有一个外部请求。
pub struct VendorPipeline {
    market: MarketDataFetcher,
    news: NewsSearchFetcher,
    classifier: Arc<dyn SentimentClassifier>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl VendorPipeline {
    pub fn builder() -> VendorPipelineBuilder {
        VendorPipelineBuilder::new()
    }

    /// 处理全部供应商
    ///
    /// 密钥无效时返回错误，其他失败都记入统计并继续。
    pub async fn run(&self, records: &[VendorRecord]) -> MonitorResult<RunReport> {
        let total = records.len();
        let mut report = RunReport { stats: RunStatistics::new(total), ..Default::default() };
        let mut shutdown = self.shutdown.clone();

        info!("Processing {} vendors...", total);

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;

            if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
                report.interrupted = true;
                break;
            }

            let Some(vendor) = record.normalize() else {
                warn!("Skipping row {}: missing symbol", row);
                report.stats.record_skipped();
                continue;
            };

            info!("[{}/{}] Processing {} - {}", row, total, vendor.symbol, vendor.company_name);

            let work = AssertUnwindSafe(self.process_vendor(&vendor))
                .catch_unwind()
                .map(|caught| {
                    caught.unwrap_or_else(|panic| {
                        Err(FetchError::Unexpected(panic_message(panic.as_ref())))
                    })
                });
            let outcome = match shutdown.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        outcome = work => Some(outcome),
                        _ = wait_for_shutdown(rx) => None,
                    }
                }
                None => Some(work.await),
            };

            match outcome {
                None => {
                    warn!("Interrupted while processing {}, stopping", vendor.symbol);
                    report.interrupted = true;
                    break;
                }
                Some(Ok(result)) => accumulate(&mut report, result),
                Some(Err(e)) if e.kind() == ErrorKind::InvalidCredential => return Err(e.into()),
                Some(Err(e)) => {
                    let message = match e {
                        FetchError::Unexpected(message) => message,
                        other => other.to_string(),
                    };
                    error!("Unexpected error processing vendor {}: {}", row, message);
                    report.stats.record_unexpected(row, &message);
                    let placeholder = VendorResult::unavailable(vendor);
                    report.stock_rows.push(placeholder.stock_row());
                    report.headline_rows.extend(placeholder.headline_rows());
                }
            }
        }

        Ok(report)
    }

    /// 行情 → 新闻 → 打分 → 聚合
    ///
    /// 只有密钥无效会以错误返回；panic 由 `run` 转成 [`FetchError::Unexpected`]。
    async fn process_vendor(&self, vendor: &Vendor) -> Result<VendorResult, FetchError> {
        let quote = self.market.fetch(&vendor.symbol).await;
        if quote.is_available() {
            info!(
                "  Stock: ${:.2} ({:+.2}%) Vol: {}",
                quote.close_price,
                quote.percent_change,
                format_volume(quote.volume)
            );
        } else {
            warn!("  Stock: No data available");
        }

        let articles = match self.news.fetch(&vendor.symbol, &vendor.company_name).await {
            Ok(outcome @ NewsOutcome::Found { .. }) => outcome.into_articles(),
            Ok(NewsOutcome::NotFound | NewsOutcome::RateLimited) => Vec::new(),
            Err(e) => return Err(e),
        };

        if articles.is_empty() {
            info!("  News: No articles available");
            return Ok(VendorResult {
                vendor: vendor.clone(),
                quote,
                articles: Vec::new(),
                aggregated_sentiment: SentimentLabel::NotAvailable,
            });
        }

        info!("  News: Found {} articles", articles.len());
        let scored: Vec<(Article, SentimentLabel)> = articles
            .into_iter()
            .map(|article| {
                let label = score_text(self.classifier.as_ref(), &article.full_text);
                info!("    [{}] {}", label.as_str().to_uppercase(), display_headline(&article.title));
                (article, label)
            })
            .collect();

        let labels: Vec<SentimentLabel> = scored.iter().map(|(_, label)| *label).collect();
        Ok(VendorResult {
            vendor: vendor.clone(),
            quote,
            articles: scored,
            aggregated_sentiment: aggregate(&labels),
        })
    }
}

fn accumulate(report: &mut RunReport, result: VendorResult) {
    let symbol = &result.vendor.symbol;
    report.stats.record_stock(symbol, result.quote.is_available());
    report.stats.record_news(symbol, result.articles.len());
    report.headline_rows.extend(result.headline_rows());
    report.stock_rows.push(result.stock_row());
}

/// 发送端被丢弃后永远不会返回
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 超过 75 个字符的标题截断并加省略号
pub fn display_headline(title: &str) -> String {
    match title.char_indices().nth(HEADLINE_DISPLAY_CHARS) {
        Some((cut, _)) => format!("{}...", &title[..cut]),
        None => title.to_string(),
    }
}

/// 千分位分隔的成交量
pub fn format_volume(volume: u64) -> String {
    let digits = volume.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 管道构建器
pub struct VendorPipelineBuilder {
    config: MonitorConfig,
    history: Option<Arc<dyn HistorySource>>,
    news: Option<Arc<dyn NewsSearch>>,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    backoff: Backoff,
    shutdown: Option<watch::Receiver<bool>>,
}

impl VendorPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            history: None,
            news: None,
            classifier: None,
            backoff: Backoff::default(),
            shutdown: None,
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 行情数据源，默认使用 Yahoo 日线
    pub fn with_history_source(mut self, source: Arc<dyn HistorySource>) -> Self {
        self.history = Some(source);
        self
    }

    /// 新闻搜索，必须设置
    pub fn with_news_search(mut self, search: Arc<dyn NewsSearch>) -> Self {
        self.news = Some(search);
        self
    }

    /// 情感分类器，默认按配置中的分析器创建
    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// 值变为 true 时在当前供应商处停止
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn build(self) -> MonitorResult<VendorPipeline> {
        let config = self.config;
        let retry = RetryPolicy::new(config.max_retries).with_backoff(self.backoff);

        let history = match self.history {
            Some(history) => history,
            None => Arc::new(YahooChartClient::new(Duration::from_secs(config.request_timeout_secs))?),
        };
        let news = self
            .news
            .ok_or_else(|| MonitorError::Config("news search client is not configured".to_string()))?;
        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => build_classifier(&config)?,
        };

        Ok(VendorPipeline {
            market: MarketDataFetcher::new(history, retry).with_window_days(config.history_window_days),
            news: NewsSearchFetcher::new(news, retry, &config),
            classifier,
            shutdown: self.shutdown,
        })
    }
}

impl Default for VendorPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
