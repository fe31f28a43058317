use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use market::{DailyBar, HistorySource, MarketError, MarketResult};
use monitor::{
    Backoff, FetchError, MonitorError, NewsSearch, RawArticle, SearchRequest, SearchResponse,
    VendorPipeline, VendorRecord,
};
use sentiment::{SentimentClassifier, SentimentLabel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// 按代码返回固定收盘价；未知代码返回空历史，`BOOM` 直接 panic，`SLOW` 长时间不返回
struct FakeHistory {
    closes: HashMap<&'static str, Vec<f64>>,
}

impl FakeHistory {
    fn new(entries: &[(&'static str, &[f64])]) -> Arc<Self> {
        Arc::new(Self { closes: entries.iter().map(|(s, c)| (*s, c.to_vec())).collect() })
    }
}

#[async_trait]
impl HistorySource for FakeHistory {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn fetch_history(&self, symbol: &str, _window_days: u32) -> MarketResult<Vec<DailyBar>> {
        if symbol == "BOOM" {
            panic!("history source exploded");
        }
        if symbol == "SLOW" {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if symbol == "DOWN" {
            return Err(MarketError::Status { symbol: symbol.to_string(), status: 503 });
        }
        let closes = self.closes.get(symbol).cloned().unwrap_or_default();
        Ok(closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| DailyBar {
                ts: Utc.with_ymd_and_hms(2024, 11, 4 + i as u32, 21, 0, 0).unwrap(),
                close,
                volume: 100_000,
            })
            .collect())
    }
}

/// 按检索词返回文章；检索词含 `RATE` 时限流，含 `BADKEY` 时密钥无效
struct FakeNews {
    articles: HashMap<&'static str, Vec<&'static str>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FakeNews {
    fn new(entries: &[(&'static str, &[&'static str])]) -> Arc<Self> {
        Arc::new(Self {
            articles: entries.iter().map(|(q, titles)| (*q, titles.to_vec())).collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.query.clone()).collect()
    }
}

#[async_trait]
impl NewsSearch for FakeNews {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.query.contains("RATE") {
            return Err(FetchError::RateLimited("rateLimited".to_string()));
        }
        if request.query.contains("BADKEY") {
            return Err(FetchError::InvalidCredential("apiKeyInvalid".to_string()));
        }

        let titles = self.articles.get(request.query.as_str()).cloned().unwrap_or_default();
        Ok(SearchResponse::ok(titles.into_iter().map(RawArticle::titled).collect()))
    }
}

/// 关键词分类：beat → bullish，miss → bearish，其余 neutral
struct KeywordClassifier;

impl SentimentClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn classify(&self, text: &str) -> SentimentLabel {
        let text = text.to_lowercase();
        if text.contains("beat") {
            SentimentLabel::Bullish
        } else if text.contains("miss") {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

fn pipeline(history: Arc<FakeHistory>, news: Arc<FakeNews>) -> VendorPipeline {
    VendorPipeline::builder()
        .with_history_source(history)
        .with_news_search(news)
        .with_classifier(Arc::new(KeywordClassifier))
        .with_backoff(Backoff::None)
        .build()
        .unwrap()
}

#[tokio::test]
async fn every_vendor_gets_one_stock_row() {
    let history = FakeHistory::new(&[("PCTY", &[100.0, 110.0]), ("FI", &[80.0])]);
    let news = FakeNews::new(&[
        ("Paylocity", &["Paylocity earnings beat", "Paylocity misses on margin", "[Removed]"]),
        ("Fiserv", &["Fiserv misses estimates"]),
    ]);
    let vendors = vec![
        VendorRecord::new("pcty", "Paylocity Holding Corp."),
        VendorRecord::new("FI", "Fiserv"),
        VendorRecord::new("ZZZZ", ""),
    ];

    let report = pipeline(history, news).run(&vendors).await.unwrap();

    assert!(!report.interrupted);
    assert_eq!(report.stock_rows.len(), 3);

    let pcty = &report.stock_rows[0];
    assert_eq!(pcty.symbol, "PCTY");
    assert_eq!(pcty.closeprice, 110.0);
    assert_eq!(pcty.pctchange, 10.0);
    assert_eq!(pcty.sentiment, SentimentLabel::Bullish);

    let fi = &report.stock_rows[1];
    assert_eq!(fi.closeprice, 80.0);
    assert_eq!(fi.pctchange, 0.0);
    assert_eq!(fi.sentiment, SentimentLabel::Bearish);

    let zzzz = &report.stock_rows[2];
    assert_eq!(zzzz.closeprice, 0.0);
    assert_eq!(zzzz.sentiment, SentimentLabel::NotAvailable);

    let headlines: Vec<_> =
        report.headline_rows.iter().map(|r| (r.symbol.as_str(), r.headline.as_str(), r.sentiment)).collect();
    assert_eq!(
        headlines,
        vec![
            ("PCTY", "Paylocity earnings beat", SentimentLabel::Bullish),
            ("PCTY", "Paylocity misses on margin", SentimentLabel::Bearish),
            ("FI", "Fiserv misses estimates", SentimentLabel::Bearish),
            ("ZZZZ", "N/A", SentimentLabel::NotAvailable),
        ]
    );

    let stats = &report.stats;
    assert_eq!(stats.total_vendors, 3);
    assert_eq!(stats.stock_successes, 2);
    assert_eq!(stats.stock_failures, 1);
    assert_eq!(stats.news_successes, 2);
    assert_eq!(stats.news_failures, 1);
    assert_eq!(stats.total_headlines, 3);
    assert_eq!(stats.errors, vec!["ZZZZ: No stock data available", "ZZZZ: No articles found"]);
}

#[tokio::test]
async fn stock_failure_still_emits_sentinel_row() {
    let history = FakeHistory::new(&[]);
    let news = FakeNews::new(&[("Paychex", &["Paychex beats"])]);

    let report = pipeline(history, news).run(&[VendorRecord::new("DOWN", "Paychex")]).await.unwrap();

    let row = &report.stock_rows[0];
    assert_eq!((row.closeprice, row.pctchange, row.volume), (0.0, 0.0, 0));
    assert_eq!(row.sentiment, SentimentLabel::Bullish);
    assert_eq!(report.stats.stock_failures, 1);
    assert_eq!(report.stats.news_successes, 1);
}

#[tokio::test]
async fn rate_limit_only_affects_one_vendor() {
    let history = FakeHistory::new(&[("RATE", &[10.0]), ("ADP", &[250.0])]);
    let news = FakeNews::new(&[("ADP", &["ADP beats on payroll growth"])]);
    let vendors = vec![VendorRecord::new("RATE", "RATE Limited"), VendorRecord::new("ADP", "")];

    let report = pipeline(history, news.clone()).run(&vendors).await.unwrap();

    // 限流后不再尝试后续检索词
    assert_eq!(news.queries(), vec!["RATE", "ADP"]);
    assert_eq!(report.stock_rows.len(), 2);
    assert_eq!(report.stock_rows[0].sentiment, SentimentLabel::NotAvailable);
    assert_eq!(report.stock_rows[1].sentiment, SentimentLabel::Bullish);
    assert_eq!(report.headline_rows[0].headline, "N/A");
    assert_eq!(report.stats.news_failures, 1);
}

#[tokio::test]
async fn invalid_credential_halts_run() {
    let history = FakeHistory::new(&[("PCTY", &[110.0])]);
    let news = FakeNews::new(&[]);
    let vendors = vec![VendorRecord::new("BADKEY", ""), VendorRecord::new("PCTY", "")];

    let result = pipeline(history, news.clone()).run(&vendors).await;

    assert!(matches!(result, Err(MonitorError::InvalidCredential(_))));
    assert_eq!(news.queries(), vec!["BADKEY"]);
}

#[tokio::test]
async fn empty_symbols_are_skipped() {
    let history = FakeHistory::new(&[("PCTY", &[110.0])]);
    let news = FakeNews::new(&[]);
    let vendors = vec![VendorRecord::new("  ", "Nameless Corp"), VendorRecord::new("PCTY", "")];

    let report = pipeline(history, news).run(&vendors).await.unwrap();

    assert_eq!(report.stats.total_vendors, 2);
    assert_eq!(report.stats.skipped_vendors, 1);
    assert_eq!(report.stock_rows.len(), 1);
    assert_eq!(report.stock_rows[0].symbol, "PCTY");
}

#[tokio::test]
async fn panicking_vendor_gets_placeholder_rows() {
    let history = FakeHistory::new(&[("PCTY", &[110.0])]);
    let news = FakeNews::new(&[("PCTY", &["PCTY beats"])]);
    let vendors = vec![VendorRecord::new("BOOM", "Boom Inc."), VendorRecord::new("PCTY", "")];

    let report = pipeline(history, news).run(&vendors).await.unwrap();

    assert_eq!(report.stock_rows.len(), 2);
    assert_eq!(report.stock_rows[0].symbol, "BOOM");
    assert_eq!(report.stock_rows[0].closeprice, 0.0);
    assert_eq!(report.headline_rows[0].headline, "N/A");
    assert_eq!(report.stock_rows[1].sentiment, SentimentLabel::Bullish);
    assert_eq!(report.stats.errors, vec!["Row 1: Unexpected error - history source exploded"]);
}

#[tokio::test]
async fn shutdown_stops_before_next_vendor() {
    let history = FakeHistory::new(&[("PCTY", &[110.0])]);
    let news = FakeNews::new(&[]);
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let pipeline = VendorPipeline::builder()
        .with_history_source(history)
        .with_news_search(news.clone())
        .with_classifier(Arc::new(KeywordClassifier))
        .with_backoff(Backoff::None)
        .with_shutdown(rx)
        .build()
        .unwrap();

    let report = pipeline.run(&[VendorRecord::new("PCTY", "")]).await.unwrap();

    assert!(report.interrupted);
    assert!(report.stock_rows.is_empty());
    assert!(news.queries().is_empty());
}

#[tokio::test]
async fn shutdown_abandons_vendor_in_flight() {
    let history = FakeHistory::new(&[("PCTY", &[110.0]), ("FI", &[80.0])]);
    let news = FakeNews::new(&[("PCTY", &["PCTY beats"])]);
    let (tx, rx) = watch::channel(false);

    let pipeline = VendorPipeline::builder()
        .with_history_source(history)
        .with_news_search(news.clone())
        .with_classifier(Arc::new(KeywordClassifier))
        .with_backoff(Backoff::None)
        .with_shutdown(rx)
        .build()
        .unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
    });

    let vendors = vec![
        VendorRecord::new("PCTY", ""),
        VendorRecord::new("SLOW", "Slow Corp"),
        VendorRecord::new("FI", "Fiserv"),
    ];
    let started = Instant::now();
    let report = pipeline.run(&vendors).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.interrupted);
    // 已完成的供应商保留，进行中的和之后的都不输出
    let symbols: Vec<_> = report.stock_rows.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["PCTY"]);
    assert_eq!(report.headline_rows.len(), 1);
    assert_eq!(news.queries(), vec!["PCTY"]);
}
