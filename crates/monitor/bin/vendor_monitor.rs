//! vendor-monitor CLI - vendor stock and news sentiment reports

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use monitor::news::newsapi::mask_key;
use monitor::report::log_file_name;
use monitor::{
    read_vendors, AnalyzerKind, MonitorConfig, MonitorError, NewsApiClient, RateLimitedSearch,
    ReportWriter, VendorPipeline,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const EXIT_INTERRUPTED: u8 = 130;
const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

const EXAMPLES: &str = "\
Examples:
  # Lexicon analyzer (fast, default)
  vendor-monitor

  # Model analyzer with custom paths
  vendor-monitor --analyzer finbert --output ./reports --log-path ./logs

  # All options
  vendor-monitor -i vendors.csv -o ./reports -l ./logs -a finbert

The NewsAPI key is read from NEWSAPI_KEY (a .env file is loaded if present).";

#[derive(Parser, Debug)]
#[command(name = "vendor-monitor", version)]
#[command(about = "Monitor vendor company stocks and news with sentiment analysis")]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Input CSV file with vendor data
    #[arg(short, long, env = "VENDOR_MONITOR_INPUT", default_value = "vendors.csv")]
    input: PathBuf,

    /// Output directory for CSV reports (default: current directory)
    #[arg(short, long, env = "VENDOR_MONITOR_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory for log files (default: current directory)
    #[arg(short, long, env = "VENDOR_MONITOR_LOG_PATH")]
    log_path: Option<PathBuf>,

    /// Sentiment analysis method: "vader" (lexicon) or "finbert" (model)
    #[arg(short, long, env = "VENDOR_MONITOR_ANALYZER", default_value = "vader")]
    analyzer: AnalyzerKind,

    /// Model parameter file for the finbert analyzer (default: embedded model)
    #[arg(long, env = "VENDOR_MONITOR_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Maximum articles kept per vendor
    #[arg(long, env = "VENDOR_MONITOR_MAX_ARTICLES", default_value_t = 10)]
    max_articles: usize,

    /// Maximum attempts per request
    #[arg(long, env = "VENDOR_MONITOR_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        let defaults = MonitorConfig::default();
        MonitorConfig {
            input: self.input,
            output_dir: self.output.unwrap_or(defaults.output_dir.clone()),
            log_dir: self.log_path.unwrap_or(defaults.log_dir.clone()),
            analyzer: self.analyzer,
            model_path: self.model_path,
            max_articles: self.max_articles,
            max_retries: self.max_retries,
            ..defaults
        }
    }
}

/// 控制台只输出消息；日志文件记录 DEBUG 及以上，带时间和级别
fn init_tracing(log_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_file = log_dir.join(log_file_name(date));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    info!("Log file: {}", log_file.display());
    Ok(log_file)
}

fn load_api_key() -> Result<String> {
    match std::env::var("NEWSAPI_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(MonitorError::InvalidCredential("NEWSAPI_KEY environment variable not set".to_string())
            .into()),
    }
}

/// 致命错误的日志；输入文件错误在读取时已经记录
fn report_fatal(e: &anyhow::Error) {
    match e.downcast_ref::<MonitorError>() {
        Some(MonitorError::InvalidCredential(_)) => {
            error!("{e}");
            error!("Please set your NewsAPI key: export NEWSAPI_KEY='your_key_here'");
            error!("Get a free API key at: https://newsapi.org/register");
        }
        Some(MonitorError::Input(_)) => {}
        Some(MonitorError::Config(_)) => error!("{e:#}"),
        _ => error!("Unexpected fatal error: {e:#}"),
    }
}

/// 返回是否被中断
async fn run(config: MonitorConfig, date: NaiveDate, log_file: &Path) -> Result<bool> {
    info!("{}", RULE);
    info!("Vendor Stock and News Monitoring Script");
    info!("{}", RULE);
    info!("Sentiment analyzer: {}", config.analyzer.to_string().to_uppercase());

    let api_key = load_api_key()?;
    info!("Using NewsAPI key: {}", mask_key(&api_key));

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let newsapi = NewsApiClient::new(api_key, timeout).context("failed to initialize NewsAPI client")?;
    info!("Successfully initialized NewsAPI client");
    let news = RateLimitedSearch::new(newsapi, config.news_requests_per_minute);

    let writer = ReportWriter::new(&config.output_dir, date).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;
    let paths = writer.paths();
    info!("Output directory: {}", config.output_dir.display());
    info!(
        "Output files: {}, {}",
        paths.stock.file_name().unwrap_or_default().to_string_lossy(),
        paths.headline.file_name().unwrap_or_default().to_string_lossy()
    );

    let vendors = read_vendors(&config.input).map_err(|e| {
        error!("{}", e);
        if let Ok(cwd) = std::env::current_dir() {
            error!("Current directory: {}", cwd.display());
        }
        e
    })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Process interrupted by user");
            let _ = shutdown_tx.send(true);
        }
    });

    let pipeline = VendorPipeline::builder()
        .with_config(config)
        .with_news_search(Arc::new(news))
        .with_shutdown(shutdown_rx)
        .build()?;

    info!("{}", THIN_RULE);
    info!("Processing vendors...");
    info!("{}", THIN_RULE);
    let mut report = pipeline.run(&vendors).await?;

    info!("{}", THIN_RULE);
    info!("Writing reports...");
    info!("{}", THIN_RULE);
    writer.write_all(&report.stock_rows, &report.headline_rows, &mut report.stats);

    let log_name = log_file.file_name().unwrap_or_default().to_string_lossy();
    report.stats.log_summary(&log_name);

    Ok(report.interrupted)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = cli.into_config();
    let today = Local::now().date_naive();

    let log_file = match init_tracing(&config.log_dir, today) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(config, today, &log_file).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}
