//! 运行配置

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 优先检索的美国财经媒体
pub const BUSINESS_DOMAINS: [&str; 12] = [
    "wsj.com",
    "cnbc.com",
    "bloomberg.com",
    "reuters.com",
    "marketwatch.com",
    "barrons.com",
    "ft.com",
    "businessinsider.com",
    "seekingalpha.com",
    "fool.com",
    "investors.com",
    "finance.yahoo.com",
];

/// 情感分析器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// 词典方法，速度快
    #[default]
    #[serde(alias = "lexicon")]
    Vader,
    /// 模型方法，首次使用时加载参数
    #[serde(alias = "model")]
    Finbert,
}

impl FromStr for AnalyzerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vader" | "lexicon" => Ok(AnalyzerKind::Vader),
            "finbert" | "model" => Ok(AnalyzerKind::Finbert),
            other => Err(format!("unknown analyzer '{other}', expected 'vader' or 'finbert'")),
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerKind::Vader => write!(f, "vader"),
            AnalyzerKind::Finbert => write!(f, "finbert"),
        }
    }
}

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 供应商列表（CSV）
    pub input: PathBuf,
    /// 报表输出目录
    pub output_dir: PathBuf,
    /// 日志目录
    pub log_dir: PathBuf,
    pub analyzer: AnalyzerKind,
    /// 模型参数文件，未指定时使用内置参数
    pub model_path: Option<PathBuf>,
    /// 每个供应商最多保留的文章数
    pub max_articles: usize,
    /// 每次请求的最大尝试次数
    pub max_retries: u32,
    /// 行情窗口（交易日）
    pub history_window_days: u32,
    pub request_timeout_secs: u64,
    /// 新闻接口客户端限流
    pub news_requests_per_minute: u32,
    pub language: String,
    pub sort_by: String,
    pub domains: Vec<String>,
}

impl MonitorConfig {
    /// 逗号分隔的域名列表，作为新闻搜索参数
    pub fn domains_param(&self) -> String {
        self.domains.join(",")
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("vendors.csv"),
            output_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
            analyzer: AnalyzerKind::Vader,
            model_path: None,
            max_articles: 10,
            max_retries: 3,
            history_window_days: 5,
            request_timeout_secs: 30,
            news_requests_per_minute: 30,
            language: "en".to_string(),
            sort_by: "publishedAt".to_string(),
            domains: BUSINESS_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}
