//! 新闻搜索模块

pub mod fetcher;
pub mod newsapi;

pub use fetcher::{NewsOutcome, NewsSearchFetcher};
pub use newsapi::NewsApiClient;

use crate::types::FetchError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// 公司名后缀，按从长到短排列，只去掉第一个匹配项
pub const CORPORATE_SUFFIXES: [&str; 19] = [
    " Holding Corporation",
    " Holding Corp.",
    " Corporation",
    " Incorporated",
    " Holdings",
    " Company",
    " Limited",
    " Corp.",
    " Corp",
    " Inc.",
    " Inc",
    " Co.",
    " Co",
    " Ltd.",
    " Ltd",
    " L.L.C.",
    " LLC",
    " PLC",
    " Group",
];

/// 一次搜索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// 逗号分隔的域名；None 表示不限来源
    pub domains: Option<String>,
    pub language: String,
    pub sort_by: String,
    pub page_size: usize,
}

/// 搜索接口返回的文章（字段可能缺失或为 null）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl RawArticle {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }
}

/// 搜索结果页
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

impl SearchResponse {
    pub const STATUS_OK: &'static str = "ok";

    pub fn ok(articles: Vec<RawArticle>) -> Self {
        Self {
            status: Self::STATUS_OK.to_string(),
            total_results: articles.len() as u64,
            articles,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::STATUS_OK
    }
}

/// 新闻搜索接口
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// 数据源名称
    fn provider(&self) -> &'static str;

    /// 执行一次搜索，不做重试
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, FetchError>;
}

/// 限流搜索包装器
pub struct RateLimitedSearch<S: NewsSearch> {
    search: S,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl<S: NewsSearch> RateLimitedSearch<S> {
    pub fn new(search: S, requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Self { search, rate_limiter }
    }

    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }
}

#[async_trait]
impl<S: NewsSearch> NewsSearch for RateLimitedSearch<S> {
    fn provider(&self) -> &'static str {
        self.search.provider()
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, FetchError> {
        self.wait_for_permit().await;
        self.search.search(request).await
    }
}

/// 来源限制级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainTier {
    /// 只搜财经媒体白名单
    Restricted,
    /// 不限来源
    Unrestricted,
}

impl fmt::Display for DomainTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainTier::Restricted => write!(f, "US business sources"),
            DomainTier::Unrestricted => write!(f, "broader search"),
        }
    }
}

/// 级联中的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAttempt {
    pub query: String,
    pub tier: DomainTier,
}

/// 去掉一个公司名后缀；没有匹配时原样返回
pub fn strip_corporate_suffix(company_name: &str) -> &str {
    CORPORATE_SUFFIXES
        .iter()
        .find_map(|suffix| company_name.strip_suffix(suffix))
        .map(str::trim)
        .unwrap_or(company_name)
}

/// 生成检索词：短名、全名、短名 + 代码、代码
pub fn derive_queries(company_name: &str, symbol: &str) -> Vec<String> {
    let mut queries = Vec::with_capacity(4);

    if !company_name.is_empty() {
        let short_name = strip_corporate_suffix(company_name);
        let shortened = short_name != company_name;

        if shortened {
            queries.push(short_name.to_string());
        }
        queries.push(company_name.to_string());
        if shortened {
            queries.push(format!("{short_name} {symbol}"));
        }
    }

    queries.push(symbol.to_string());
    queries
}

/// 每个检索词先限定来源，再放开来源
pub fn plan_attempts(queries: &[String]) -> Vec<SearchAttempt> {
    queries
        .iter()
        .flat_map(|query| {
            [DomainTier::Restricted, DomainTier::Unrestricted]
                .into_iter()
                .map(move |tier| SearchAttempt { query: query.clone(), tier })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_queries_with_suffix() {
        assert_eq!(
            derive_queries("Paylocity Holding Corp.", "PCTY"),
            vec!["Paylocity", "Paylocity Holding Corp.", "Paylocity PCTY", "PCTY"]
        );
    }

    #[test]
    fn test_derive_queries_without_suffix() {
        assert_eq!(derive_queries("Fiserv", "FI"), vec!["Fiserv", "FI"]);
        assert_eq!(derive_queries("", "PCTY"), vec!["PCTY"]);
    }

    #[test]
    fn test_only_first_suffix_is_stripped() {
        assert_eq!(strip_corporate_suffix("Acme Group Holdings"), "Acme Group");
        assert_eq!(strip_corporate_suffix("Workday, Inc."), "Workday,");
        assert_eq!(strip_corporate_suffix("Intuit Inc"), "Intuit");
        // " Corporation" 先于 " Corp" 匹配
        assert_eq!(strip_corporate_suffix("Microsoft Corporation"), "Microsoft");
    }

    #[test]
    fn test_plan_attempts_order() {
        let attempts = plan_attempts(&derive_queries("Fiserv", "FI"));
        let plan: Vec<_> = attempts.iter().map(|a| (a.query.as_str(), a.tier)).collect();
        assert_eq!(
            plan,
            vec![
                ("Fiserv", DomainTier::Restricted),
                ("Fiserv", DomainTier::Unrestricted),
                ("FI", DomainTier::Restricted),
                ("FI", DomainTier::Unrestricted),
            ]
        );
    }

    #[test]
    fn test_parse_search_response() {
        let raw = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"title": "Paylocity beats", "description": null, "content": "Shares rose",
                 "url": "https://example.com/a", "publishedAt": "2024-11-06T12:00:00Z",
                 "source": {"id": null, "name": "Example"}},
                {"title": "[Removed]"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.total_results, 2);
        assert_eq!(response.articles[0].description, None);
        assert_eq!(response.articles[0].published_at.as_deref(), Some("2024-11-06T12:00:00Z"));
        assert_eq!(response.articles[1], RawArticle::titled("[Removed]"));
    }
}
