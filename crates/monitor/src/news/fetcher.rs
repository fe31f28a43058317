//! 级联新闻检索

use super::{derive_queries, plan_attempts, DomainTier, NewsSearch, SearchAttempt, SearchRequest};
use crate::config::MonitorConfig;
use crate::retry::RetryPolicy;
use crate::types::{Article, ErrorKind, FetchError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 一次供应商新闻检索的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsOutcome {
    /// 在 `attempt` 这一步找到了可用文章
    Found { articles: Vec<Article>, attempt: SearchAttempt },
    /// 所有检索词和来源都试过了
    NotFound,
    /// 触发限流，放弃当前供应商
    RateLimited,
}

impl NewsOutcome {
    pub fn into_articles(self) -> Vec<Article> {
        match self {
            NewsOutcome::Found { articles, .. } => articles,
            NewsOutcome::NotFound | NewsOutcome::RateLimited => Vec::new(),
        }
    }
}

/// 新闻检索器
///
/// 按 [`plan_attempts`] 的顺序逐步放宽检索词和来源，第一次拿到可用文章就停止。
pub struct NewsSearchFetcher {
    search: Arc<dyn NewsSearch>,
    retry: RetryPolicy,
    domains: String,
    language: String,
    sort_by: String,
    max_articles: usize,
}

impl NewsSearchFetcher {
    pub fn new(search: Arc<dyn NewsSearch>, retry: RetryPolicy, config: &MonitorConfig) -> Self {
        Self {
            search,
            retry,
            domains: config.domains_param(),
            language: config.language.clone(),
            sort_by: config.sort_by.clone(),
            max_articles: config.max_articles.max(1),
        }
    }

    fn request_for(&self, attempt: &SearchAttempt) -> SearchRequest {
        SearchRequest {
            query: attempt.query.clone(),
            domains: match attempt.tier {
                DomainTier::Restricted => Some(self.domains.clone()),
                DomainTier::Unrestricted => None,
            },
            language: self.language.clone(),
            sort_by: self.sort_by.clone(),
            page_size: self.max_articles,
        }
    }

    /// 检索供应商新闻
    ///
    /// 只有密钥无效时返回 `Err`，调用方应终止整个运行。
    pub async fn fetch(&self, symbol: &str, company_name: &str) -> Result<NewsOutcome, FetchError> {
        let queries = derive_queries(company_name, symbol);
        let attempts = plan_attempts(&queries);

        for attempt in attempts {
            match attempt.tier {
                DomainTier::Restricted => {
                    debug!("Searching US business sources for: '{}'", attempt.query)
                }
                DomainTier::Unrestricted => {
                    debug!("No results from US business sources, trying broader search for: '{}'", attempt.query)
                }
            }

            let request = self.request_for(&attempt);
            let label = format!("news for {symbol} with query '{}'", attempt.query);
            let search = &self.search;
            let request_ref = &request;
            let max_attempts = self.retry.max_attempts;

            let result = self
                .retry
                .run(
                    &label,
                    |n| async move {
                        debug!(
                            "Fetching news for {} (attempt {}/{}) with query: '{}'",
                            symbol,
                            n + 1,
                            max_attempts,
                            request_ref.query
                        );
                        search.search(request_ref).await
                    },
                    |e| matches!(e.kind(), ErrorKind::Transient | ErrorKind::Malformed),
                )
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => match e.kind() {
                    ErrorKind::RateLimited => {
                        error!("NewsAPI rate limit exceeded for {}: {}", symbol, e);
                        return Ok(NewsOutcome::RateLimited);
                    }
                    ErrorKind::InvalidCredential => {
                        debug!("NewsAPI rejected the key while searching for {}", symbol);
                        return Err(e);
                    }
                    _ => {
                        debug!("Failed query '{}' after {} attempts", attempt.query, max_attempts);
                        continue;
                    }
                },
            };

            if !response.is_ok() {
                warn!(
                    "Invalid response from NewsAPI for {} with query '{}' (status '{}')",
                    symbol, attempt.query, response.status
                );
                continue;
            }
            if response.articles.is_empty() {
                debug!("No articles found with query '{}'", attempt.query);
                continue;
            }

            let articles: Vec<Article> = response
                .articles
                .iter()
                .take(self.max_articles)
                .filter_map(|raw| {
                    Article::new(
                        raw.title.as_deref().unwrap_or_default(),
                        raw.description.as_deref().unwrap_or_default(),
                        raw.content.as_deref().unwrap_or_default(),
                    )
                })
                .collect();

            if articles.is_empty() {
                debug!("All articles were removed for query '{}'", attempt.query);
                continue;
            }

            info!(
                "Successfully fetched {} articles for {} using query '{}' ({})",
                articles.len(),
                symbol,
                attempt.query,
                attempt.tier
            );
            return Ok(NewsOutcome::Found { articles, attempt });
        }

        info!(
            "No news articles found for {} after trying {} different search queries",
            symbol,
            queries.len()
        );
        Ok(NewsOutcome::NotFound)
    }
}
