//! NewsAPI `/v2/everything` 客户端

use super::{NewsSearch, SearchRequest, SearchResponse};
use crate::types::{FetchError, MonitorResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";

/// 错误响应体
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> MonitorResult<Self> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vendor-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, api_key: api_key.into(), base_url: base_url.into() })
    }

    fn everything_url(&self) -> String {
        format!("{}/v2/everything", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl NewsSearch for NewsApiClient {
    fn provider(&self) -> &'static str {
        "newsapi"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, FetchError> {
        let mut params = vec![
            ("q", request.query.clone()),
            ("language", request.language.clone()),
            ("sortBy", request.sort_by.clone()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(domains) = &request.domains {
            params.push(("domains", domains.clone()));
        }

        let response = self
            .client
            .get(self.everything_url())
            .header("X-Api-Key", &self.api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("newsapi q='{}' -> {} ({} bytes)", request.query, status, body.len());

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// 按 HTTP 状态码和错误码分类
fn classify_error(status: StatusCode, body: &str) -> FetchError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();
    let detail = match parsed.message {
        Some(message) => format!("{} {}: {}", status.as_u16(), code, message),
        None => format!("{} {}", status.as_u16(), code),
    };

    match code.as_str() {
        "rateLimited" => FetchError::RateLimited(detail),
        "apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" => FetchError::InvalidCredential(detail),
        _ if status == StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited(detail),
        _ if status == StatusCode::UNAUTHORIZED => FetchError::InvalidCredential(detail),
        _ => FetchError::Transient(detail),
    }
}

/// 遮盖密钥，过短的密钥整体隐藏
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
