use crate::{MarketError, MarketResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;

// The chart endpoint rejects the default reqwest agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub fn create_http_client(timeout: Duration) -> MarketResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        "Accept-Language",
        "en-US,en;q=0.9".parse::<HeaderValue>().map_err(|e| MarketError::Custom(e.to_string()))?,
    );

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(Into::into)
}
