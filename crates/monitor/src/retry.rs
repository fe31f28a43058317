//! 有界重试与指数退避

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 两次尝试之间的等待策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// 第 n 次失败后等待 base * 2^n（n 从 0 开始）
    Exponential { base: Duration },
    /// 不等待（测试用）
    None,
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
            Backoff::None => Duration::ZERO,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential { base: Duration::from_secs(1) }
    }
}

/// 重试策略，行情和新闻共用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff: Backoff::default() }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// 执行 `op`，直到成功、遇到不可重试的错误或次数用尽
    ///
    /// `op` 收到从 0 开始的尝试序号。只在两次尝试之间等待，最后一次失败后直接返回。
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut op: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !is_retryable(&err) {
                return Err(err);
            }

            warn!("Attempt {}/{} failed for {}: {}", attempt + 1, max_attempts, label, err);
            if attempt + 1 >= max_attempts {
                debug!("Giving up on {} after {} attempts", label, max_attempts);
                return Err(err);
            }

            let delay = self.backoff.delay(attempt);
            if !delay.is_zero() {
                debug!("Retrying in {:?}...", delay);
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
