//! HTTP fetching with exponential backoff retry logic.
//!
//! Every source, feed or page, is downloaded through the same stack:
//! - [`Fetch`]: core trait defining an async "URL in, body out" operation
//! - [`HttpFetcher`]: `reqwest`-backed implementation with a browser user agent
//! - [`RetryFetch`]: decorator that adds retry logic to any `Fetch` implementation
//!
//! # Retry Strategy
//!
//! - 3 attempts per source by default
//! - Exponential backoff starting at 1 second (1s, 2s, 4s, ...)
//! - Maximum delay capped at 30 seconds
//! - Optional random jitter
//! - Errors that cannot improve on retry (bad URL) fail immediately

use crate::errors::FetchError;
use rand::{rng, Rng};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Trait for async page/feed downloads.
///
/// Implementors fetch the body at `url` as text. The abstraction lets the retry
/// decorator and tests wrap or replace the network client.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: Fetch> Fetch for &T {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// Attempt budget and backoff shape applied to each source.
///
/// ```text
/// delay(n) = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following failed attempt number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        let max_jitter_ms = self.max_jitter.as_millis() as u64;
        if max_jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng().random_range(0..=max_jitter_ms))
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
#[derive(Debug)]
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Fetch> RetryFetch<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: Fetch> Fetch for RetryFetch<T> {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            let attempt_t0 = Instant::now();
            attempt += 1;
            match self.inner.fetch(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "fetch succeeded");
                    return Ok(body);
                }
                Err(e) => {
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt >= self.policy.max_attempts || !e.is_retryable() {
                        error!(
                            attempt,
                            max = self.policy.max_attempts,
                            elapsed_ms_attempt,
                            elapsed_ms_total,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.policy.delay_with_jitter(attempt);
                    warn!(
                        attempt,
                        max = self.policy.max_attempts,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// `reqwest` client sending a browser-like user agent with a request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = url::Url::parse(url)?;
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis(), "HTTP error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!(%url, bytes = body.len(), elapsed_ms = t0.elapsed().as_millis(), "Downloaded");
        Ok(body)
    }
}
