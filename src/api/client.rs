//! Async HTTP client shared by every NHL feed parser.
//!
//! Features:
//! - Rate limiting (configurable, default 10 req/sec)
//! - Automatic retries with exponential backoff on 429, 5xx and network errors
//! - JSON and raw-text bodies
//!
//! The client is `Send + Sync`; one instance is shared behind an `Arc` by
//! all parsers and all concurrent games.

use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::ApiError;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Exponential backoff before retry `attempt + 1`: 500 ms, 1 s, 2 s, ...
/// Saturates instead of overflowing for large attempt counts.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(500u64.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Async GET client for the NHL web, stats and report hosts.
pub struct NhlClient {
    client: Client,
    rate_limiter: Arc<DirectLimiter>,
    max_retries: u32,
}

impl NhlClient {
    pub fn new(rate_limit: u32, max_retries: u32, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("nhl-pbp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN.saturating_add(9));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            rate_limiter,
            max_retries: max_retries.max(1),
        })
    }

    /// Create with default settings.
    pub fn with_defaults() -> Result<Self, ApiError> {
        Self::new(10, 3, 30)
    }

    // =========================================================================
    // Core request method
    // =========================================================================

    async fn request(&self, url: &str) -> Result<String, ApiError> {
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..self.max_retries {
            self.rate_limiter.until_ready().await;

            debug!(url = %url, attempt = attempt + 1, "GET");

            let error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| ApiError::Network(e.to_string()));
                    }

                    if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(1);
                        ApiError::RateLimited { retry_after }
                    } else {
                        let body_text = response.text().await.unwrap_or_default();
                        ApiError::from_response(status.as_u16(), &body_text)
                    }
                }
                Err(e) if e.is_timeout() => ApiError::Timeout(e.to_string()),
                Err(e) => ApiError::Network(e.to_string()),
            };

            // Client errors: no retry
            if !error.is_retryable() {
                return Err(error);
            }

            if attempt + 1 < self.max_retries {
                let delay = match &error {
                    ApiError::RateLimited { retry_after } => Duration::from_secs(*retry_after),
                    _ => backoff_delay(attempt),
                };
                warn!(
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    attempt = attempt + 1,
                    url = %url,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            last_error = Some(error);
        }

        Err(ApiError::MaxRetriesExceeded {
            attempts: self.max_retries,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
        })
    }

    // =========================================================================
    // Public fetchers
    // =========================================================================

    /// GET a JSON document.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let text = self.request(url).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// GET a raw text body (the HTML reports).
    pub async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        self.request(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_millis(500));
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(backoff_delay(60), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_retries() {
        // Port 1 on loopback refuses connections.
        let client = NhlClient::new(100, 2, 5).unwrap();
        match client.get_text("http://127.0.0.1:1/").await {
            Err(ApiError::MaxRetriesExceeded { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
