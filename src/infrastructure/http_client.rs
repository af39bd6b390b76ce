//! HTTP client for image downloads with rate limiting and error handling
//!
//! One client is shared by every entry worker. The governor limiter caps the
//! request rate across all of them; each request carries its own timeout.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter, clock::DefaultClock, state::{InMemoryState, direct::NotKeyed}};
use reqwest::{Client, header::{HeaderMap, HeaderValue, USER_AGENT}};
use tracing::debug;

use crate::error::{HarvestError, HarvestResult};
pub use crate::infrastructure::config::HttpClientConfig;

/// Image download client
pub struct ImageFetcher {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ImageFetcher {
    /// Create a new fetcher with the given configuration
    pub fn new(config: HttpClientConfig) -> HarvestResult<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| HarvestError::Config(config::ConfigError::Message(format!("Invalid user agent: {e}"))))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self { client, rate_limiter })
    }

    /// Fetch the body of `url`; any non-success status is an error
    pub async fn fetch_bytes(&self, url: &str) -> HarvestResult<Vec<u8>> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        debug!(url, "Fetching image");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus { status: status.as_u16(), url: url.to_string() });
        }

        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "Fetched image");
        Ok(body.to_vec())
    }
}
