use crate::types::{AggregatorError, FetchConfig, FetchResult, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.feed_timeout.max(config.page_timeout))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch one feed. Never returns `Err`: every failure, including the
    /// overall timeout, is reported through `FetchResult::error`.
    pub async fn fetch_feed(&self, url: &str) -> FetchResult {
        let start_time = Instant::now();
        let fetch_time = Utc::now();
        let limit = self.config.feed_timeout;

        debug!("Fetching feed: {}", url);

        let outcome = match tokio::time::timeout(limit, self.fetch_with_retries(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AggregatorError::Timeout {
                what: url.to_string(),
                millis: limit.as_millis() as u64,
            }),
        };
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            Ok((status, content)) => {
                info!("Fetched feed: {} ({} bytes, {}ms)", url, content.len(), response_time_ms);
                FetchResult {
                    url: url.to_string(),
                    success: true,
                    error: None,
                    fetch_time,
                    response_time_ms,
                    http_status: Some(status.as_u16()),
                    content: Some(content),
                }
            }
            Err(e) => {
                warn!("Failed to fetch feed {}: {}", url, e);
                FetchResult {
                    url: url.to_string(),
                    success: false,
                    error: Some(e.to_string()),
                    fetch_time,
                    response_time_ms,
                    http_status: None,
                    content: None,
                }
            }
        }
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<(StatusCode, String)> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.config.retry_delay,
            initial_interval: self.config.retry_delay,
            max_interval: self.config.retry_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: Some(self.config.feed_timeout),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.config.max_retries && is_transient(&e) => {
                    attempt += 1;
                    match backoff.next_backoff() {
                        Some(delay) => {
                            warn!("Attempt {} failed for {}, retrying in {:?}: {}", attempt, url, delay, e);
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<(StatusCode, String)> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(AggregatorError::FeedTooLarge { size_mb });
            }
        }

        let content = response.text().await?;
        if content.len() > self.config.max_feed_size_mb * 1024 * 1024 {
            return Err(AggregatorError::FeedTooLarge { size_mb: content.len() / (1024 * 1024) });
        }
        Ok((status, content))
    }

    /// Fetch an article page as HTML, for image scraping. Uses a browser-like
    /// user agent because many publishers refuse unknown clients.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching page: {}", url);
        let limit = self.config.page_timeout;
        let request = async {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, &self.config.page_user_agent)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .timeout(limit)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status));
            }
            Ok::<String, AggregatorError>(response.text().await?)
        };

        tokio::time::timeout(limit, request)
            .await
            .map_err(|_| AggregatorError::Timeout { what: url.to_string(), millis: limit.as_millis() as u64 })?
    }

    /// Shared client for callers that speak other HTTP APIs (the LLM adapter).
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn status_error(status: StatusCode) -> AggregatorError {
    AggregatorError::HttpStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

/// Network errors, 5xx and 429 are worth another try; other statuses are not.
fn is_transient(error: &AggregatorError) -> bool {
    match error {
        AggregatorError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        AggregatorError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}
