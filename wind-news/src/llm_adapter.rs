use crate::types::{AggregatorError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for LLM adapters: text in, text out. Prompt construction and
/// response interpretation belong to the caller.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Get the name of this LLM adapter
    fn adapter_name(&self) -> String;

    /// Send one prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` over HTTPS.
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl GeminiAdapter {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            endpoint: GEMINI_ENDPOINT.to_string(),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
            generation_config: GenerationConfig { temperature: 0.2, response_mime_type: "application/json" },
        };
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AggregatorError::Enrichment("model returned no text".to_string()));
        }
        Ok(text)
    }
}

fn retryable(error: &AggregatorError) -> bool {
    match error {
        AggregatorError::Http(e) => e.is_timeout() || e.is_connect(),
        AggregatorError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

#[async_trait]
impl LlmAdapter for GeminiAdapter {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            max_interval: self.retry_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries && retryable(&e) => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(self.retry_delay);
                    warn!("Gemini attempt {} failed, retrying in {:?}: {}", attempt, delay, e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Mock LLM adapter for development and testing
pub struct MockLlmAdapter {
    name: String,
    response: Option<String>,
    response_delay_ms: u64,
    calls: AtomicUsize,
}

impl MockLlmAdapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            response: None,
            response_delay_ms: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    /// Always answer with this text instead of a generated categorization.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn simulate_processing(&self) {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }
    }

    /// One neutral entry per `[n]` line of the prompt.
    fn canned_categorization(prompt: &str) -> String {
        let entries: Vec<serde_json::Value> = prompt
            .lines()
            .filter_map(|line| line.strip_prefix('[')?.split_once(']')?.0.parse::<usize>().ok())
            .map(|index| {
                serde_json::json!({
                    "index": index,
                    "projectStage": "unknown",
                    "sentiment": "neutral",
                    "keyTopics": [],
                    "urgency": "low",
                })
            })
            .collect();
        serde_json::Value::Array(entries).to_string()
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_processing().await;
        debug!("Mock adapter answering prompt of {} chars", prompt.len());
        Ok(self.response.clone().unwrap_or_else(|| Self::canned_categorization(prompt)))
    }
}
