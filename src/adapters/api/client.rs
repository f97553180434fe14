//! Marketplace HTTP Client - Rate-limited REST API Client
//!
//! Wraps reqwest with concurrency limiting, retries, and the optional
//! access-key header for all order-construction API calls.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::MarketplaceConfig;

/// Header carrying the project access key.
const ACCESS_KEY_HEADER: &str = "X-Access-Key";

/// Configuration for the marketplace HTTP client.
#[derive(Debug, Clone)]
pub struct MarketplaceClientConfig {
  /// Base URL for the marketplace API.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Project access key, sent when present.
  pub access_key: Option<String>,
}

impl MarketplaceClientConfig {
  /// Build from the `[marketplace]` section plus the env-supplied key.
  pub fn from_config(config: &MarketplaceConfig, access_key: Option<String>) -> Self {
    Self {
      base_url: config.api_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_secs(config.timeout_seconds),
      max_concurrent: config.max_concurrent,
      max_retries: config.max_retries,
      retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
      access_key,
    }
  }
}

/// Rate-limited HTTP client for the marketplace API.
pub struct MarketplaceClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: MarketplaceClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
}

impl MarketplaceClient {
  /// Create a new marketplace client.
  pub fn new(config: MarketplaceClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

    Ok(Self {
      http,
      config,
      semaphore,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// POST a JSON body and decode a JSON response.
  pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
  where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let body = serde_json::to_string(body).context("Failed to encode request body")?;
    let url = format!("{}{}", self.config.base_url, path);
    let request = self
      .http
      .post(&url)
      .header("Content-Type", "application/json")
      .body(body);

    let response = self.execute_with_retry(request, path).await?;
    response
      .json::<R>()
      .await
      .with_context(|| format!("Failed to decode response from {path}"))
  }

  /// Execute request with access key, concurrency limiting, and retries.
  async fn execute_with_retry(&self, request: RequestBuilder, path: &str) -> Result<Response> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), path, "Retrying request");
        sleep(delay).await;
      }

      let mut req = request
        .try_clone()
        .context("Failed to clone request")?;

      if let Some(key) = &self.config.access_key {
        req = req.header(ACCESS_KEY_HEADER, key);
      }

      match req.send().await {
        Ok(response) => match response.status() {
          StatusCode::OK | StatusCode::CREATED => return Ok(response),
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(path, "Rate limited by marketplace API, backing off");
            sleep(Duration::from_secs(2)).await;
            last_error = Some(anyhow::anyhow!("Rate limited"));
          }
          status if status.is_server_error() => {
            warn!(status = %status, path, "Server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("API error {status} on {path}: {body}"));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, path, "Request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }
}
