//! Configuration Module - TOML-based Runner Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets (the
//! signing key, the marketplace access key) come from environment
//! variables and never live in this file.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::wallet_kind::WalletKind;
use crate::usecases::retry::RetryPolicy;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any step is executed.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Runner identity and logging.
  pub sdk: SdkConfig,
  /// Chain RPC connection.
  pub chain: ChainConfig,
  /// Order-construction service endpoint.
  pub marketplace: MarketplaceConfig,
  /// Connected wallet category.
  #[serde(default)]
  pub wallet: WalletConfig,
  /// Step execution policy.
  #[serde(default)]
  pub execution: ExecutionConfig,
  /// Metrics collection.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Runner identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SdkConfig {
  /// Human-readable runner name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Dry-run mode: no wallet prompts, no broadcasts.
  #[serde(default)]
  pub dry_run: bool,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// Expected chain id, checked at connect time.
  pub chain_id: u64,
}

/// Marketplace API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
  /// Base URL of the marketplace API.
  pub api_url: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum concurrent requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Retries on transient HTTP errors.
  #[serde(default = "default_http_retries")]
  pub max_retries: u32,
  /// Base backoff between HTTP retries (milliseconds).
  #[serde(default = "default_http_retry_delay")]
  pub retry_base_delay_ms: u64,
}

/// Wallet configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
  /// `external` (default) or `embedded`.
  #[serde(default)]
  pub kind: WalletKind,
}

/// Step execution policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
  /// Tail re-invocations after network failures.
  #[serde(default = "default_step_retries")]
  pub max_retries: u32,
  /// Base backoff between tail re-invocations (milliseconds).
  #[serde(default = "default_step_retry_delay")]
  pub retry_base_delay_ms: u64,
  /// Wait for transaction receipts after the batch completes.
  #[serde(default = "default_true")]
  pub wait_for_receipts: bool,
  /// Per-receipt wait limit (seconds).
  #[serde(default = "default_receipt_timeout")]
  pub receipt_timeout_seconds: u64,
  /// Receipt polling interval (milliseconds).
  #[serde(default = "default_receipt_poll")]
  pub receipt_poll_interval_ms: u64,
}

impl Default for ExecutionConfig {
  fn default() -> Self {
    Self {
      max_retries: default_step_retries(),
      retry_base_delay_ms: default_step_retry_delay(),
      wait_for_receipts: default_true(),
      receipt_timeout_seconds: default_receipt_timeout(),
      receipt_poll_interval_ms: default_receipt_poll(),
    }
  }
}

impl ExecutionConfig {
  /// Retry policy for the step decorator.
  pub const fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_retries: self.max_retries,
      base_delay: Duration::from_millis(self.retry_base_delay_ms),
    }
  }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Collect Prometheus step metrics.
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

const fn default_true() -> bool {
  true
}

const fn default_timeout() -> u64 {
  30
}

const fn default_max_concurrent() -> usize {
  4
}

const fn default_http_retries() -> u32 {
  3
}

const fn default_http_retry_delay() -> u64 {
  200
}

const fn default_step_retries() -> u32 {
  2
}

const fn default_step_retry_delay() -> u64 {
  500
}

const fn default_receipt_timeout() -> u64 {
  120
}

const fn default_receipt_poll() -> u64 {
  2_000
}
