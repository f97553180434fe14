//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.sdk.name,
    chain_id = config.chain.chain_id,
    wallet_kind = %config.wallet.kind,
    dry_run = config.sdk.dry_run,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty endpoints
/// - A real chain id
/// - Sensible retry and timeout bounds
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.sdk.name.trim().is_empty(),
    "sdk.name must not be empty"
  );

  // Chain validation
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "chain.rpc_url must not be empty"
  );
  anyhow::ensure!(config.chain.chain_id > 0, "chain.chain_id must be positive");

  // Marketplace validation
  anyhow::ensure!(
    !config.marketplace.api_url.is_empty(),
    "marketplace.api_url must not be empty"
  );
  anyhow::ensure!(
    config.marketplace.timeout_seconds > 0,
    "marketplace.timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.marketplace.max_concurrent > 0,
    "marketplace.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.marketplace.max_retries <= 10,
    "marketplace.max_retries must be in [0, 10], got {}",
    config.marketplace.max_retries
  );

  // Execution validation
  anyhow::ensure!(
    config.execution.max_retries <= 5,
    "execution.max_retries must be in [0, 5], got {}",
    config.execution.max_retries
  );
  anyhow::ensure!(
    !config.execution.wait_for_receipts || config.execution.receipt_timeout_seconds > 0,
    "execution.receipt_timeout_seconds must be positive when waiting for receipts"
  );
  anyhow::ensure!(
    config.execution.receipt_poll_interval_ms > 0,
    "execution.receipt_poll_interval_ms must be positive"
  );

  Ok(())
}
