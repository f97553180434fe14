//! Step Runner - Entry Point
//!
//! Executes one trade intent end to end and exits. Non-zero exit status
//! when any step fails or a broadcast transaction reverts.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Read the trade intent (first CLI argument) and the account
//!    (`PRIVATE_KEY`, or `WALLET_ADDRESS` in dry-run mode)
//! 4. Ask the marketplace API for the step batch
//! 5. Validate approval placement (advisory)
//! 6. Build the wallet (dry-run or alloy-backed)
//! 7. Execute through the retrying sequencer
//! 8. Optionally wait for receipts, then report the aggregated result

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use collectible_trade_steps::adapters::api::{HttpStepSource, MarketplaceClient, MarketplaceClientConfig};
use collectible_trade_steps::adapters::chain::{AlloyWallet, ChainProvider, DryRunWallet};
use collectible_trade_steps::adapters::metrics::StepMetrics;
use collectible_trade_steps::config::{self, AppConfig};
use collectible_trade_steps::domain::aggregator::{AggregatedResult, aggregate};
use collectible_trade_steps::ports::step_source::{StepSource, TradeIntent};
use collectible_trade_steps::ports::telemetry::StepObserver;
use collectible_trade_steps::ports::wallet::WalletActions;
use collectible_trade_steps::usecases::{RetryingSequencer, StepSequencer};

/// Config path override.
const CONFIG_ENV: &str = "STEP_RUNNER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.sdk.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.sdk.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.sdk.dry_run,
        wallet_kind = %config.wallet.kind,
        "Starting step runner"
    );

    // ── 3. Intent and signing key ───────────────────────────
    let intent_path = std::env::args()
        .nth(1)
        .context("Usage: step-runner <intent.json>")?;
    let intent = read_intent(&intent_path)?;

    let (signer, address) = resolve_account(
        std::env::var("PRIVATE_KEY").ok().as_deref(),
        std::env::var("WALLET_ADDRESS").ok().as_deref(),
        config.sdk.dry_run,
    )?;

    let metrics = if config.metrics.enabled {
        Some(Arc::new(StepMetrics::new().context("Failed to register step metrics")?))
    } else {
        None
    };

    // ── 4. Fetch the step batch ─────────────────────────────
    let client_config = MarketplaceClientConfig::from_config(
        &config.marketplace,
        std::env::var("MARKETPLACE_ACCESS_KEY").ok(),
    );
    let client = Arc::new(
        MarketplaceClient::new(client_config).context("Failed to create marketplace client")?,
    );
    let source = HttpStepSource::new(client, config.chain.chain_id);

    let batch = source
        .generate_steps(&intent, address, config.wallet.kind)
        .await?;

    // ── 5. Advisory batch validation ────────────────────────
    for warning in batch.validate() {
        warn!(%warning, "Step batch violates approval placement");
    }

    if batch.is_empty() {
        info!(intent = intent.label(), "Backend returned no steps, nothing to execute");
        return Ok(());
    }

    // ── 6. Wallet ───────────────────────────────────────────
    let (wallet, chain_wallet): (Arc<dyn WalletActions>, Option<Arc<AlloyWallet>>) =
        if config.sdk.dry_run {
            warn!("Dry-run mode: nothing is signed or broadcast");
            (Arc::new(DryRunWallet::new(address)), None)
        } else {
            let signer = signer.context("PRIVATE_KEY not set")?;
            let provider = ChainProvider::connect(&config.chain, EthereumWallet::from(signer.clone()))
                .await
                .context("Failed to connect to chain RPC")?;
            let chain_id = provider.chain_id();
            let alloy_wallet = Arc::new(AlloyWallet::new(Arc::new(provider), signer));
            info!(chain_id, account = %alloy_wallet.address(), "Chain wallet ready");
            let wallet: Arc<dyn WalletActions> = Arc::clone(&alloy_wallet) as Arc<dyn WalletActions>;
            (wallet, Some(alloy_wallet))
        };

    // ── 7. Execute ──────────────────────────────────────────
    let mut sequencer = StepSequencer::new(wallet);
    if let Some(metrics) = &metrics {
        sequencer = sequencer.with_observer(Arc::clone(metrics) as Arc<dyn StepObserver>);
    }
    let runner = RetryingSequencer::new(sequencer, config.execution.retry_policy());

    let trace = match runner.execute(&batch, config.wallet.kind).await {
        Ok(trace) => trace,
        Err(failure) => {
            error!(
                step_index = failure.step_index,
                kind = %failure.step_kind,
                reason = failure.cause.reason(),
                completed = failure.partial.outcomes().len(),
                error = %failure.cause,
                "Step execution failed"
            );
            dump_metrics(metrics.as_deref());
            let message = failure.user_message();
            return Err(anyhow::Error::new(failure).context(message));
        }
    };

    info!(
        execution_id = %trace.execution_id,
        outcomes = trace.outcomes.len(),
        skipped = trace.skipped.len(),
        warnings = trace.warnings.len(),
        "Step batch executed"
    );

    let result = aggregate(trace.into_outcomes());

    // ── 8. Receipts and report ──────────────────────────────
    if let Some(chain_wallet) = &chain_wallet {
        if config.execution.wait_for_receipts {
            wait_for_receipts(chain_wallet, &result, &config).await?;
        }
    }

    dump_metrics(metrics.as_deref());

    info!(
        intent = intent.label(),
        primary = ?result.primary_reference(),
        "Trade complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to encode result")?
    );

    Ok(())
}

/// Load a `TradeIntent` from a JSON file.
fn read_intent(path: &str) -> Result<TradeIntent> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read intent file: {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse intent file: {path}"))
}

/// Resolve the signing key and account address.
///
/// A key is required to broadcast. Dry runs only need an address, so
/// `WALLET_ADDRESS` is accepted there when no key is given.
fn resolve_account(
    private_key: Option<&str>,
    wallet_address: Option<&str>,
    dry_run: bool,
) -> Result<(Option<PrivateKeySigner>, Address)> {
    if let Some(raw) = private_key {
        let signer: PrivateKeySigner = raw
            .trim()
            .parse()
            .context("PRIVATE_KEY is not a valid secp256k1 key")?;
        let address = signer.address();
        return Ok((Some(signer), address));
    }

    anyhow::ensure!(dry_run, "PRIVATE_KEY not set");
    let address = wallet_address
        .context("Dry run needs PRIVATE_KEY or WALLET_ADDRESS")?
        .trim()
        .parse::<Address>()
        .context("WALLET_ADDRESS is not a valid address")?;
    Ok((None, address))
}

/// Wait for every broadcast transaction, in step order.
async fn wait_for_receipts(
    wallet: &AlloyWallet,
    result: &AggregatedResult,
    config: &AppConfig,
) -> Result<()> {
    let timeout = Duration::from_secs(config.execution.receipt_timeout_seconds);
    let poll = Duration::from_millis(config.execution.receipt_poll_interval_ms);

    for step in &result.outcomes {
        let Some(hash) = step.outcome.tx_hash() else {
            continue;
        };
        let success = wallet.wait_for_receipt(*hash, timeout, poll).await?;
        anyhow::ensure!(
            success,
            "{} step at index {} reverted on chain: {hash}",
            step.kind,
            step.step_index
        );
    }

    Ok(())
}

fn dump_metrics(metrics: Option<&StepMetrics>) {
    let Some(metrics) = metrics else {
        return;
    };
    match metrics.render() {
        Ok(text) => debug!(metrics = %text, "Step metrics"),
        Err(e) => warn!(error = %e, "Failed to render step metrics"),
    }
}
