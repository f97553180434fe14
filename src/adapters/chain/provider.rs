//! Chain RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the signing connection to an EVM chain via alloy-rs.
//! Validates the chain id at startup and exposes a shared provider
//! instance for transaction submission and receipt queries.
//!
//! In alloy 0.9, `ProviderBuilder::new().on_http()` returns a complex
//! filler type. We store it as a type-erased `dyn Provider` to keep
//! the API clean across the adapter layer.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::ClientBuilder;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared chain RPC provider backed by alloy-rs 0.9.
///
/// Built with the recommended fillers (nonce, gas, chain id) and the
/// caller's wallet, so transactions are filled and signed locally before
/// broadcast. Nonces are cached by the nonce filler, which is what keeps
/// sequential steps from colliding.
pub struct ChainProvider {
    /// The alloy HTTP provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Chain id confirmed at connect time.
    chain_id: u64,
}

impl ChainProvider {
    /// Connect to the configured RPC and validate the chain id.
    #[instrument(skip_all, fields(expected_chain_id = config.chain_id))]
    pub async fn connect(config: &ChainConfig, wallet: EthereumWallet) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_client(
                ClientBuilder::default()
                    .http(config.rpc_url.parse().context("Invalid RPC URL")?)
                    .boxed(),
            );

        // Wrap in Arc<dyn Provider> for type erasure
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != config.chain_id {
            anyhow::bail!(
                "RPC serves chain_id={chain_id}, config expects {}",
                config.chain_id
            );
        }

        info!(chain_id, "Connected to chain RPC");

        Ok(Self { provider, chain_id })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
