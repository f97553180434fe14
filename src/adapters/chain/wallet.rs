//! Local-key Wallet - `WalletActions` over alloy-rs
//!
//! Signs transactions through the filler-equipped `ChainProvider` and
//! signs EIP-712 typed data with the same local key. JSON-RPC failures
//! are mapped onto the wallet error taxonomy so the engine can tell a
//! user rejection from a funding or network problem.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::domain::message::SignableMessage;
use crate::ports::wallet::{CallRequest, WalletActions, WalletError};

use super::provider::ChainProvider;

/// EIP-1193 "user rejected request" error code.
const USER_REJECTED_CODE: i64 = 4001;

/// Wallet backed by a local private key.
pub struct AlloyWallet {
    /// Shared provider with the signing wallet attached.
    provider: Arc<ChainProvider>,
    /// Same key as the provider's wallet, for typed-data signing.
    signer: PrivateKeySigner,
}

impl AlloyWallet {
    /// Create a wallet over a connected provider.
    pub const fn new(provider: Arc<ChainProvider>, signer: PrivateKeySigner) -> Self {
        Self { provider, signer }
    }

    /// Account address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Poll until `hash` is included or `timeout` elapses.
    ///
    /// Not part of step execution: callers that need inclusion (rather
    /// than broadcast) use this after `execute` returns. Returns the
    /// receipt's success flag.
    #[instrument(skip(self), fields(%hash))]
    pub async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool> {
        let inner = self.provider.inner();
        let deadline = Instant::now() + timeout;

        loop {
            let receipt = inner
                .get_transaction_receipt(hash)
                .await
                .context("Receipt query failed")?;

            if let Some(receipt) = receipt {
                let success = receipt.status();
                info!(block = ?receipt.block_number, success, "Transaction included");
                return Ok(success);
            }

            if Instant::now() >= deadline {
                bail!(
                    "Timed out after {}s waiting for receipt of {hash}",
                    timeout.as_secs()
                );
            }

            debug!("Receipt not available yet");
            sleep(poll_interval).await;
        }
    }
}

#[async_trait]
impl WalletActions for AlloyWallet {
    #[instrument(skip(self, call), fields(to = %call.to, value = %call.value))]
    async fn send_transaction(&self, call: &CallRequest) -> Result<TxHash, WalletError> {
        let tx = TransactionRequest::default()
            .from(self.signer.address())
            .to(call.to)
            .input(call.data.clone().into())
            .value(call.value);

        let pending = self
            .provider
            .inner()
            .send_transaction(tx)
            .await
            .map_err(|e| map_transport_error(&e))?;

        let hash = *pending.tx_hash();
        info!(%hash, "Transaction broadcast");
        Ok(hash)
    }

    #[instrument(skip(self, message), fields(primary_type = message.primary_type()))]
    async fn sign_typed_data(&self, message: &SignableMessage) -> Result<Bytes, WalletError> {
        let signature = self
            .signer
            .sign_dynamic_typed_data(message.typed_data())
            .await
            .map_err(|e| WalletError::Signer(e.to_string()))?;

        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

/// Map a JSON-RPC / transport failure onto the wallet taxonomy.
///
/// Only failures without a node response are `Network`; an error payload
/// means the node saw the transaction and refused it.
fn map_transport_error(err: &TransportError) -> WalletError {
    match err.as_error_resp() {
        Some(payload) if payload.code == USER_REJECTED_CODE => WalletError::UserRejected,
        Some(payload) => classify_node_error(payload.message.as_ref()),
        None => WalletError::Network(err.to_string()),
    }
}

/// Classify the message of a node/wallet error response.
pub(crate) fn classify_node_error(message: &str) -> WalletError {
    let lower = message.to_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        WalletError::UserRejected
    } else if lower.contains("insufficient funds") {
        WalletError::InsufficientFunds
    } else {
        WalletError::Rejected(message.to_string())
    }
}
