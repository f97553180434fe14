//! Dry-run Wallet - Offline `WalletActions`
//!
//! Lets a step batch run end to end without a key or an RPC. Transaction
//! hashes are keccak digests of the call, and the "signature" for a typed
//! message is its EIP-712 signing hash, so outputs stay deterministic per
//! call while remaining clearly unusable on chain.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, Bytes, TxHash, keccak256};
use async_trait::async_trait;
use tracing::info;

use crate::domain::message::SignableMessage;
use crate::ports::wallet::{CallRequest, WalletActions, WalletError};

/// Wallet that never broadcasts or signs.
#[derive(Debug)]
pub struct DryRunWallet {
    /// Account the batch was generated for.
    address: Address,
    /// Local sequence, mixed into each pseudo hash.
    nonce: AtomicU64,
}

impl DryRunWallet {
    pub const fn new(address: Address) -> Self {
        Self {
            address,
            nonce: AtomicU64::new(0),
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl WalletActions for DryRunWallet {
    async fn send_transaction(&self, call: &CallRequest) -> Result<TxHash, WalletError> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);

        let mut preimage = Vec::with_capacity(80 + call.data.len());
        preimage.extend_from_slice(self.address.as_slice());
        preimage.extend_from_slice(call.to.as_slice());
        preimage.extend_from_slice(&call.value.to_be_bytes::<32>());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&call.data);

        let hash = keccak256(&preimage);
        info!(%hash, to = %call.to, value = %call.value, nonce, "Dry run: transaction not broadcast");
        Ok(hash)
    }

    async fn sign_typed_data(&self, message: &SignableMessage) -> Result<Bytes, WalletError> {
        let digest = message
            .typed_data()
            .eip712_signing_hash()
            .map_err(|e| WalletError::Signer(e.to_string()))?;

        info!(%digest, primary_type = message.primary_type(), "Dry run: typed data not signed");
        Ok(Bytes::copy_from_slice(digest.as_slice()))
    }
}
