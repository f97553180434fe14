//! Wallet Port - Signing Capability Interface
//!
//! The engine only ever needs two things from a wallet: submit a
//! transaction, or sign EIP-712 typed data. Every concrete wallet
//! integration (local key, embedded wallet, dry run) implements this
//! trait; the engine never names a concrete wallet type.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::message::SignableMessage;

/// Contract call to submit through the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
  /// Destination contract or account.
  pub to: Address,
  /// ABI-encoded call data.
  pub data: Bytes,
  /// Native currency attached, in wei.
  pub value: U256,
}

/// Failures reported by a wallet integration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
  /// The user declined the wallet prompt.
  #[error("user rejected the request")]
  UserRejected,
  /// Not enough native balance for value + gas.
  #[error("insufficient funds")]
  InsufficientFunds,
  /// Transport failure: the request may not have reached the node.
  #[error("network error: {0}")]
  Network(String),
  /// The node answered with an error (revert, bad nonce, underpriced).
  #[error("rejected by node: {0}")]
  Rejected(String),
  /// The wallet cannot perform this operation at all.
  #[error("wallet does not support {operation}")]
  Unsupported {
    /// Name of the missing capability.
    operation: &'static str,
  },
  /// Local signer failure.
  #[error("signer error: {0}")]
  Signer(String),
}

/// Capability-typed wallet boundary.
///
/// Both calls suspend until the wallet resolves the request (user approval
/// plus broadcast for transactions; user approval for signatures). Neither
/// waits for on-chain inclusion, and neither retries.
#[async_trait]
pub trait WalletActions: Send + Sync + 'static {
  /// Submit a transaction and return its hash once broadcast.
  async fn send_transaction(&self, call: &CallRequest) -> Result<TxHash, WalletError>;

  /// Sign typed data and return the raw signature bytes.
  async fn sign_typed_data(&self, message: &SignableMessage) -> Result<Bytes, WalletError>;
}
