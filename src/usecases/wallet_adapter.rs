//! Wallet Action Adapter - Outcome Shaping over the Wallet Port
//!
//! Turns raw wallet results (hash, signature bytes) into
//! `ExecutionOutcome`s, deriving the order id embedded in signed
//! messages. Works with any `WalletActions` implementation, including
//! trait objects.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::domain::message::SignableMessage;
use crate::domain::outcome::ExecutionOutcome;
use crate::ports::wallet::{CallRequest, WalletActions, WalletError};

/// Capability boundary used by the sequencer.
pub struct WalletActionAdapter<W: WalletActions + ?Sized> {
  wallet: Arc<W>,
}

impl<W: WalletActions + ?Sized> WalletActionAdapter<W> {
  /// Wrap a wallet integration.
  pub const fn new(wallet: Arc<W>) -> Self {
    Self { wallet }
  }

  /// Shared handle to the underlying wallet.
  pub fn wallet(&self) -> Arc<W> {
    Arc::clone(&self.wallet)
  }

  /// Submit a transaction; resolves once the wallet has broadcast it.
  pub async fn submit_transaction(
    &self,
    target: Address,
    payload: Bytes,
    native_value: U256,
  ) -> Result<ExecutionOutcome, WalletError> {
    let call = CallRequest {
      to: target,
      data: payload,
      value: native_value,
    };
    let hash = self.wallet.send_transaction(&call).await?;
    debug!(%hash, to = %target, "Transaction submitted");
    Ok(ExecutionOutcome::Transaction { hash })
  }

  /// Sign typed data; resolves once the user approved or rejected.
  pub async fn sign_typed_data(
    &self,
    message: &SignableMessage,
  ) -> Result<ExecutionOutcome, WalletError> {
    let signature = self.wallet.sign_typed_data(message).await?;
    let derived_order_id = message.embedded_order_id();
    debug!(
      primary_type = message.primary_type(),
      order_id = ?derived_order_id,
      "Typed data signed"
    );
    Ok(ExecutionOutcome::Signature {
      signature,
      derived_order_id,
    })
  }
}
