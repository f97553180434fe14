//! Step Source Port - Order-construction Service Interface
//!
//! The backend decides what a trade requires and answers with an ordered
//! step batch. This port expresses a trade intent and receives that batch;
//! pricing and fee decisions stay server-side.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::step::StepBatch;
use crate::domain::wallet_kind::WalletKind;

/// Terms for a new listing or offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTerms {
  /// Collection contract.
  pub collection: Address,
  /// Token within the collection.
  pub token_id: U256,
  /// Units (1 for ERC-721).
  pub quantity: U256,
  /// Price per unit in `currency` base units.
  pub price_per_token: U256,
  /// Payment currency contract (zero address for native).
  pub currency: Address,
  /// When the order stops being fillable.
  pub expiry: DateTime<Utc>,
  /// Target orderbook identifier.
  pub orderbook: String,
}

/// What the caller wants to do. Loaded from JSON by the runner binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TradeIntent {
  /// Fill an existing listing.
  Buy {
    collection: Address,
    order_id: String,
    quantity: U256,
    marketplace: String,
  },
  /// Accept an existing offer.
  Sell {
    collection: Address,
    order_id: String,
    quantity: U256,
    marketplace: String,
  },
  /// Create a new listing.
  CreateListing(OrderTerms),
  /// Create a new offer.
  CreateOffer(OrderTerms),
  /// Cancel one of the caller's orders.
  Cancel {
    collection: Address,
    order_id: String,
    marketplace: String,
  },
}

impl TradeIntent {
  /// Short name for logs.
  pub const fn label(&self) -> &'static str {
    match self {
      Self::Buy { .. } => "buy",
      Self::Sell { .. } => "sell",
      Self::CreateListing(_) => "createListing",
      Self::CreateOffer(_) => "createOffer",
      Self::Cancel { .. } => "cancel",
    }
  }

  /// Collection contract the intent targets.
  pub const fn collection(&self) -> Address {
    match self {
      Self::Buy { collection, .. }
      | Self::Sell { collection, .. }
      | Self::Cancel { collection, .. } => *collection,
      Self::CreateListing(terms) | Self::CreateOffer(terms) => terms.collection,
    }
  }
}

/// Trait for order-construction backends.
#[async_trait]
pub trait StepSource: Send + Sync + 'static {
  /// Ask the backend for the steps that fulfil `intent` from `wallet`.
  async fn generate_steps(
    &self,
    intent: &TradeIntent,
    wallet: Address,
    wallet_kind: WalletKind,
  ) -> anyhow::Result<StepBatch>;
}
