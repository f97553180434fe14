//! Marketplace API Request/Response Types
//!
//! Serialization types for the order-construction endpoints. Amounts and
//! ids travel as decimal strings so large token ids survive JSON.

use serde::{Deserialize, Serialize};

use crate::domain::step::StepBatch;

/// Existing order reference for buy/sell requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
  pub order_id: String,
  pub quantity: String,
}

/// `GenerateBuyTransaction` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBuyRequest {
  pub chain_id: String,
  pub collection_address: String,
  pub buyer: String,
  pub marketplace: String,
  pub orders_data: Vec<OrderData>,
  pub wallet_type: String,
}

/// `GenerateSellTransaction` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSellRequest {
  pub chain_id: String,
  pub collection_address: String,
  pub seller: String,
  pub marketplace: String,
  pub orders_data: Vec<OrderData>,
  pub wallet_type: String,
}

/// New order terms shared by listing and offer requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderTerms {
  pub token_id: String,
  pub quantity: String,
  /// Unix seconds.
  pub expiry: String,
  pub currency_address: String,
  pub price_per_token: String,
}

/// `GenerateListingTransaction` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateListingRequest {
  pub chain_id: String,
  pub collection_address: String,
  pub owner: String,
  pub orderbook: String,
  pub listing: CreateOrderTerms,
  pub wallet_type: String,
}

/// `GenerateOfferTransaction` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOfferRequest {
  pub chain_id: String,
  pub collection_address: String,
  pub maker: String,
  pub orderbook: String,
  pub offer: CreateOrderTerms,
  pub wallet_type: String,
}

/// `GenerateCancelTransaction` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCancelRequest {
  pub chain_id: String,
  pub collection_address: String,
  pub maker: String,
  pub marketplace: String,
  pub order_id: String,
}

/// Response shared by every `Generate*Transaction` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateStepsResponse {
  /// Ordered steps to execute.
  #[serde(default)]
  pub steps: StepBatch,
}
