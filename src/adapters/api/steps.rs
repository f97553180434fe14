//! HTTP Step Source - `StepSource` over the Marketplace API
//!
//! Translates a `TradeIntent` into the matching `Generate*Transaction`
//! call and returns the backend's ordered step batch untouched.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domain::step::StepBatch;
use crate::domain::wallet_kind::WalletKind;
use crate::ports::step_source::{OrderTerms, StepSource, TradeIntent};

use super::client::MarketplaceClient;
use super::types::{
  CreateOrderTerms, GenerateBuyRequest, GenerateCancelRequest, GenerateListingRequest,
  GenerateOfferRequest, GenerateSellRequest, GenerateStepsResponse, OrderData,
};

const BUY_PATH: &str = "/rpc/Marketplace/GenerateBuyTransaction";
const SELL_PATH: &str = "/rpc/Marketplace/GenerateSellTransaction";
const LISTING_PATH: &str = "/rpc/Marketplace/GenerateListingTransaction";
const OFFER_PATH: &str = "/rpc/Marketplace/GenerateOfferTransaction";
const CANCEL_PATH: &str = "/rpc/Marketplace/GenerateCancelTransaction";

/// Step source backed by the marketplace order-construction API.
pub struct HttpStepSource {
  client: Arc<MarketplaceClient>,
  /// Chain the generated steps must target.
  chain_id: u64,
}

impl HttpStepSource {
  pub const fn new(client: Arc<MarketplaceClient>, chain_id: u64) -> Self {
    Self { client, chain_id }
  }
}

#[async_trait]
impl StepSource for HttpStepSource {
  #[instrument(skip(self, intent), fields(intent = intent.label(), %wallet, %wallet_kind))]
  async fn generate_steps(
    &self,
    intent: &TradeIntent,
    wallet: Address,
    wallet_kind: WalletKind,
  ) -> Result<StepBatch> {
    let (path, body) = build_request(intent, wallet, wallet_kind, self.chain_id)?;

    let response: GenerateStepsResponse = self
      .client
      .post_json(path, &body)
      .await
      .with_context(|| format!("Failed to generate {} steps", intent.label()))?;

    info!(steps = response.steps.len(), "Step batch received");
    Ok(response.steps)
  }
}

/// Endpoint path and JSON body for an intent.
pub fn build_request(
  intent: &TradeIntent,
  wallet: Address,
  wallet_kind: WalletKind,
  chain_id: u64,
) -> Result<(&'static str, Value)> {
  let chain_id = chain_id.to_string();
  let wallet_type = wallet_kind.to_string();
  let collection_address = intent.collection().to_string();

  let (path, body) = match intent {
    TradeIntent::Buy {
      order_id,
      quantity,
      marketplace,
      ..
    } => (
      BUY_PATH,
      serde_json::to_value(GenerateBuyRequest {
        chain_id,
        collection_address,
        buyer: wallet.to_string(),
        marketplace: marketplace.clone(),
        orders_data: vec![OrderData {
          order_id: order_id.clone(),
          quantity: quantity.to_string(),
        }],
        wallet_type,
      }),
    ),
    TradeIntent::Sell {
      order_id,
      quantity,
      marketplace,
      ..
    } => (
      SELL_PATH,
      serde_json::to_value(GenerateSellRequest {
        chain_id,
        collection_address,
        seller: wallet.to_string(),
        marketplace: marketplace.clone(),
        orders_data: vec![OrderData {
          order_id: order_id.clone(),
          quantity: quantity.to_string(),
        }],
        wallet_type,
      }),
    ),
    TradeIntent::CreateListing(terms) => (
      LISTING_PATH,
      serde_json::to_value(GenerateListingRequest {
        chain_id,
        collection_address,
        owner: wallet.to_string(),
        orderbook: terms.orderbook.clone(),
        listing: order_terms(terms),
        wallet_type,
      }),
    ),
    TradeIntent::CreateOffer(terms) => (
      OFFER_PATH,
      serde_json::to_value(GenerateOfferRequest {
        chain_id,
        collection_address,
        maker: wallet.to_string(),
        orderbook: terms.orderbook.clone(),
        offer: order_terms(terms),
        wallet_type,
      }),
    ),
    TradeIntent::Cancel {
      order_id,
      marketplace,
      ..
    } => (
      CANCEL_PATH,
      serde_json::to_value(GenerateCancelRequest {
        chain_id,
        collection_address,
        maker: wallet.to_string(),
        marketplace: marketplace.clone(),
        order_id: order_id.clone(),
      }),
    ),
  };

  let body = body.context("Failed to encode step request")?;
  Ok((path, body))
}

fn order_terms(terms: &OrderTerms) -> CreateOrderTerms {
  CreateOrderTerms {
    token_id: terms.token_id.to_string(),
    quantity: terms.quantity.to_string(),
    expiry: terms.expiry.timestamp().to_string(),
    currency_address: terms.currency.to_string(),
    price_per_token: terms.price_per_token.to_string(),
  }
}
