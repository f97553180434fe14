//! Trade step model.
//!
//! A `Step` is one backend-issued wallet action needed to complete a trade.
//! Steps arrive as JSON from the order-construction service and are never
//! mutated afterwards; their only identity is their position in the
//! `StepBatch` that carried them.
//!
//! Wire shape (camelCase, as emitted by the marketplace API):
//! `{ "id": "tokenApproval", "to": "0x..", "data": "0x..", "value": "0",
//!    "price": "0", "signature": { ...typed data envelope... } }`

use std::fmt;

use alloy::primitives::{Address, Bytes, U256};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::message::SignableMessage;

// ────────────────────────────────────────────
// Step kind vocabulary
// ────────────────────────────────────────────

/// Semantic kind of a step, as tagged by the backend.
///
/// The vocabulary is open: a tag outside the known set deserializes into
/// `Unknown` instead of failing, so new backend step kinds do not break
/// execution of existing clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    /// ERC-20 / ERC-721 / ERC-1155 spend approval.
    TokenApproval,
    /// Create a sell-side listing.
    CreateListing,
    /// Create a buy-side offer.
    CreateOffer,
    /// Fill a listing.
    Buy,
    /// Accept an offer.
    Sell,
    /// Cancel an existing order.
    Cancel,
    /// Tag outside the known vocabulary, kept verbatim.
    Unknown(String),
}

impl StepKind {
    /// Wire tag for this kind.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::TokenApproval => "tokenApproval",
            Self::CreateListing => "createListing",
            Self::CreateOffer => "createOffer",
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Cancel => "cancel",
            Self::Unknown(tag) => tag,
        }
    }

    /// Whether this kind produces the economically meaningful result of a
    /// batch (everything except approvals and unrecognized kinds).
    pub const fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::CreateListing | Self::CreateOffer | Self::Buy | Self::Sell | Self::Cancel
        )
    }

    /// Human-readable action name used in user-facing failure messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TokenApproval => "approval",
            Self::CreateListing => "listing creation",
            Self::CreateOffer => "offer creation",
            Self::Buy => "purchase",
            Self::Sell => "sale",
            Self::Cancel => "cancellation",
            Self::Unknown(_) => "step",
        }
    }
}

impl From<String> for StepKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "tokenApproval" => Self::TokenApproval,
            "createListing" => Self::CreateListing,
            "createOffer" => Self::CreateOffer,
            "buy" => Self::Buy,
            "sell" => Self::Sell,
            "cancel" => Self::Cancel,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<&str> for StepKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_tag().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ────────────────────────────────────────────
// Step
// ────────────────────────────────────────────

/// One opaque wallet action issued by the order-construction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Semantic kind tag.
    #[serde(rename = "id")]
    pub kind: StepKind,
    /// Destination contract or account. `None` when the backend sent an
    /// empty or missing `to`.
    #[serde(rename = "to", default, deserialize_with = "empty_as_none")]
    pub target: Option<Address>,
    /// Raw call data. Empty for signature steps.
    #[serde(rename = "data", default, deserialize_with = "lenient_bytes")]
    pub payload: Bytes,
    /// Raw signable envelope (EIP-712 shaped) when the backend wants an
    /// off-chain signature instead of a call.
    #[serde(
        rename = "signature",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Value>,
    /// Native currency to attach to the call, in wei.
    #[serde(rename = "value", default, deserialize_with = "lenient_u256")]
    pub native_value: U256,
    /// Informational price quoted by the backend. Never used for execution.
    #[serde(rename = "price", default, deserialize_with = "lenient_u256")]
    pub reference_price: U256,
}

impl Step {
    /// Build a call-style step.
    pub fn call(kind: StepKind, target: Address, payload: Bytes, native_value: U256) -> Self {
        Self {
            kind,
            target: Some(target),
            payload,
            message: None,
            native_value,
            reference_price: U256::ZERO,
        }
    }

    /// Build a signature-style step from a raw typed-data envelope.
    pub fn signature(kind: StepKind, target: Option<Address>, envelope: Value) -> Self {
        Self {
            kind,
            target,
            payload: Bytes::new(),
            message: Some(envelope),
            native_value: U256::ZERO,
            reference_price: U256::ZERO,
        }
    }

    /// Whether the step carries non-empty call data.
    pub fn has_call_data(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Whether the backend attached a signature envelope at all, parseable
    /// or not. An empty string counts as absent.
    pub fn has_message(&self) -> bool {
        match &self.message {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Interpret the signature envelope as EIP-712 typed data, if it has
    /// that shape.
    pub fn signable_message(&self) -> Option<SignableMessage> {
        self.message.as_ref().and_then(SignableMessage::from_envelope)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<Address>().map(Some).map_err(de::Error::custom),
    }
}

fn lenient_bytes<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("" | "0x") => Ok(Bytes::new()),
        Some(s) => s.parse::<Bytes>().map_err(de::Error::custom),
    }
}

/// Amounts arrive as decimal strings, hex strings, bare numbers or "".
fn lenient_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(U256::ZERO),
        Value::Number(n) => number_to_u256(&n)
            .ok_or_else(|| de::Error::custom(format!("invalid amount {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(U256::ZERO),
        Value::String(s) => s.trim().parse::<U256>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("invalid amount {other}"))),
    }
}

/// Bare numbers above `u64::MAX` reach us as `f64`. Integral values are
/// accepted at `f64` precision; exact large amounts come as strings.
fn number_to_u256(n: &serde_json::Number) -> Option<U256> {
    if let Some(v) = n.as_u64() {
        return Some(U256::from(v));
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 {
        return None;
    }
    format!("{f:.0}").parse::<U256>().ok()
}

// ────────────────────────────────────────────
// Step batch
// ────────────────────────────────────────────

/// Advisory findings about a batch's approval placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchWarning {
    /// More than one approval in a single batch.
    #[error("batch carries {count} approval steps, expected at most one")]
    MultipleApprovals { count: usize },
    /// Approval that is not the first step.
    #[error("approval at index {index} is not the first step")]
    ApprovalNotFirst { index: usize },
    /// Approval with no following step to authorize.
    #[error("approval at index {index} has no step to authorize")]
    DanglingApproval { index: usize },
}

/// Ordered steps that together accomplish one trade intent.
///
/// Order is the required execution order; there is no dependency graph
/// beyond "earlier before later".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepBatch {
    steps: Vec<Step>,
}

impl StepBatch {
    /// Wrap an ordered list of steps.
    pub const fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Check the approval-placement invariant.
    ///
    /// An approval must sit immediately before the step it authorizes, and
    /// current backends emit at most one, always first. Violations are
    /// reported, never enforced.
    pub fn validate(&self) -> Vec<BatchWarning> {
        let approvals: Vec<usize> = self
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.kind == StepKind::TokenApproval)
            .map(|(index, _)| index)
            .collect();

        let mut warnings = Vec::new();
        if approvals.len() > 1 {
            warnings.push(BatchWarning::MultipleApprovals {
                count: approvals.len(),
            });
        }

        for &index in &approvals {
            if index != 0 {
                warnings.push(BatchWarning::ApprovalNotFirst { index });
            }
            if index + 1 >= self.steps.len() {
                warnings.push(BatchWarning::DanglingApproval { index });
            }
        }

        warnings
    }
}

impl FromIterator<Step> for StepBatch {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a StepBatch {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
