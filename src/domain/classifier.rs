//! Step classification.
//!
//! Decides how a step must be executed. The backend reuses the same kind
//! tag for both on-chain and off-chain variants (a `createOffer` may be a
//! contract call or an order signature depending on the orderbook), so the
//! modality comes from the payload shape, not the tag.

use serde::Serialize;
use thiserror::Error;

use super::step::{Step, StepKind};

/// How a step reaches the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// On-chain transaction (`send_transaction`).
    Transaction,
    /// Off-chain EIP-712 signature (`sign_typed_data`).
    Signature,
}

impl Modality {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Signature => "signature",
        }
    }
}

/// Non-fatal findings raised while classifying a step.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "warning", content = "detail", rename_all = "camelCase")]
pub enum ClassificationWarning {
    #[error("unrecognized step kind `{0}`, falling back to on-chain transaction")]
    UnrecognizedKind(String),
    #[error("step carries both call data and a typed-data message, executing as transaction")]
    AmbiguousPayload,
}

/// Result of classifying one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: StepKind,
    pub modality: Modality,
    pub warning: Option<ClassificationWarning>,
}

/// Classify a step. Pure; never fails.
///
/// Signature modality requires a signature envelope and no call data. An
/// envelope that does not parse as typed data still classifies as a
/// signature, so it fails at dispatch instead of reaching the chain.
/// Unrecognized kinds always fall back to transaction modality.
pub fn classify(step: &Step) -> Classification {
    if let StepKind::Unknown(tag) = &step.kind {
        return Classification {
            kind: step.kind.clone(),
            modality: Modality::Transaction,
            warning: Some(ClassificationWarning::UnrecognizedKind(tag.clone())),
        };
    }

    // Parseability is checked at dispatch; an envelope alone decides modality.
    let (modality, warning) = match (step.has_message(), step.has_call_data()) {
        (true, false) => (Modality::Signature, None),
        (true, true) => (
            Modality::Transaction,
            Some(ClassificationWarning::AmbiguousPayload),
        ),
        (false, _) => (Modality::Transaction, None),
    };

    Classification {
        kind: step.kind.clone(),
        modality,
        warning,
    }
}
