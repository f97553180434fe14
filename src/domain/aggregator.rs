//! Result aggregation.
//!
//! Collapses a batch's outcomes into the full ordered list plus the
//! "primary" outcome: the result of the economically meaningful step
//! (listing, offer, buy, sell or cancel) as opposed to its approval.

use serde::Serialize;

use super::outcome::{ExecutionOutcome, StepOutcome};

/// Outcomes of a batch with the primary result singled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedResult {
    /// All outcomes, in step order.
    pub outcomes: Vec<StepOutcome>,
    /// Last outcome produced by a primary step kind, if any.
    pub primary: Option<StepOutcome>,
}

impl AggregatedResult {
    /// Order id derived from a signed primary message.
    pub fn primary_order_id(&self) -> Option<&str> {
        self.primary
            .as_ref()
            .and_then(|p| p.outcome.derived_order_id())
    }

    /// Transaction hash of an on-chain primary step.
    pub fn primary_tx_hash(&self) -> Option<&alloy::primitives::TxHash> {
        self.primary.as_ref().and_then(|p| p.outcome.tx_hash())
    }

    /// Best identifier for the primary result: the derived order id when
    /// one exists, otherwise the transaction hash.
    pub fn primary_reference(&self) -> Option<String> {
        let primary = self.primary.as_ref()?;
        match &primary.outcome {
            ExecutionOutcome::Transaction { hash } => Some(hash.to_string()),
            ExecutionOutcome::Signature {
                derived_order_id, ..
            } => derived_order_id.clone(),
        }
    }
}

/// Aggregate outcomes. Pure; preserves order.
pub fn aggregate(outcomes: Vec<StepOutcome>) -> AggregatedResult {
    let primary = outcomes.iter().rev().find(|o| o.kind.is_primary()).cloned();
    AggregatedResult { outcomes, primary }
}
