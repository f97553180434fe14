//! Execution outcomes and traces.
//!
//! Outcomes live only for the duration of one batch execution and are
//! handed back to the caller; nothing here is persisted.

use alloy::primitives::{Bytes, TxHash};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::classifier::ClassificationWarning;
use super::step::StepKind;

/// Result of one resolved wallet interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionOutcome {
    /// Transaction accepted and broadcast by the wallet.
    Transaction { hash: TxHash },
    /// Typed data signed by the wallet.
    #[serde(rename_all = "camelCase")]
    Signature {
        signature: Bytes,
        derived_order_id: Option<String>,
    },
}

impl ExecutionOutcome {
    pub const fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            Self::Transaction { hash } => Some(hash),
            Self::Signature { .. } => None,
        }
    }

    pub fn derived_order_id(&self) -> Option<&str> {
        match self {
            Self::Signature {
                derived_order_id, ..
            } => derived_order_id.as_deref(),
            Self::Transaction { .. } => None,
        }
    }
}

/// An outcome tied back to the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Index of the originating step in its batch.
    pub step_index: usize,
    /// Kind of the originating step.
    pub kind: StepKind,
    pub outcome: ExecutionOutcome,
}

/// Marker for a step that was skipped without wallet interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedStep {
    pub step_index: usize,
    pub kind: StepKind,
}

/// Classification warning raised for a specific step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepWarning {
    pub step_index: usize,
    pub warning: ClassificationWarning,
}

/// Ordered record of one batch execution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    /// Correlation id for logs.
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// One entry per dispatched step, in batch order.
    pub outcomes: Vec<StepOutcome>,
    pub skipped: Vec<SkippedStep>,
    pub warnings: Vec<StepWarning>,
}

impl ExecutionTrace {
    /// Open a new, empty trace.
    pub fn start() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_outcome(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn record_skip(&mut self, step_index: usize, kind: StepKind) {
        self.skipped.push(SkippedStep { step_index, kind });
    }

    pub fn record_warning(&mut self, step_index: usize, warning: ClassificationWarning) {
        self.warnings.push(StepWarning {
            step_index,
            warning,
        });
    }

    /// Stamp the finish time.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Append a trace produced by a later execution of the same batch
    /// (e.g. a resumed tail). Keeps this trace's id and start time.
    ///
    /// A resumed tail re-classifies its first step, so warnings already
    /// recorded are not duplicated.
    pub fn merge(&mut self, later: Self) {
        self.outcomes.extend(later.outcomes);
        self.skipped.extend(later.skipped);
        for warning in later.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        self.finished_at = later.finished_at.or(self.finished_at);
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<StepOutcome> {
        self.outcomes
    }

    pub fn was_skipped(&self, step_index: usize) -> bool {
        self.skipped.iter().any(|s| s.step_index == step_index)
    }
}
