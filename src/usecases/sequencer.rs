//! Step Sequencer - Ordered, Fail-fast Batch Execution
//!
//! Walks a step batch strictly in order:
//! 1. Skip approvals the connected wallet does not need
//! 2. Classify the step (transaction vs. signature)
//! 3. Dispatch through the wallet adapter and wait for it to resolve
//! 4. Record the outcome, or stop at the first failure
//!
//! The wallet's signer is shared by every step of a batch, so steps are
//! never dispatched concurrently and a later step never starts before the
//! previous one resolved. No retries happen here; see `usecases::retry`.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::approval_policy::should_skip;
use crate::domain::classifier::{Modality, classify};
use crate::domain::outcome::{ExecutionOutcome, ExecutionTrace, StepOutcome};
use crate::domain::step::{Step, StepBatch, StepKind};
use crate::domain::wallet_kind::WalletKind;
use crate::ports::telemetry::StepObserver;
use crate::ports::wallet::{WalletActions, WalletError};

use super::wallet_adapter::WalletActionAdapter;

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
  /// The wallet cannot perform the operation the step's modality needs.
  #[error("wallet does not support {operation}")]
  UnsupportedWalletCapability { operation: &'static str },
  /// The user declined the wallet prompt.
  #[error("user rejected the wallet request")]
  UserRejected,
  #[error("insufficient funds")]
  InsufficientFunds,
  #[error("network error: {0}")]
  Network(String),
  /// The node refused the transaction; re-sending it fails the same way.
  #[error("rejected by node: {0}")]
  Rejected(String),
  #[error("signer error: {0}")]
  Signer(String),
  /// The step lacks what its modality requires (e.g. a target address).
  #[error("malformed step: {0}")]
  MalformedStep(String),
}

impl StepError {
  /// Whether the user cancelled, as opposed to something going wrong.
  pub const fn is_user_rejection(&self) -> bool {
    matches!(self, Self::UserRejected)
  }

  /// Whether re-dispatching the same step may succeed without user action.
  pub const fn is_retryable(&self) -> bool {
    matches!(self, Self::Network(_))
  }

  /// Stable label for metrics and logs.
  pub const fn reason(&self) -> &'static str {
    match self {
      Self::UnsupportedWalletCapability { .. } => "unsupported",
      Self::UserRejected => "user_rejected",
      Self::InsufficientFunds => "insufficient_funds",
      Self::Network(_) => "network",
      Self::Rejected(_) => "rejected",
      Self::Signer(_) => "signer",
      Self::MalformedStep(_) => "malformed",
    }
  }
}

impl From<WalletError> for StepError {
  fn from(err: WalletError) -> Self {
    match err {
      WalletError::UserRejected => Self::UserRejected,
      WalletError::InsufficientFunds => Self::InsufficientFunds,
      WalletError::Network(msg) => Self::Network(msg),
      WalletError::Rejected(msg) => Self::Rejected(msg),
      WalletError::Unsupported { operation } => Self::UnsupportedWalletCapability { operation },
      WalletError::Signer(msg) => Self::Signer(msg),
    }
  }
}

/// A halted batch: the failing step plus everything that succeeded before it.
#[derive(Debug, Error)]
#[error("{step_kind} step at index {step_index} failed: {cause}")]
pub struct StepFailure {
  /// Batch index of the failing step.
  pub step_index: usize,
  /// Kind of the failing step.
  pub step_kind: StepKind,
  #[source]
  pub cause: StepError,
  /// Outcomes and skips recorded before the failure.
  pub partial: ExecutionTrace,
}

impl StepFailure {
  /// Index to pass to `execute_from` to resume with the unexecuted tail.
  pub const fn resume_index(&self) -> usize {
    self.step_index
  }

  /// Message suitable for an end user: a cancellation notice when they
  /// declined, otherwise the failing action (e.g. "approval failed").
  pub fn user_message(&self) -> String {
    if self.cause.is_user_rejection() {
      "Request cancelled in wallet".to_string()
    } else {
      format!("{} failed", self.step_kind.label())
    }
  }
}

/// Executes step batches against one wallet.
pub struct StepSequencer<W: WalletActions + ?Sized> {
  adapter: WalletActionAdapter<W>,
  observer: Option<Arc<dyn StepObserver>>,
}

impl<W: WalletActions + ?Sized> StepSequencer<W> {
  /// Create a sequencer bound to a wallet.
  pub const fn new(wallet: Arc<W>) -> Self {
    Self {
      adapter: WalletActionAdapter::new(wallet),
      observer: None,
    }
  }

  /// Report execution events to `observer`.
  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
    self.observer = Some(observer);
    self
  }

  /// Execute a whole batch.
  pub async fn execute(
    &self,
    batch: &StepBatch,
    wallet_kind: WalletKind,
  ) -> Result<ExecutionTrace, StepFailure> {
    self.execute_from(batch, 0, wallet_kind).await
  }

  /// Execute `batch` starting at step `start`, keeping absolute indices.
  ///
  /// Used to resume the unexecuted tail after a failure. Re-running steps
  /// that already succeeded is the caller's responsibility to avoid.
  #[instrument(skip(self, batch, wallet_kind), fields(steps = batch.len(), wallet = %wallet_kind))]
  pub async fn execute_from(
    &self,
    batch: &StepBatch,
    start: usize,
    wallet_kind: WalletKind,
  ) -> Result<ExecutionTrace, StepFailure> {
    let mut trace = ExecutionTrace::start();
    info!(execution_id = %trace.execution_id, start, "Executing step batch");

    for (index, step) in batch.iter().enumerate().skip(start) {
      if should_skip(step, wallet_kind) {
        info!(index, kind = %step.kind, "Skipping approval, wallet has implicit allowance");
        trace.record_skip(index, step.kind.clone());
        if let Some(observer) = &self.observer {
          observer.step_skipped(&step.kind);
        }
        continue;
      }

      let classification = classify(step);
      if let Some(warning) = classification.warning {
        warn!(index, kind = %step.kind, %warning, "Step classification warning");
        trace.record_warning(index, warning);
      }

      let started = Instant::now();
      match self.dispatch(index, step, classification.modality).await {
        Ok(outcome) => {
          let elapsed = started.elapsed();
          info!(
            index,
            kind = %step.kind,
            modality = classification.modality.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Step resolved"
          );
          if let Some(observer) = &self.observer {
            observer.step_dispatched(&step.kind, classification.modality, elapsed);
          }
          trace.record_outcome(StepOutcome {
            step_index: index,
            kind: step.kind.clone(),
            outcome,
          });
        }
        Err(cause) => {
          warn!(
            index,
            kind = %step.kind,
            reason = cause.reason(),
            error = %cause,
            completed = trace.outcomes().len(),
            "Step failed, halting batch"
          );
          if let Some(observer) = &self.observer {
            observer.step_failed(&step.kind, cause.reason());
          }
          return Err(StepFailure {
            step_index: index,
            step_kind: step.kind.clone(),
            cause,
            partial: trace.finish(),
          });
        }
      }
    }

    let trace = trace.finish();
    info!(
      execution_id = %trace.execution_id,
      outcomes = trace.outcomes().len(),
      skipped = trace.skipped.len(),
      "Step batch complete"
    );
    Ok(trace)
  }

  /// Route one step to the wallet operation its modality requires.
  async fn dispatch(
    &self,
    index: usize,
    step: &Step,
    modality: Modality,
  ) -> Result<ExecutionOutcome, StepError> {
    match modality {
      Modality::Transaction => {
        let target = step.target.ok_or_else(|| {
          StepError::MalformedStep(format!("{} step {index} has no target address", step.kind))
        })?;
        self
          .adapter
          .submit_transaction(target, step.payload.clone(), step.native_value)
          .await
          .map_err(StepError::from)
      }
      Modality::Signature => {
        let message = step.signable_message().ok_or_else(|| {
          StepError::MalformedStep(format!("{} step {index} has no typed-data message", step.kind))
        })?;
        self
          .adapter
          .sign_typed_data(&message)
          .await
          .map_err(StepError::from)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wallet_error_mapping() {
    assert_eq!(StepError::from(WalletError::UserRejected), StepError::UserRejected);
    assert_eq!(
      StepError::from(WalletError::Unsupported { operation: "sign_typed_data" }),
      StepError::UnsupportedWalletCapability { operation: "sign_typed_data" }
    );
    assert!(StepError::from(WalletError::Network("timeout".into())).is_retryable());
    assert!(!StepError::InsufficientFunds.is_retryable());
    let reverted = StepError::from(WalletError::Rejected("execution reverted".into()));
    assert_eq!(reverted.reason(), "rejected");
    assert!(!reverted.is_retryable());
    assert!(StepError::UserRejected.is_user_rejection());
  }

  #[test]
  fn test_user_message() {
    let failure = StepFailure {
      step_index: 0,
      step_kind: StepKind::TokenApproval,
      cause: StepError::Network("503".into()),
      partial: ExecutionTrace::start(),
    };
    assert_eq!(failure.user_message(), "approval failed");

    let rejected = StepFailure {
      step_index: 1,
      step_kind: StepKind::CreateListing,
      cause: StepError::UserRejected,
      partial: ExecutionTrace::start(),
    };
    assert_eq!(rejected.user_message(), "Request cancelled in wallet");
    assert_eq!(rejected.resume_index(), 1);

    let listing = StepFailure {
      cause: StepError::InsufficientFunds,
      ..rejected
    };
    assert_eq!(listing.user_message(), "listing creation failed");
  }
}
