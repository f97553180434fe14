//! Telemetry Port - Step Execution Observer
//!
//! Lets the sequencer report dispatches, skips and failures without
//! depending on a metrics backend. The Prometheus adapter implements it.

use std::time::Duration;

use crate::domain::classifier::Modality;
use crate::domain::step::StepKind;

/// Receives step execution events. Calls are synchronous and must be cheap.
pub trait StepObserver: Send + Sync + 'static {
  /// A step's wallet interaction resolved successfully.
  fn step_dispatched(&self, kind: &StepKind, modality: Modality, wallet_latency: Duration);

  /// A step was skipped by the approval policy.
  fn step_skipped(&self, kind: &StepKind);

  /// A step failed; `reason` is a short, stable label.
  fn step_failed(&self, kind: &StepKind, reason: &'static str);
}
