//! Retry Decorator - Caller-level Recovery around the Sequencer
//!
//! The sequencer is strictly fail-fast. This wrapper re-invokes it on the
//! unexecuted tail of the batch after transient (network) failures, with
//! exponential backoff. Steps that already succeeded are never dispatched
//! again; user rejections, insufficient funds and other non-transient
//! failures are surfaced immediately.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::domain::outcome::ExecutionTrace;
use crate::domain::step::StepBatch;
use crate::domain::wallet_kind::WalletKind;
use crate::ports::wallet::WalletActions;

use super::sequencer::{StepFailure, StepSequencer};

/// Backoff configuration for transient step failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Maximum re-invocations after the first attempt.
  pub max_retries: u32,
  /// Delay before the first retry; doubles for each further retry.
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 2,
      base_delay: Duration::from_millis(500),
    }
  }
}

impl RetryPolicy {
  /// Policy that never retries.
  pub const fn none() -> Self {
    Self {
      max_retries: 0,
      base_delay: Duration::ZERO,
    }
  }

  /// Delay before retry number `attempt` (1-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
  }
}

/// `StepSequencer` wrapped with resume-on-transient-failure.
pub struct RetryingSequencer<W: WalletActions + ?Sized> {
  inner: StepSequencer<W>,
  policy: RetryPolicy,
}

impl<W: WalletActions + ?Sized> RetryingSequencer<W> {
  /// Wrap a sequencer.
  pub const fn new(inner: StepSequencer<W>, policy: RetryPolicy) -> Self {
    Self { inner, policy }
  }

  /// The wrapped sequencer.
  pub const fn inner(&self) -> &StepSequencer<W> {
    &self.inner
  }

  pub const fn policy(&self) -> RetryPolicy {
    self.policy
  }

  /// Execute `batch`, resuming at the failing step after network errors.
  ///
  /// On final failure the returned `StepFailure::partial` holds every
  /// outcome accumulated across attempts.
  #[instrument(skip_all, fields(steps = batch.len(), max_retries = self.policy.max_retries))]
  pub async fn execute(
    &self,
    batch: &StepBatch,
    wallet_kind: WalletKind,
  ) -> Result<ExecutionTrace, StepFailure> {
    let mut accumulated: Option<ExecutionTrace> = None;
    let mut start = 0;
    let mut attempt = 0u32;

    loop {
      match self.inner.execute_from(batch, start, wallet_kind).await {
        Ok(trace) => {
          if attempt > 0 {
            info!(attempts = attempt + 1, "Batch completed after retry");
          }
          return Ok(merge_into(accumulated, trace));
        }
        Err(mut failure) => {
          let partial = std::mem::replace(&mut failure.partial, ExecutionTrace::start());
          let merged = merge_into(accumulated.take(), partial);

          if !failure.cause.is_retryable() || attempt >= self.policy.max_retries {
            failure.partial = merged;
            return Err(failure);
          }

          attempt += 1;
          let delay = self.policy.delay_for(attempt);
          warn!(
            attempt,
            resume_at = failure.resume_index(),
            delay_ms = delay.as_millis() as u64,
            error = %failure.cause,
            "Transient step failure, retrying tail"
          );

          start = failure.resume_index();
          accumulated = Some(merged);
          sleep(delay).await;
        }
      }
    }
  }
}

fn merge_into(accumulated: Option<ExecutionTrace>, next: ExecutionTrace) -> ExecutionTrace {
  match accumulated {
    Some(mut earlier) => {
      earlier.merge(next);
      earlier
    }
    None => next,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_backoff_doubles() {
    let policy = RetryPolicy {
      max_retries: 3,
      base_delay: Duration::from_millis(200),
    };
    assert_eq!(policy.delay_for(1), Duration::from_millis(200));
    assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    assert_eq!(policy.delay_for(3), Duration::from_millis(800));
  }

  #[test]
  fn test_none_policy() {
    let policy = RetryPolicy::none();
    assert_eq!(policy.max_retries, 0);
    assert_eq!(policy.delay_for(1), Duration::ZERO);
  }
}
