//! Approval skip policy.
//!
//! Wallets with backend-managed allowance never need an on-chain approval,
//! so an approval step in their batch is dropped instead of prompting the
//! user for a pointless transaction.

use super::step::{Step, StepKind};
use super::wallet_kind::WalletKind;

/// Whether `step` is redundant for the connected wallet.
///
/// Only ever true for `TokenApproval` steps. Advisory: it decides whether
/// the step is dispatched, not how it is classified.
pub fn should_skip(step: &Step, wallet_kind: WalletKind) -> bool {
    step.kind == StepKind::TokenApproval && wallet_kind.has_implicit_allowance()
}
