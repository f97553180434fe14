//! Property-Based Tests - Step Engine Invariants
//!
//! Uses `proptest` to verify ordering, fail-fast and aggregation
//! invariants across random step batches. Async execution is driven
//! with `tokio_test::block_on` against a recording in-memory wallet.

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::json;

use collectible_trade_steps::domain::aggregator::aggregate;
use collectible_trade_steps::domain::message::SignableMessage;
use collectible_trade_steps::domain::step::{Step, StepBatch, StepKind};
use collectible_trade_steps::domain::wallet_kind::WalletKind;
use collectible_trade_steps::ports::wallet::{CallRequest, WalletActions, WalletError};
use collectible_trade_steps::usecases::StepSequencer;

// ── Recording Wallet ────────────────────────────────────────

/// Records the batch index of every step it is asked to perform. The
/// index is encoded in the call target's last byte, or in the signed
/// message's `orderId`.
struct RecordingWallet {
    calls: Mutex<Vec<usize>>,
    fail_at: Option<usize>,
}

impl RecordingWallet {
    fn new(fail_at: Option<usize>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at,
        }
    }

    fn record(&self, index: usize) -> Result<(), WalletError> {
        self.calls.lock().unwrap().push(index);
        if self.fail_at == Some(index) {
            return Err(WalletError::Network("injected".to_string()));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletActions for RecordingWallet {
    async fn send_transaction(&self, call: &CallRequest) -> Result<TxHash, WalletError> {
        let index = usize::from(call.to.0[19]);
        self.record(index)?;
        Ok(B256::with_last_byte(call.to.0[19]))
    }

    async fn sign_typed_data(&self, message: &SignableMessage) -> Result<Bytes, WalletError> {
        let index: usize = message
            .embedded_order_id()
            .and_then(|id| id.parse().ok())
            .expect("test messages carry their index");
        self.record(index)?;
        Ok(Bytes::from(vec![0u8; 65]))
    }
}

// ── Batch Generation ────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Shape {
    Approval,
    Transaction(u8),
    Signature(u8),
}

const KINDS: [&str; 6] = ["createListing", "createOffer", "buy", "sell", "cancel", "mintAndList"];

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Approval),
        (0u8..6).prop_map(Shape::Transaction),
        // Unknown kinds always route to transactions
        (0u8..5).prop_map(Shape::Signature),
    ]
}

fn build_step(index: usize, shape: Shape) -> Step {
    let target = Address::with_last_byte(u8::try_from(index).unwrap());
    match shape {
        Shape::Approval => Step::call(
            StepKind::TokenApproval,
            target,
            Bytes::from_static(&[0x09, 0x5e]),
            U256::ZERO,
        ),
        Shape::Transaction(k) => Step::call(
            StepKind::from(KINDS[usize::from(k)]),
            target,
            Bytes::from_static(&[0x01]),
            U256::from(index),
        ),
        Shape::Signature(k) => Step::signature(
            StepKind::from(KINDS[usize::from(k)]),
            None,
            json!({
                "domain": { "name": "Marketplace", "version": "1", "chainId": 1 },
                "types": { "Order": [{ "name": "orderId", "type": "string" }] },
                "primaryType": "Order",
                "value": { "orderId": index.to_string() }
            }),
        ),
    }
}

fn build_batch(shapes: &[Shape]) -> StepBatch {
    shapes
        .iter()
        .enumerate()
        .map(|(index, shape)| build_step(index, *shape))
        .collect()
}

/// Indices the sequencer is expected to hand to the wallet.
fn dispatched_indices(batch: &StepBatch, wallet_kind: WalletKind) -> Vec<usize> {
    batch
        .iter()
        .enumerate()
        .filter(|(_, step)| {
            !(step.kind == StepKind::TokenApproval && wallet_kind.has_implicit_allowance())
        })
        .map(|(index, _)| index)
        .collect()
}

fn wallet_kind() -> impl Strategy<Value = WalletKind> {
    prop_oneof![Just(WalletKind::External), Just(WalletKind::Embedded)]
}

// ── Ordering Properties ─────────────────────────────────────

proptest! {
    /// Every non-skipped step reaches the wallet exactly once, in batch order,
    /// and outcomes line up with those steps.
    #[test]
    fn execution_preserves_batch_order(
        shapes in prop::collection::vec(shape(), 0..12),
        kind in wallet_kind(),
    ) {
        let batch = build_batch(&shapes);
        let wallet = Arc::new(RecordingWallet::new(None));
        let sequencer = StepSequencer::new(Arc::clone(&wallet));

        let trace = tokio_test::block_on(sequencer.execute(&batch, kind)).unwrap();

        let expected = dispatched_indices(&batch, kind);
        prop_assert_eq!(wallet.calls(), expected.clone());
        let outcome_indices: Vec<usize> =
            trace.outcomes().iter().map(|o| o.step_index).collect();
        prop_assert_eq!(outcome_indices, expected);
        prop_assert_eq!(trace.outcomes().len() + trace.skipped.len(), batch.len());
    }

    /// Embedded wallets never see an approval step.
    #[test]
    fn embedded_wallet_never_dispatches_approvals(
        shapes in prop::collection::vec(shape(), 1..12),
    ) {
        let batch = build_batch(&shapes);
        let wallet = Arc::new(RecordingWallet::new(None));
        let sequencer = StepSequencer::new(Arc::clone(&wallet));

        tokio_test::block_on(sequencer.execute(&batch, WalletKind::Embedded)).unwrap();

        for index in wallet.calls() {
            prop_assert_ne!(&batch.steps()[index].kind, &StepKind::TokenApproval);
        }
    }
}

// ── Fail-fast Properties ────────────────────────────────────

proptest! {
    /// A failing step halts the batch: nothing after it is dispatched and the
    /// partial trace holds the dispatched steps before it, with any skipped
    /// approvals before it listed separately.
    #[test]
    fn failure_halts_batch(
        shapes in prop::collection::vec(shape(), 1..12),
        kind in wallet_kind(),
        pick in any::<prop::sample::Index>(),
    ) {
        let batch = build_batch(&shapes);
        let dispatched = dispatched_indices(&batch, kind);
        prop_assume!(!dispatched.is_empty());
        let fail_at = dispatched[pick.index(dispatched.len())];

        let wallet = Arc::new(RecordingWallet::new(Some(fail_at)));
        let sequencer = StepSequencer::new(Arc::clone(&wallet));

        let failure = tokio_test::block_on(sequencer.execute(&batch, kind)).unwrap_err();

        prop_assert_eq!(failure.step_index, fail_at);
        prop_assert_eq!(wallet.calls().last().copied(), Some(fail_at));
        prop_assert!(wallet.calls().iter().all(|&i| i <= fail_at));

        let completed: Vec<usize> = dispatched.iter().copied().filter(|&i| i < fail_at).collect();
        let outcome_indices: Vec<usize> =
            failure.partial.outcomes().iter().map(|o| o.step_index).collect();
        prop_assert_eq!(outcome_indices, completed);

        let skipped_before: Vec<usize> = (0..fail_at).filter(|i| !dispatched.contains(i)).collect();
        let skipped: Vec<usize> = failure.partial.skipped.iter().map(|s| s.step_index).collect();
        prop_assert_eq!(skipped, skipped_before);
        prop_assert!(
            failure.partial.skipped.iter().all(|s| s.kind == StepKind::TokenApproval)
        );
    }
}

// ── Aggregation Properties ──────────────────────────────────

proptest! {
    /// The primary outcome is the last one produced by a primary step kind.
    #[test]
    fn primary_is_last_primary_outcome(
        shapes in prop::collection::vec(shape(), 0..12),
    ) {
        let batch = build_batch(&shapes);
        let wallet = Arc::new(RecordingWallet::new(None));
        let sequencer = StepSequencer::new(wallet);

        let trace = tokio_test::block_on(sequencer.execute(&batch, WalletKind::External)).unwrap();
        let result = aggregate(trace.into_outcomes());

        let expected = batch
            .iter()
            .enumerate()
            .filter(|(_, step)| step.kind.is_primary())
            .map(|(index, _)| index)
            .next_back();
        prop_assert_eq!(result.primary.as_ref().map(|p| p.step_index), expected);
        prop_assert_eq!(result.outcomes.len(), batch.len());
    }
}
