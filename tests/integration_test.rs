//! Integration Tests - End-to-end Step Execution
//!
//! Tests the interaction between the sequencer, the retry decorator,
//! aggregation and a mocked wallet. Uses mockall for trait mocking and
//! tokio::test for async tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, TxHash, U256, address};
use mockall::{Sequence, mock};
use serde_json::{Value, json};

use collectible_trade_steps::domain::aggregator::aggregate;
use collectible_trade_steps::domain::classifier::ClassificationWarning;
use collectible_trade_steps::domain::message::SignableMessage;
use collectible_trade_steps::domain::outcome::ExecutionOutcome;
use collectible_trade_steps::domain::step::{Step, StepBatch, StepKind};
use collectible_trade_steps::domain::wallet_kind::WalletKind;
use collectible_trade_steps::ports::wallet::{CallRequest, WalletActions, WalletError};
use collectible_trade_steps::usecases::{RetryPolicy, RetryingSequencer, StepError, StepSequencer};

// ---- Mock Definitions ----

mock! {
    pub Wallet {}

    #[async_trait::async_trait]
    impl WalletActions for Wallet {
        async fn send_transaction(&self, call: &CallRequest) -> Result<TxHash, WalletError>;
        async fn sign_typed_data(&self, message: &SignableMessage) -> Result<Bytes, WalletError>;
    }
}

// ---- Fixtures ----

const TOKEN: Address = address!("00000000000000000000000000000000000000e2");
const CONDUIT: Address = address!("00000000000000000000000000000000000000c3");

fn hash(byte: u8) -> TxHash {
    B256::repeat_byte(byte)
}

fn approval() -> Step {
    Step::call(
        StepKind::TokenApproval,
        TOKEN,
        Bytes::from_static(&[0x09, 0x5e, 0xa7, 0xb3]),
        U256::ZERO,
    )
}

fn call_step(kind: StepKind, value: u64) -> Step {
    Step::call(kind, CONDUIT, Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]), U256::from(value))
}

fn offer_envelope(order_id: &str) -> Value {
    json!({
        "domain": {
            "name": "Marketplace",
            "version": "1",
            "chainId": 137,
            "verifyingContract": "0x00000000000000000000000000000000000000c3"
        },
        "types": {
            "Offer": [
                { "name": "orderId", "type": "string" },
                { "name": "pricePerToken", "type": "uint256" }
            ]
        },
        "primaryType": "Offer",
        "value": { "orderId": order_id, "pricePerToken": "1000" }
    })
}

fn offer_signature_step(order_id: &str) -> Step {
    Step::signature(StepKind::CreateOffer, Some(CONDUIT), offer_envelope(order_id))
}

fn sequencer(wallet: MockWallet) -> StepSequencer<MockWallet> {
    StepSequencer::new(Arc::new(wallet))
}

// ---- End-to-end Scenarios ----

#[tokio::test]
async fn test_listing_with_external_wallet_runs_both_transactions_in_order() {
    let mut wallet = MockWallet::new();
    let mut seq = Sequence::new();

    wallet
        .expect_send_transaction()
        .withf(|call| call.to == TOKEN)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(hash(0xA)));
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == CONDUIT)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(hash(0xB)));
    wallet.expect_sign_typed_data().never();

    let batch = StepBatch::new(vec![approval(), call_step(StepKind::CreateListing, 0)]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();

    assert!(trace.skipped.is_empty());
    let result = aggregate(trace.into_outcomes());
    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.outcomes[0].outcome.tx_hash(), Some(&hash(0xA)));
    assert_eq!(result.outcomes[1].outcome.tx_hash(), Some(&hash(0xB)));
    assert_eq!(result.primary_tx_hash(), Some(&hash(0xB)));
}

#[tokio::test]
async fn test_offer_with_embedded_wallet_skips_approval_and_signs() {
    let mut wallet = MockWallet::new();
    wallet.expect_send_transaction().never();
    wallet
        .expect_sign_typed_data()
        .withf(|message| message.primary_type() == "Offer")
        .times(1)
        .returning(|_| Ok(Bytes::from_static(&[0x5a; 65])));

    let batch = StepBatch::new(vec![approval(), offer_signature_step("offer-77")]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::Embedded)
        .await
        .unwrap();

    assert!(trace.was_skipped(0));
    let result = aggregate(trace.into_outcomes());
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].step_index, 1);
    match &result.outcomes[0].outcome {
        ExecutionOutcome::Signature {
            signature,
            derived_order_id,
        } => {
            assert_eq!(signature.len(), 65);
            assert_eq!(derived_order_id.as_deref(), Some("offer-77"));
        }
        other => panic!("expected signature outcome, got {other:?}"),
    }
    assert_eq!(result.primary_order_id(), Some("offer-77"));
}

#[tokio::test]
async fn test_rejected_approval_halts_before_buy() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == TOKEN)
        .times(1)
        .returning(|_| Err(WalletError::UserRejected));
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == CONDUIT)
        .never();

    let batch = StepBatch::new(vec![approval(), call_step(StepKind::Buy, 1_000)]);
    let failure = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap_err();

    assert_eq!(failure.step_index, 0);
    assert_eq!(failure.step_kind, StepKind::TokenApproval);
    assert_eq!(failure.cause, StepError::UserRejected);
    assert!(failure.partial.outcomes().is_empty());
    assert_eq!(failure.user_message(), "Request cancelled in wallet");
}

// ---- Routing, Skip and Failure Behavior ----

#[tokio::test]
async fn test_signature_step_never_reaches_send_transaction() {
    let mut wallet = MockWallet::new();
    wallet.expect_send_transaction().never();
    wallet
        .expect_sign_typed_data()
        .times(1)
        .returning(|_| Ok(Bytes::from_static(&[1; 65])));

    let batch = StepBatch::new(vec![offer_signature_step("o-1")]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();
    assert_eq!(trace.outcomes().len(), 1);
}

#[tokio::test]
async fn test_buy_forwards_target_data_and_value() {
    let mut wallet = MockWallet::new();
    wallet.expect_sign_typed_data().never();
    wallet
        .expect_send_transaction()
        .withf(|call| {
            call.to == CONDUIT
                && call.data[..] == [0xde, 0xad, 0xbe, 0xef]
                && call.value == U256::from(2_500)
        })
        .times(1)
        .returning(|_| Ok(hash(0x01)));

    let batch = StepBatch::new(vec![call_step(StepKind::Buy, 2_500)]);
    sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_external_wallet_executes_approval() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(2)
        .returning(|call| Ok(if call.to == TOKEN { hash(1) } else { hash(2) }));

    let batch = StepBatch::new(vec![approval(), call_step(StepKind::Sell, 0)]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();
    assert!(!trace.was_skipped(0));
    assert_eq!(trace.outcomes()[0].kind, StepKind::TokenApproval);
}

#[tokio::test]
async fn test_approval_only_batch_has_no_primary() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Ok(hash(0x11)));

    let batch = StepBatch::new(vec![approval()]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();
    let result = aggregate(trace.into_outcomes());
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.primary.is_none());
}

#[tokio::test]
async fn test_unknown_kind_falls_back_to_transaction_with_warning() {
    let mut wallet = MockWallet::new();
    wallet.expect_sign_typed_data().never();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Ok(hash(0x22)));

    let batch = StepBatch::new(vec![call_step(StepKind::from("mintAndList"), 0)]);
    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();

    assert_eq!(trace.outcomes().len(), 1);
    assert_eq!(trace.warnings.len(), 1);
    assert_eq!(
        trace.warnings[0].warning,
        ClassificationWarning::UnrecognizedKind("mintAndList".to_string())
    );
}

#[tokio::test]
async fn test_wallet_without_signing_reports_unsupported_capability() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Ok(hash(0x33)));
    wallet.expect_sign_typed_data().times(1).returning(|_| {
        Err(WalletError::Unsupported {
            operation: "sign_typed_data",
        })
    });

    let batch = StepBatch::new(vec![approval(), offer_signature_step("o-2")]);
    let failure = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap_err();

    assert_eq!(failure.step_index, 1);
    assert_eq!(
        failure.cause,
        StepError::UnsupportedWalletCapability {
            operation: "sign_typed_data"
        }
    );
    assert_eq!(failure.partial.outcomes().len(), 1);
    assert_eq!(failure.user_message(), "offer creation failed");
}

#[tokio::test]
async fn test_transaction_step_without_target_is_malformed() {
    let mut wallet = MockWallet::new();
    wallet.expect_send_transaction().never();

    let mut step = call_step(StepKind::Buy, 0);
    step.target = None;
    let batch = StepBatch::new(vec![step]);

    let failure = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap_err();
    assert!(matches!(failure.cause, StepError::MalformedStep(_)));
}

#[tokio::test]
async fn test_unparseable_envelope_never_reaches_send_transaction() {
    let mut wallet = MockWallet::new();
    wallet.expect_send_transaction().never();
    wallet.expect_sign_typed_data().never();

    let step = Step::signature(
        StepKind::CreateListing,
        Some(CONDUIT),
        json!({
            "domain": { "name": "Marketplace", "version": "1", "chainId": 137 },
            "types": { "Order": "bad" },
            "primaryType": "Order",
            "value": { "orderId": "o-3" }
        }),
    );
    let batch = StepBatch::new(vec![step]);

    let failure = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap_err();
    assert_eq!(failure.step_index, 0);
    assert!(matches!(failure.cause, StepError::MalformedStep(_)));
    assert!(failure.partial.outcomes().is_empty());
}

#[tokio::test]
async fn test_empty_batch_produces_empty_trace() {
    let mut wallet = MockWallet::new();
    wallet.expect_send_transaction().never();
    wallet.expect_sign_typed_data().never();

    let trace = sequencer(wallet)
        .execute(&StepBatch::default(), WalletKind::External)
        .await
        .unwrap();
    assert!(trace.outcomes().is_empty());
    assert!(trace.finished_at.is_some());
}

#[tokio::test]
async fn test_backend_json_batch_executes() {
    let batch: StepBatch = serde_json::from_value(json!([
        {
            "id": "tokenApproval",
            "to": "0x00000000000000000000000000000000000000e2",
            "data": "0x095ea7b3",
            "value": "",
            "price": ""
        },
        {
            "id": "createOffer",
            "to": "",
            "data": "",
            "value": "0",
            "price": "1000",
            "signature": offer_envelope("offer-json")
        }
    ]))
    .unwrap();

    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Ok(hash(0x44)));
    wallet
        .expect_sign_typed_data()
        .times(1)
        .returning(|_| Ok(Bytes::from_static(&[7; 65])));

    let trace = sequencer(wallet)
        .execute(&batch, WalletKind::External)
        .await
        .unwrap();
    let result = aggregate(trace.into_outcomes());
    assert_eq!(result.primary_order_id(), Some("offer-json"));
}

// ---- Retry Decorator ----

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_retry_resumes_at_failed_step_without_repeating_earlier_steps() {
    let mut wallet = MockWallet::new();
    let buy_attempts = Arc::new(AtomicUsize::new(0));

    wallet
        .expect_send_transaction()
        .withf(|call| call.to == TOKEN)
        .times(1)
        .returning(|_| Ok(hash(0xA1)));
    let attempts = Arc::clone(&buy_attempts);
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == CONDUIT)
        .times(2)
        .returning(move |_| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(WalletError::Network("connection reset".to_string()))
            } else {
                Ok(hash(0xB2))
            }
        });

    let runner = RetryingSequencer::new(sequencer(wallet), fast_retry(2));
    let batch = StepBatch::new(vec![approval(), call_step(StepKind::Buy, 10)]);
    let trace = runner.execute(&batch, WalletKind::External).await.unwrap();

    assert_eq!(buy_attempts.load(Ordering::SeqCst), 2);
    let result = aggregate(trace.into_outcomes());
    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.outcomes[0].step_index, 0);
    assert_eq!(result.outcomes[1].step_index, 1);
    assert_eq!(result.primary_tx_hash(), Some(&hash(0xB2)));
}

#[tokio::test]
async fn test_retry_does_not_retry_user_rejection() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Err(WalletError::UserRejected));

    let runner = RetryingSequencer::new(sequencer(wallet), fast_retry(3));
    let batch = StepBatch::new(vec![call_step(StepKind::Buy, 0)]);
    let failure = runner.execute(&batch, WalletKind::External).await.unwrap_err();
    assert!(failure.cause.is_user_rejection());
}

#[tokio::test]
async fn test_retry_does_not_resend_node_rejection() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .times(1)
        .returning(|_| Err(WalletError::Rejected("execution reverted".to_string())));

    let runner = RetryingSequencer::new(sequencer(wallet), fast_retry(3));
    let batch = StepBatch::new(vec![call_step(StepKind::Buy, 0)]);
    let failure = runner.execute(&batch, WalletKind::External).await.unwrap_err();

    assert_eq!(failure.cause, StepError::Rejected("execution reverted".to_string()));
    assert_eq!(failure.user_message(), "purchase failed");
}

#[tokio::test]
async fn test_retry_gives_up_and_keeps_partial_trace() {
    let mut wallet = MockWallet::new();
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == TOKEN)
        .times(1)
        .returning(|_| Ok(hash(0xC1)));
    wallet
        .expect_send_transaction()
        .withf(|call| call.to == CONDUIT)
        .times(3)
        .returning(|_| Err(WalletError::Network("timeout".to_string())));

    let runner = RetryingSequencer::new(sequencer(wallet), fast_retry(2));
    let batch = StepBatch::new(vec![approval(), call_step(StepKind::Buy, 0)]);
    let failure = runner.execute(&batch, WalletKind::External).await.unwrap_err();

    assert_eq!(failure.step_index, 1);
    assert_eq!(failure.cause.reason(), "network");
    assert_eq!(failure.partial.outcomes().len(), 1);
    assert_eq!(failure.partial.outcomes()[0].outcome.tx_hash(), Some(&hash(0xC1)));
}
