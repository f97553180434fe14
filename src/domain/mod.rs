//! Domain layer - Step model and execution rules.
//!
//! Pure types and decisions for the step execution engine: the step
//! vocabulary, modality classification, approval skipping and result
//! aggregation. Nothing here talks to a wallet or the network.

pub mod aggregator;
pub mod approval_policy;
pub mod classifier;
pub mod message;
pub mod outcome;
pub mod step;
pub mod wallet_kind;

// Re-export core types for convenience
pub use aggregator::{AggregatedResult, aggregate};
pub use approval_policy::should_skip;
pub use classifier::{Classification, ClassificationWarning, Modality, classify};
pub use message::SignableMessage;
pub use outcome::{ExecutionOutcome, ExecutionTrace, SkippedStep, StepOutcome, StepWarning};
pub use step::{BatchWarning, Step, StepBatch, StepKind};
pub use wallet_kind::WalletKind;
