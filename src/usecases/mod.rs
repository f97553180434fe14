//! Use Cases Layer - Step Execution Orchestration
//!
//! Combines the domain rules with the wallet port to execute backend
//! step batches.
//!
//! Use cases:
//! - `WalletActionAdapter`: Outcome shaping over any wallet integration
//! - `StepSequencer`: In-order, fail-fast batch execution
//! - `RetryingSequencer`: Resume-on-network-failure decorator

pub mod retry;
pub mod sequencer;
pub mod wallet_adapter;

pub use retry::{RetryPolicy, RetryingSequencer};
pub use sequencer::{StepError, StepFailure, StepSequencer};
pub use wallet_adapter::WalletActionAdapter;
