//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `WalletActions`: Transaction submission and typed-data signing
//! - `StepSource`: Step batches from the order-construction service
//! - `StepObserver`: Execution telemetry

pub mod step_source;
pub mod telemetry;
pub mod wallet;
