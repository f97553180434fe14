//! Marketplace API Adapter
//!
//! Implements the HTTP side of order construction: the backend is asked
//! for the steps a trade requires and answers with an ordered batch.
//!
//! Sub-modules:
//! - `client`: HTTP client with concurrency limiting and retries
//! - `steps`: `StepSource` implementation over the `Generate*` endpoints
//! - `types`: API request/response type definitions

pub mod client;
pub mod steps;
pub mod types;

pub use client::{MarketplaceClient, MarketplaceClientConfig};
pub use steps::HttpStepSource;
