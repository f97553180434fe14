//! Collectible Trade Steps - Library Root
//!
//! Executes the ordered step batches a marketplace backend returns for a
//! trade (approvals, listings, offers, buys, sells, cancels) against a
//! wallet, one step at a time.
//!
//! Re-exports all modules for the runner binary, integration tests and
//! benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
