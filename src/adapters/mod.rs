//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, blockchain RPC, metrics).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Marketplace order-construction REST client
//! - `chain`: EVM wallets via alloy-rs
//! - `metrics`: Prometheus step metrics

pub mod api;
pub mod chain;
pub mod metrics;
