//! Chain Adapters - EVM Wallet Integrations
//!
//! Provides `WalletActions` implementations via alloy-rs 0.9:
//! - RPC provider management with chain id validation
//! - Local-key wallet with JSON-RPC error mapping and receipt polling
//! - Offline dry-run wallet

pub mod dry_run;
pub mod provider;
pub mod wallet;

pub use dry_run::DryRunWallet;
pub use provider::ChainProvider;
pub use wallet::AlloyWallet;
