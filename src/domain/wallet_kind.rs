//! Connected wallet category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of the connected wallet, owned by the calling context.
///
/// Only approval skipping looks at it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// General external wallet (browser extension, hardware, local key).
    #[default]
    External,
    /// First-party managed wallet whose spend authorization is guaranteed
    /// by the custodial/smart-wallet layer.
    Embedded,
}

impl WalletKind {
    /// Whether spend allowance is managed by the wallet backend, making
    /// on-chain approval transactions redundant.
    pub const fn has_implicit_allowance(self) -> bool {
        matches!(self, Self::Embedded)
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Embedded => write!(f, "embedded"),
        }
    }
}
