//! Bridge pair descriptors.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use supply_audit_primitives::ChainAddress;

/// A native coin escrowed in a plain account on one chain, minted as a
/// wrapped token by a burner contract on another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherBurnPair {
    pub name: String,
    /// Lock account receiving the native coin.
    pub ether: ChainAddress,
    /// Burner contract; `token()` returns the wrapped token.
    pub burner: ChainAddress,
}

/// An ERC20 token escrowed by a locker contract on one chain, minted as a
/// wrapped token by a burner contract on another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBurnPair {
    pub name: String,
    /// Locker contract; `token()` returns the escrowed token.
    pub locker: ChainAddress,
    /// Burner contract; `token()` returns the wrapped token.
    pub burner: ChainAddress,
}

impl TokenBurnPair {
    /// Account whose balance of the escrowed token counts as locked.
    ///
    /// Lockers hold escrow at their own address. Bridges that park funds in
    /// a separate vault are not supported.
    pub fn escrow_holder(&self) -> Address {
        self.locker.address
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PairDescriptor {
    EtherBurn(EtherBurnPair),
    TokenBurn(TokenBurnPair),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairKind {
    EtherBurn,
    TokenBurn,
}

impl fmt::Display for PairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EtherBurn => f.write_str("ether-burn"),
            Self::TokenBurn => f.write_str("token-burn"),
        }
    }
}

impl PairDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::EtherBurn(pair) => &pair.name,
            Self::TokenBurn(pair) => &pair.name,
        }
    }

    pub fn kind(&self) -> PairKind {
        match self {
            Self::EtherBurn(_) => PairKind::EtherBurn,
            Self::TokenBurn(_) => PairKind::TokenBurn,
        }
    }

    /// Side where the asset is locked.
    pub fn source(&self) -> &ChainAddress {
        match self {
            Self::EtherBurn(pair) => &pair.ether,
            Self::TokenBurn(pair) => &pair.locker,
        }
    }

    /// Side where the wrapped asset is minted.
    pub fn destination(&self) -> &ChainAddress {
        match self {
            Self::EtherBurn(pair) => &pair.burner,
            Self::TokenBurn(pair) => &pair.burner,
        }
    }
}
