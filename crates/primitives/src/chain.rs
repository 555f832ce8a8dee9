use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account or contract address qualified by the endpoint it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainAddress {
    /// Endpoint identifier, as registered in the endpoint table.
    pub chain: String,
    pub address: Address,
}

impl ChainAddress {
    pub fn new(chain: impl Into<String>, address: Address) -> Self {
        Self {
            chain: chain.into(),
            address,
        }
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}
