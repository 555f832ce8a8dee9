//! Cross-chain supply reconciliation for lock/mint token bridges.
//!
//! For every bridge pair in a catalog this crate reads the amount locked on
//! the source chain and the wrapped supply minted on the destination chain,
//! and checks that the two are exactly equal.

pub mod client;
pub mod config;
pub mod metrics;
pub mod pair;
pub mod registry;
pub mod report;
pub mod retry;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use client::{ChainClient, ChainHead, ClientError, RpcChainClient};
pub use config::{ConfigError, RpcConfig, VerifierConfig};
pub use pair::{EtherBurnPair, PairDescriptor, PairKind, TokenBurnPair};
pub use registry::{EndpointRegistry, RegistryError};
pub use report::{ExitStatus, RunReport};
pub use retry::RetryPolicy;
pub use verifier::{Outcome, PairVerifier, VerificationResult, VerifyError};
