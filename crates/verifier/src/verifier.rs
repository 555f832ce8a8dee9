//! Supply conservation check for bridge pairs.
//!
//! A pair is conserved when the amount locked on the source chain equals the
//! total supply of the wrapped token on the destination chain:
//!
//! * ether-burn: native balance of the lock account vs. `totalSupply()` of
//!   the burner's `token()`.
//! * token-burn: `balanceOf(locker)` of the locker's `token()` vs.
//!   `totalSupply()` of the burner's `token()`.
//!
//! Comparison is exact. A pair whose amounts cannot be read is
//! indeterminate; it is never treated as holding zero.

use crate::{
    client::ClientError,
    metrics::VerifierMetrics,
    pair::{EtherBurnPair, PairDescriptor, PairKind, TokenBurnPair},
    registry::{EndpointRegistry, RegistryError},
    report::RunReport,
};
use alloy::primitives::{Address, U256};
use futures::{StreamExt, stream};
use supply_audit_primitives::ChainAddress;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Endpoint(#[from] RegistryError),

    #[error("{chain}: {source}")]
    Client {
        chain: String,
        #[source]
        source: ClientError,
    },
}

/// Result of checking one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Conserved { amount: U256 },
    Mismatch { source: U256, destination: U256 },
    Indeterminate { reason: String },
}

impl Outcome {
    fn compare(source: U256, destination: U256) -> Self {
        if source == destination {
            Self::Conserved { amount: source }
        } else {
            Self::Mismatch {
                source,
                destination,
            }
        }
    }

    /// `None` when the amounts could not be read.
    pub fn equal(&self) -> Option<bool> {
        match self {
            Self::Conserved { .. } => Some(true),
            Self::Mismatch { .. } => Some(false),
            Self::Indeterminate { .. } => None,
        }
    }

    pub fn source_amount(&self) -> Option<U256> {
        match self {
            Self::Conserved { amount } => Some(*amount),
            Self::Mismatch { source, .. } => Some(*source),
            Self::Indeterminate { .. } => None,
        }
    }

    pub fn destination_amount(&self) -> Option<U256> {
        match self {
            Self::Conserved { amount } => Some(*amount),
            Self::Mismatch { destination, .. } => Some(*destination),
            Self::Indeterminate { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub pair: String,
    pub kind: PairKind,
    /// Lock account or locker contract.
    pub source: ChainAddress,
    /// Burner contract.
    pub destination: ChainAddress,
    /// Token held in escrow, for token-burn pairs.
    pub escrowed_token: Option<Address>,
    pub wrapped_token: Option<Address>,
    pub outcome: Outcome,
}

impl VerificationResult {
    pub fn equal(&self) -> Option<bool> {
        self.outcome.equal()
    }
}

/// Amounts read for a pair before comparison.
struct Measurement {
    escrowed_token: Option<Address>,
    wrapped_token: Address,
    source: U256,
    destination: U256,
}

fn on_chain(side: &ChainAddress) -> impl FnOnce(ClientError) -> VerifyError + '_ {
    move |source| VerifyError::Client {
        chain: side.chain.clone(),
        source,
    }
}

/// Checks bridge pairs against the chains in a registry.
pub struct PairVerifier<'a> {
    registry: &'a EndpointRegistry,
    metrics: VerifierMetrics,
}

impl<'a> PairVerifier<'a> {
    pub fn new(registry: &'a EndpointRegistry) -> Self {
        Self {
            registry,
            metrics: VerifierMetrics::default(),
        }
    }

    /// Check a single pair. Failures are captured in the outcome.
    pub async fn verify(&self, pair: &PairDescriptor) -> VerificationResult {
        let measurement = match pair {
            PairDescriptor::EtherBurn(pair) => self.measure_ether_burn(pair).await,
            PairDescriptor::TokenBurn(pair) => self.measure_token_burn(pair).await,
        };

        let (escrowed_token, wrapped_token, outcome) = match measurement {
            Ok(m) => (
                m.escrowed_token,
                Some(m.wrapped_token),
                Outcome::compare(m.source, m.destination),
            ),
            Err(err) => (
                None,
                None,
                Outcome::Indeterminate {
                    reason: err.to_string(),
                },
            ),
        };

        match &outcome {
            Outcome::Conserved { amount } => {
                self.metrics.record_conserved();
                info!(pair = pair.name(), %amount, "Supply conserved");
            }
            Outcome::Mismatch {
                source,
                destination,
            } => {
                self.metrics.record_mismatch();
                warn!(
                    pair = pair.name(),
                    %source,
                    %destination,
                    "Supply mismatch"
                );
            }
            Outcome::Indeterminate { reason } => {
                self.metrics.record_indeterminate();
                warn!(pair = pair.name(), %reason, "Could not verify pair");
            }
        }

        VerificationResult {
            pair: pair.name().to_string(),
            kind: pair.kind(),
            source: pair.source().clone(),
            destination: pair.destination().clone(),
            escrowed_token,
            wrapped_token,
            outcome,
        }
    }

    /// Check every pair with at most `concurrency` in flight. Results keep
    /// catalog order.
    pub async fn verify_all(&self, catalog: &[PairDescriptor], concurrency: usize) -> RunReport {
        let results: Vec<_> = stream::iter(catalog)
            .map(|pair| self.verify(pair))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut report = RunReport::new();
        for result in results {
            report.push(result);
        }
        report
    }

    async fn measure_ether_burn(&self, pair: &EtherBurnPair) -> Result<Measurement, VerifyError> {
        let source_client = self.registry.resolve(&pair.ether.chain)?;
        let burner_client = self.registry.resolve(&pair.burner.chain)?;

        let source = source_client
            .native_balance(pair.ether.address)
            .await
            .map_err(on_chain(&pair.ether))?;

        let wrapped_token = burner_client
            .token_of(pair.burner.address)
            .await
            .map_err(on_chain(&pair.burner))?;
        let destination = burner_client
            .total_supply(wrapped_token)
            .await
            .map_err(on_chain(&pair.burner))?;

        Ok(Measurement {
            escrowed_token: None,
            wrapped_token,
            source,
            destination,
        })
    }

    async fn measure_token_burn(&self, pair: &TokenBurnPair) -> Result<Measurement, VerifyError> {
        let locker_client = self.registry.resolve(&pair.locker.chain)?;
        let burner_client = self.registry.resolve(&pair.burner.chain)?;

        let escrowed_token = locker_client
            .token_of(pair.locker.address)
            .await
            .map_err(on_chain(&pair.locker))?;
        let source = locker_client
            .balance_of(escrowed_token, pair.escrow_holder())
            .await
            .map_err(on_chain(&pair.locker))?;

        let wrapped_token = burner_client
            .token_of(pair.burner.address)
            .await
            .map_err(on_chain(&pair.burner))?;
        let destination = burner_client
            .total_supply(wrapped_token)
            .await
            .map_err(on_chain(&pair.burner))?;

        Ok(Measurement {
            escrowed_token: Some(escrowed_token),
            wrapped_token,
            source,
            destination,
        })
    }
}
