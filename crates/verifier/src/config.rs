//! Endpoint table and pair catalog loaded from TOML.
//!
//! ```toml
//! concurrency = 4
//!
//! [rpc]
//! timeout_ms = 10000
//! max_retries = 3
//!
//! [endpoints]
//! sepolia = "https://rpc.sepolia.org"
//! tempo = "http://localhost:8545"
//!
//! [[pairs]]
//! kind = "ether-burn"
//! name = "ETH"
//! ether = { chain = "sepolia", address = "0x..." }
//! burner = { chain = "tempo", address = "0x..." }
//!
//! [[pairs]]
//! kind = "token-burn"
//! name = "USDC"
//! locker = { chain = "sepolia", address = "0x..." }
//! burner = { chain = "tempo", address = "0x..." }
//! ```

use crate::{pair::PairDescriptor, retry::RetryPolicy};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("pair `{pair}` references unknown endpoint `{chain}`")]
    UnknownEndpoint { pair: String, chain: String },

    #[error("pair `{0}` is listed more than once")]
    DuplicatePair(String),

    #[error("no pair named `{0}` in the catalog")]
    UnknownPair(String),

    #[error("rpc.timeout_ms must be at least 1")]
    ZeroTimeout,

    #[error("rpc.max_backoff_ms ({max}) is below rpc.initial_backoff_ms ({initial})")]
    InvalidBackoff { initial: u64, max: u64 },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// RPC timeout and retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcConfig {
    pub timeout_ms: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            timeout_ms: policy.call_timeout.as_millis() as u64,
            max_retries: policy.max_retries,
            initial_backoff_ms: policy.initial_delay.as_millis() as u64,
            max_backoff_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

impl RpcConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            call_timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

/// Verifier configuration: endpoints, catalog and run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Pairs verified at the same time. `1` checks them one after another.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub rpc: RpcConfig,

    /// Chain identifier to RPC URL.
    pub endpoints: BTreeMap<String, String>,

    /// Known bridges, in report order.
    #[serde(default)]
    pub pairs: Vec<PairDescriptor>,
}

impl VerifierConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Every pair must reference registered endpoints and have a unique name,
    /// and the RPC settings must allow a call to complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.rpc.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.rpc.max_backoff_ms < self.rpc.initial_backoff_ms {
            return Err(ConfigError::InvalidBackoff {
                initial: self.rpc.initial_backoff_ms,
                max: self.rpc.max_backoff_ms,
            });
        }

        let mut names = HashSet::new();
        for pair in &self.pairs {
            if !names.insert(pair.name()) {
                return Err(ConfigError::DuplicatePair(pair.name().to_string()));
            }

            for side in [pair.source(), pair.destination()] {
                if !self.endpoints.contains_key(&side.chain) {
                    return Err(ConfigError::UnknownEndpoint {
                        pair: pair.name().to_string(),
                        chain: side.chain.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Catalog entries named in `names`, in catalog order. An empty filter
    /// selects the whole catalog.
    pub fn select_pairs(&self, names: &[String]) -> Result<Vec<PairDescriptor>, ConfigError> {
        if names.is_empty() {
            return Ok(self.pairs.clone());
        }

        if let Some(missing) = names
            .iter()
            .find(|name| !self.pairs.iter().any(|pair| pair.name() == name.as_str()))
        {
            return Err(ConfigError::UnknownPair(missing.clone()));
        }

        Ok(self
            .pairs
            .iter()
            .filter(|pair| names.iter().any(|name| name == pair.name()))
            .cloned()
            .collect())
    }

    /// Endpoints referenced by at least one of `pairs`.
    pub fn endpoints_for(&self, pairs: &[PairDescriptor]) -> BTreeMap<String, String> {
        self.endpoints
            .iter()
            .filter(|(chain, _)| {
                pairs.iter().any(|pair| {
                    &pair.source().chain == *chain || &pair.destination().chain == *chain
                })
            })
            .map(|(chain, url)| (chain.clone(), url.clone()))
            .collect()
    }
}
