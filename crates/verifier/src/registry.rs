//! Chain identifier to client lookup.

use crate::{
    client::{ChainClient, ChainHead, ClientError, RpcChainClient},
    retry::RetryPolicy,
};
use futures::future::join_all;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown endpoint `{0}`")]
    UnknownEndpoint(String),

    #[error("endpoint `{chain}` is unavailable: {reason}")]
    Unavailable { chain: String, reason: String },
}

enum Endpoint {
    Connected(Arc<dyn ChainClient>),
    Unavailable(String),
}

/// Clients for every configured chain.
///
/// Endpoints that failed to connect stay registered as unavailable, so only
/// the pairs that use them fail.
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Endpoint>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dial and probe every endpoint. Failures are logged and recorded, never
    /// returned.
    pub async fn connect(endpoints: &BTreeMap<String, String>, retry: RetryPolicy) -> Self {
        let dials = endpoints.iter().map(|(chain, url)| async move {
            let client = match RpcChainClient::connect(chain.as_str(), url, retry).await {
                Ok(client) => client,
                Err(err) => return (chain.clone(), Err(err)),
            };
            let head = client.head().await;
            (chain.clone(), head.map(|head| (client, head)))
        });

        let mut registry = Self::new();
        for (chain, result) in join_all(dials).await {
            match result {
                Ok((client, head)) => {
                    info!(
                        %chain,
                        chain_id = head.chain_id,
                        block = head.block_number,
                        "Connected to endpoint"
                    );
                    registry.insert_client(chain, Arc::new(client));
                }
                Err(err) => {
                    warn!(%chain, error = %err, "Endpoint unavailable");
                    registry.insert_unavailable(chain, err.to_string());
                }
            }
        }

        registry
    }

    pub fn insert_client(&mut self, chain: impl Into<String>, client: Arc<dyn ChainClient>) {
        self.endpoints.insert(chain.into(), Endpoint::Connected(client));
    }

    pub fn insert_unavailable(&mut self, chain: impl Into<String>, reason: impl Into<String>) {
        self.endpoints.insert(chain.into(), Endpoint::Unavailable(reason.into()));
    }

    pub fn resolve(&self, chain: &str) -> Result<Arc<dyn ChainClient>, RegistryError> {
        match self.endpoints.get(chain) {
            Some(Endpoint::Connected(client)) => Ok(Arc::clone(client)),
            Some(Endpoint::Unavailable(reason)) => Err(RegistryError::Unavailable {
                chain: chain.to_string(),
                reason: reason.clone(),
            }),
            None => Err(RegistryError::UnknownEndpoint(chain.to_string())),
        }
    }

    pub fn contains(&self, chain: &str) -> bool {
        self.endpoints.contains_key(chain)
    }

    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Current head of every endpoint, in identifier order.
    pub async fn probe_all(&self) -> Vec<(String, Result<ChainHead, String>)> {
        let probes = self.endpoints.iter().map(|(chain, endpoint)| async move {
            let head = match endpoint {
                Endpoint::Connected(client) => {
                    client.head().await.map_err(|err: ClientError| err.to_string())
                }
                Endpoint::Unavailable(reason) => Err(reason.clone()),
            };
            (chain.clone(), head)
        });

        join_all(probes).await
    }
}
