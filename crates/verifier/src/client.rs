//! Read-only chain access used by the verifier.

use crate::{
    metrics::VerifierMetrics,
    retry::{RetryPolicy, with_retry},
};
use alloy::{
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol,
    sol_types::{SolCall, SolType, sol_data},
    transports::{TransportError, TransportErrorKind},
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

sol! {
    /// Lockers and burners both report the token they escrow or mint.
    interface IBridgeToken {
        function token() external view returns (address);
    }

    interface IERC20 {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rpc call `{operation}` failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: TransportError,
    },

    #[error("rpc call `{operation}` timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("failed to decode `{operation}` response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: alloy::sol_types::Error,
    },
}

impl ClientError {
    pub(crate) fn transport(operation: &str, source: TransportError) -> Self {
        Self::Transport {
            operation: operation.to_string(),
            source,
        }
    }

    /// Whether the failure is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Decode { .. } => false,
            Self::Transport { source, .. } => is_transient_transport_error(source),
        }
    }
}

/// JSON-RPC error code for a reverted call.
const EXECUTION_REVERTED: i64 = 3;

/// JSON-RPC error codes used for rate limiting.
const RATE_LIMIT_CODES: [i64; 2] = [429, -32005];

/// Node-side rejections such as reverts are final. Only rate limits, HTTP
/// gateway failures and dropped connections are retried.
fn is_transient_transport_error(err: &TransportError) -> bool {
    match err {
        TransportError::ErrorResp(payload) => {
            let message = payload.message.to_lowercase();
            if payload.code == EXECUTION_REVERTED || message.contains("revert") {
                return false;
            }
            RATE_LIMIT_CODES.contains(&payload.code)
                || message.contains("rate limit")
                || message.contains("too many requests")
                || message.contains("temporarily unavailable")
        }
        TransportError::Transport(TransportErrorKind::HttpError(http)) => {
            http.status == 429 || (500..600).contains(&http.status)
        }
        TransportError::Transport(TransportErrorKind::BackendGone) => true,
        TransportError::Transport(kind) => is_connection_failure(&kind.to_string()),
        _ => false,
    }
}

fn is_connection_failure(message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains("connection")
        || msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("temporarily unavailable")
        || msg.contains("network")
        || msg.contains("reset by peer")
        || msg.contains("broken pipe")
        || msg.contains("eof")
}

/// Chain id and latest block of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHead {
    pub chain_id: u64,
    pub block_number: u64,
}

/// Queries the verifier needs from a chain. All reads are at the latest block.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id and current block number.
    async fn head(&self) -> Result<ChainHead, ClientError>;

    /// Native coin balance of `address`.
    async fn native_balance(&self, address: Address) -> Result<U256, ClientError>;

    /// Result of `token()` on a locker or burner contract.
    async fn token_of(&self, contract: Address) -> Result<Address, ClientError>;

    /// Result of `totalSupply()` on an ERC20 token.
    async fn total_supply(&self, token: Address) -> Result<U256, ClientError>;

    /// Result of `balanceOf(holder)` on an ERC20 token.
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ClientError>;
}

/// [`ChainClient`] backed by an alloy provider.
pub struct RpcChainClient<P> {
    chain: String,
    provider: P,
    retry: RetryPolicy,
    metrics: VerifierMetrics,
}

impl RpcChainClient<DynProvider> {
    /// Dial `rpc_url`, giving up after the policy's call timeout. Plain HTTP
    /// endpoints are not contacted until the first request.
    pub async fn connect(
        chain: impl Into<String>,
        rpc_url: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let dial = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect(rpc_url);
        let provider = tokio::time::timeout(retry.call_timeout, dial)
            .await
            .map_err(|_| ClientError::Timeout {
                operation: "connect".to_string(),
                timeout: retry.call_timeout,
            })?
            .map_err(|source| ClientError::transport("connect", source))?;

        Ok(Self::new(chain, provider.erased(), retry))
    }
}

impl<P: Provider> RpcChainClient<P> {
    pub fn new(chain: impl Into<String>, provider: P, retry: RetryPolicy) -> Self {
        Self {
            chain: chain.into(),
            provider,
            retry,
            metrics: VerifierMetrics::default(),
        }
    }

    async fn eth_call(
        &self,
        operation: &str,
        to: Address,
        input: Vec<u8>,
    ) -> Result<Bytes, ClientError> {
        debug!(chain = %self.chain, operation, %to, "eth_call");
        let tx = TransactionRequest::default().to(to).input(input.into());

        let started = Instant::now();
        let result = with_retry(&self.retry, operation, || async {
            self.provider
                .call(tx.clone())
                .await
                .map_err(|source| ClientError::transport(operation, source))
        })
        .await;
        self.metrics.record_rpc_latency(started.elapsed().as_secs_f64());

        result
    }

    async fn call_address(
        &self,
        operation: &str,
        to: Address,
        input: Vec<u8>,
    ) -> Result<Address, ClientError> {
        let result = self.eth_call(operation, to, input).await?;
        <sol_data::Address as SolType>::abi_decode(&result).map_err(|source| {
            ClientError::Decode {
                operation: operation.to_string(),
                source,
            }
        })
    }

    async fn call_uint(
        &self,
        operation: &str,
        to: Address,
        input: Vec<u8>,
    ) -> Result<U256, ClientError> {
        let result = self.eth_call(operation, to, input).await?;
        <sol_data::Uint<256> as SolType>::abi_decode(&result).map_err(|source| {
            ClientError::Decode {
                operation: operation.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl<P: Provider + 'static> ChainClient for RpcChainClient<P> {
    async fn head(&self) -> Result<ChainHead, ClientError> {
        let chain_id = with_retry(&self.retry, "eth_chainId", || async {
            self.provider
                .get_chain_id()
                .await
                .map_err(|source| ClientError::transport("eth_chainId", source))
        })
        .await?;

        let block_number = with_retry(&self.retry, "eth_blockNumber", || async {
            self.provider
                .get_block_number()
                .await
                .map_err(|source| ClientError::transport("eth_blockNumber", source))
        })
        .await?;

        Ok(ChainHead {
            chain_id,
            block_number,
        })
    }

    async fn native_balance(&self, address: Address) -> Result<U256, ClientError> {
        let started = Instant::now();
        let result = with_retry(&self.retry, "eth_getBalance", || async {
            self.provider
                .get_balance(address)
                .await
                .map_err(|source| ClientError::transport("eth_getBalance", source))
        })
        .await;
        self.metrics.record_rpc_latency(started.elapsed().as_secs_f64());

        result
    }

    async fn token_of(&self, contract: Address) -> Result<Address, ClientError> {
        let call = IBridgeToken::tokenCall {};
        self.call_address("token", contract, call.abi_encode()).await
    }

    async fn total_supply(&self, token: Address) -> Result<U256, ClientError> {
        let call = IERC20::totalSupplyCall {};
        self.call_uint("totalSupply", token, call.abi_encode()).await
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ClientError> {
        let call = IERC20::balanceOfCall { account: holder };
        self.call_uint("balanceOf", token, call.abi_encode()).await
    }
}
