use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use ethers::contract::ContractError;
use ethers::prelude::abigen;
use ethers::providers::Http;
use ethers::providers::Middleware;
use ethers::providers::Provider;
use ethers::providers::ProviderError;
use ethers::providers::RpcError;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Address;
use ethers::types::Bytes;
use ethers::types::TransactionRequest;
use ethers::types::U256;
use tracing::trace;

use super::BatchExecutor;
use super::ContractReader;
use super::NodeError;

abigen!(Multicall3, "$CARGO_MANIFEST_DIR/abis/Multicall3ABI.json");

/// A JSON-RPC node reached over HTTP.
///
/// Batches go through the Multicall3 `aggregate` entry point, which reverts
/// as a whole when any of its calls reverts.
#[derive(Clone, Debug)]
pub struct RpcNode {
    provider: Arc<Provider<Http>>,
    multicall: Address,
}

impl RpcNode {
    pub fn connect(
        url: &str,
        multicall: Address,
    ) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(url).context("parsing RPC URL")?;

        Ok(Self {
            provider: Arc::new(provider),
            multicall,
        })
    }
}

#[async_trait]
impl ContractReader for RpcNode {
    async fn read(
        &self,
        target: Address,
        calldata: Bytes,
    ) -> Result<Bytes, NodeError> {
        trace!("eth_call to {:?} data: 0x{}", target, hex::encode(&calldata));

        let tx: TypedTransaction = TransactionRequest::new().to(target).data(calldata).into();

        self.provider
            .call(&tx, None)
            .await
            .map_err(NodeError::from)
    }
}

#[async_trait]
impl BatchExecutor for RpcNode {
    async fn aggregate(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<(U256, Vec<Bytes>), NodeError> {
        let contract = Multicall3::new(self.multicall, self.provider.clone());
        let calls = calls
            .into_iter()
            .map(|(target, call_data)| Call { target, call_data })
            .collect();

        contract
            .aggregate(calls)
            .call()
            .await
            .map_err(NodeError::from)
    }
}

impl From<ContractError<Provider<Http>>> for NodeError {
    fn from(err: ContractError<Provider<Http>>) -> Self {
        if err.is_revert() {
            NodeError::Reverted(err.to_string())
        } else {
            NodeError::Transport(err.to_string())
        }
    }
}

impl From<ProviderError> for NodeError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(response) if response.as_revert_data().is_some() || response.message.contains("revert") => {
                NodeError::Reverted(response.message.clone())
            },
            _ => NodeError::Transport(err.to_string()),
        }
    }
}
