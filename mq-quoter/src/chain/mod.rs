//! The two capabilities the quoting pipeline needs from a remote node.
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::Address;
use ethers::types::Bytes;
use ethers::types::U256;
use mq_types::ReadRequest;
use mq_types::RequestError;
use thiserror::Error;

pub mod contracts;
pub mod rpc;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum NodeError {
    /// The request never got a usable answer: connection, HTTP or JSON-RPC
    /// level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node executed the call and it reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),
}

/// A single read-only contract call (`eth_call`).
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn read(
        &self,
        target: Address,
        calldata: Bytes,
    ) -> Result<Bytes, NodeError>;
}

/// Executes an ordered list of `(target, calldata)` pairs as one
/// call-bundle, returning the block it ran against and one return payload
/// per call, in order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn aggregate(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<(U256, Vec<Bytes>), NodeError>;
}

#[async_trait]
impl<T: ContractReader + ?Sized> ContractReader for Arc<T> {
    async fn read(
        &self,
        target: Address,
        calldata: Bytes,
    ) -> Result<Bytes, NodeError> {
        (**self).read(target, calldata).await
    }
}

#[async_trait]
impl<T: BatchExecutor + ?Sized> BatchExecutor for Arc<T> {
    async fn aggregate(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<(U256, Vec<Bytes>), NodeError> {
        (**self).aggregate(calls).await
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CallError {
    #[error("no contract deployed at {0:?}")]
    NoContract(Address),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("`{function}` returned an undecodable payload: {reason}")]
    Decode { function: String, reason: String },

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Executes one request on its own and decodes the answer.
///
/// An empty payload is what the node returns for an address without code.
pub async fn call<R: ContractReader + ?Sized>(
    reader: &R,
    request: &ReadRequest,
) -> Result<Vec<Token>, CallError> {
    let data = reader
        .read(request.target(), request.calldata().clone())
        .await?;

    if data.is_empty() {
        return Err(CallError::NoContract(request.target()));
    }

    request.decode(&data).map_err(|err| {
        CallError::Decode {
            function: request.function_name().to_owned(),
            reason: err.to_string(),
        }
    })
}
