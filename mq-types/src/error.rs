use std::time::Duration;

use ethers::types::Address;
use rust_decimal::Decimal;
use thiserror::Error;

/// Raised while turning a human-readable signature and its arguments into calldata.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid function signature `{signature}`: {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("arguments do not match `{signature}`: {reason}")]
    InvalidArguments { signature: String, reason: String },
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid pool address `{pool}`: {reason}")]
    InvalidAddress { pool: String, reason: String },

    #[error("metadata unavailable for {contract:?}: {reason}")]
    MetadataUnavailable { contract: Address, reason: String },

    #[error("amount {amount} does not fit in uint256 with {decimals} decimals")]
    AmountOverflow { amount: Decimal, decimals: u8 },

    #[error("invalid input amount {amount}: {reason}")]
    InvalidAmount { amount: Decimal, reason: String },

    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("a batch must contain at least one request")]
    EmptyBatch,

    #[error("batch submission failed: {0}")]
    BatchSubmissionFailed(String),

    #[error("batch decode failed: {0}")]
    BatchDecodeFailed(String),

    #[error("batch did not complete within {0:?}")]
    BatchTimeout(Duration),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected {expected} results, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("result at index {index} carries correlation id {found}")]
    CorrelationMismatch { index: usize, found: usize },

    #[error("result at index {index} is not a single unsigned integer")]
    UnexpectedValue { index: usize },

    #[error("cannot render {decimals} decimals: {reason}")]
    InvalidPrecision { decimals: u8, reason: String },
}
