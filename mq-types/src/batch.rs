use std::fmt::Display;
use std::fmt::Formatter;

use ethers::abi::Token;
use ethers::types::U256;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// The block number the multicall reported executing the batch against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReference(pub U256);

impl Display for BlockReference {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for BlockReference {
    fn from(block: U256) -> Self {
        Self(block)
    }
}

/// One decoded return value, tagged with the position of the request it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct RawValue {
    correlation_id: usize,
    tokens: Vec<Token>,
}

impl RawValue {
    pub fn new(
        correlation_id: usize,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            correlation_id,
            tokens,
        }
    }

    pub fn correlation_id(&self) -> usize {
        self.correlation_id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The value when the read returns exactly one unsigned integer.
    pub fn as_uint(&self) -> Option<U256> {
        match self.tokens.as_slice() {
            [Token::Uint(value)] => Some(*value),
            _ => None,
        }
    }
}

/// Results of one batch, `results[i]` answering the i-th request.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchResult {
    pub block: BlockReference,
    pub results: Vec<RawValue>,
}
