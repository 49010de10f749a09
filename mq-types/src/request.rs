use ethers::abi::AbiParser;
use ethers::abi::Function;
use ethers::abi::Token;
use ethers::types::Address;
use ethers::types::Bytes;

use crate::error::AggregateError;
use crate::error::RequestError;

/// A single contract read, fully encoded but not yet executed.
///
/// The function is declared with a human-readable signature such as
/// `function decimals() returns (uint8)`; its output parameters are the
/// shape used to decode whatever the node returns for this read.
#[derive(Clone, Debug)]
pub struct ReadRequest {
    target: Address,
    function: Function,
    arguments: Vec<Token>,
    calldata: Bytes,
    correlation_id: usize,
}

impl ReadRequest {
    /// Parses `signature` and encodes `arguments` against it.
    ///
    /// The correlation id starts at zero and is assigned once the request
    /// joins a [`BatchEnvelope`].
    pub fn new(
        target: Address,
        signature: &str,
        arguments: Vec<Token>,
    ) -> Result<Self, RequestError> {
        let function = AbiParser::default()
            .parse_function(signature)
            .map_err(|err| {
                RequestError::InvalidSignature {
                    signature: signature.to_owned(),
                    reason: err.to_string(),
                }
            })?;

        let calldata = function.encode_input(&arguments).map_err(|err| {
            RequestError::InvalidArguments {
                signature: signature.to_owned(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            target,
            function,
            arguments,
            calldata: calldata.into(),
            correlation_id: 0,
        })
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn function_name(&self) -> &str {
        &self.function.name
    }

    pub fn arguments(&self) -> &[Token] {
        &self.arguments
    }

    /// Selector followed by the ABI-encoded arguments.
    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    pub fn correlation_id(&self) -> usize {
        self.correlation_id
    }

    /// Decodes a return payload with this request's declared output types.
    pub fn decode(
        &self,
        data: &[u8],
    ) -> Result<Vec<Token>, ethers::abi::Error> {
        self.function.decode_output(data)
    }

    fn with_correlation_id(
        self,
        correlation_id: usize,
    ) -> Self {
        Self {
            correlation_id,
            ..self
        }
    }
}

/// An ordered, non-empty batch of reads submitted as one call-bundle.
///
/// Every request's correlation id equals its index in the batch.
#[derive(Clone, Debug)]
pub struct BatchEnvelope {
    requests: Vec<ReadRequest>,
}

impl BatchEnvelope {
    pub fn new(requests: Vec<ReadRequest>) -> Result<Self, AggregateError> {
        if requests.is_empty() {
            return Err(AggregateError::EmptyBatch);
        }

        let requests = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| request.with_correlation_id(index))
            .collect();

        Ok(Self { requests })
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReadRequest> {
        self.requests.iter()
    }

    /// The `(target, calldata)` pairs in submission order.
    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.requests
            .iter()
            .map(|request| (request.target, request.calldata.clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a BatchEnvelope {
    type Item = &'a ReadRequest;
    type IntoIter = std::slice::Iter<'a, ReadRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
