//! Minimal read interfaces of the contracts the quoter talks to.
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::Address;
use ethers::types::U256;
use mq_types::ReadRequest;

use super::call;
use super::CallError;
use super::ContractReader;

/// Uniswap V3 `Quoter.quoteExactInputSingle(tokenIn, tokenOut, fee, amountIn, sqrtPriceLimitX96)`.
pub const QUOTE_EXACT_INPUT_SINGLE: &str = "function quoteExactInputSingle(address,address,uint24,uint256,uint160) returns (uint256)";

pub(crate) const TOKEN0: &str = "function token0() returns (address)";
pub(crate) const TOKEN1: &str = "function token1() returns (address)";
pub(crate) const FEE: &str = "function fee() returns (uint24)";
pub(crate) const SYMBOL: &str = "function symbol() returns (string)";
pub(crate) const DECIMALS: &str = "function decimals() returns (uint8)";

/// Display metadata every quoted asset has to expose.
#[async_trait]
pub trait AssetMetadata {
    async fn symbol(&self) -> Result<String, CallError>;
    async fn decimals(&self) -> Result<u8, CallError>;
}

/// An ERC20 token read through a [`ContractReader`].
pub struct Erc20<'a, R: ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> Erc20<'a, R> {
    pub fn new(
        reader: &'a R,
        address: Address,
    ) -> Self {
        Self { reader, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl<R: ContractReader + ?Sized> AssetMetadata for Erc20<'_, R> {
    async fn symbol(&self) -> Result<String, CallError> {
        match read_single(self.reader, self.address, SYMBOL).await? {
            Token::String(symbol) => Ok(symbol),
            other => Err(unexpected("symbol", &other)),
        }
    }

    async fn decimals(&self) -> Result<u8, CallError> {
        let decimals = read_uint(self.reader, self.address, DECIMALS).await?;
        narrow(decimals, "decimals")
    }
}

/// The fields of a pool that never change after deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolImmutables {
    pub token0: Address,
    pub token1: Address,
    /// Fee tier in hundredths of a bip.
    pub fee: u32,
}

/// A Uniswap V3 pool read through a [`ContractReader`].
pub struct Pool<'a, R: ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> Pool<'a, R> {
    pub fn new(
        reader: &'a R,
        address: Address,
    ) -> Self {
        Self { reader, address }
    }

    pub async fn token0(&self) -> Result<Address, CallError> {
        read_address(self.reader, self.address, TOKEN0).await
    }

    pub async fn token1(&self) -> Result<Address, CallError> {
        read_address(self.reader, self.address, TOKEN1).await
    }

    pub async fn fee(&self) -> Result<u32, CallError> {
        let fee = read_uint(self.reader, self.address, FEE).await?;
        narrow(fee, "fee")
    }

    /// Reads the two assets and the fee tier concurrently.
    pub async fn immutables(&self) -> Result<PoolImmutables, CallError> {
        let (token0, token1, fee) = tokio::try_join!(self.token0(), self.token1(), self.fee())?;

        Ok(PoolImmutables {
            token0,
            token1,
            fee,
        })
    }
}

async fn read_single<R: ContractReader + ?Sized>(
    reader: &R,
    target: Address,
    signature: &str,
) -> Result<Token, CallError> {
    let request = ReadRequest::new(target, signature, vec![])?;
    let mut tokens = call(reader, &request).await?;

    match (tokens.pop(), tokens.is_empty()) {
        (Some(token), true) => Ok(token),
        _ => {
            Err(CallError::Decode {
                function: request.function_name().to_owned(),
                reason: "expected exactly one return value".to_string(),
            })
        },
    }
}

async fn read_address<R: ContractReader + ?Sized>(
    reader: &R,
    target: Address,
    signature: &str,
) -> Result<Address, CallError> {
    match read_single(reader, target, signature).await? {
        Token::Address(address) => Ok(address),
        other => Err(unexpected(signature, &other)),
    }
}

async fn read_uint<R: ContractReader + ?Sized>(
    reader: &R,
    target: Address,
    signature: &str,
) -> Result<U256, CallError> {
    match read_single(reader, target, signature).await? {
        Token::Uint(value) => Ok(value),
        other => Err(unexpected(signature, &other)),
    }
}

fn narrow<T: TryFrom<u64>>(
    value: U256,
    function: &str,
) -> Result<T, CallError> {
    if value > U256::from(u64::MAX) {
        return Err(out_of_range(function, value));
    }
    T::try_from(value.as_u64()).map_err(|_| out_of_range(function, value))
}

fn out_of_range(
    function: &str,
    value: U256,
) -> CallError {
    CallError::Decode {
        function: function.to_owned(),
        reason: format!("value {value} out of range"),
    }
}

fn unexpected(
    function: &str,
    token: &Token,
) -> CallError {
    CallError::Decode {
        function: function.to_owned(),
        reason: format!("unexpected return value {token:?}"),
    }
}
