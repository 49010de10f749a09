//! An in-memory chain answering reads from canned responses.
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use ethers::abi::encode;
use ethers::abi::Token;
use ethers::types::Address;
use ethers::types::Bytes;
use ethers::types::U256;
use mq_types::ReadRequest;

use crate::chain::contracts::DECIMALS;
use crate::chain::contracts::FEE;
use crate::chain::contracts::QUOTE_EXACT_INPUT_SINGLE;
use crate::chain::contracts::SYMBOL;
use crate::chain::contracts::TOKEN0;
use crate::chain::contracts::TOKEN1;
use crate::chain::BatchExecutor;
use crate::chain::ContractReader;
use crate::chain::NodeError;

pub(crate) struct FakeChain {
    reads: HashMap<(Address, Vec<u8>), Bytes>,
    block: U256,
    batches: AtomicUsize,
}

impl FakeChain {
    pub(crate) fn new(block: u64) -> Self {
        Self {
            reads: HashMap::new(),
            block: U256::from(block),
            batches: AtomicUsize::new(0),
        }
    }

    /// Answers `signature(arguments)` on `target` with `outputs`.
    pub(crate) fn respond(
        &mut self,
        target: Address,
        signature: &str,
        arguments: Vec<Token>,
        outputs: Vec<Token>,
    ) {
        let request = ReadRequest::new(target, signature, arguments).unwrap();
        self.reads.insert(
            (target, request.calldata().to_vec()),
            encode(&outputs).into(),
        );
    }

    pub(crate) fn pool(
        &mut self,
        pool: Address,
        token0: Address,
        token1: Address,
        fee: u32,
    ) {
        self.respond(pool, TOKEN0, vec![], vec![Token::Address(token0)]);
        self.respond(pool, TOKEN1, vec![], vec![Token::Address(token1)]);
        self.respond(pool, FEE, vec![], vec![Token::Uint(U256::from(fee))]);
    }

    pub(crate) fn token(
        &mut self,
        token: Address,
        symbol: &str,
        decimals: u8,
    ) {
        self.respond(token, SYMBOL, vec![], vec![Token::String(symbol.to_string())]);
        self.respond(token, DECIMALS, vec![], vec![Token::Uint(U256::from(decimals))]);
    }

    pub(crate) fn quote(
        &mut self,
        quoter: Address,
        token_in: Address,
        token_out: Address,
        fee: u32,
        amount_in: U256,
        amount_out: U256,
    ) {
        self.respond(
            quoter,
            QUOTE_EXACT_INPUT_SINGLE,
            vec![
                Token::Address(token_in),
                Token::Address(token_out),
                Token::Uint(U256::from(fee)),
                Token::Uint(amount_in),
                Token::Uint(U256::zero()),
            ],
            vec![Token::Uint(amount_out)],
        );
    }

    /// Number of call-bundles executed so far.
    pub(crate) fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for FakeChain {
    async fn read(
        &self,
        target: Address,
        calldata: Bytes,
    ) -> Result<Bytes, NodeError> {
        Ok(self
            .reads
            .get(&(target, calldata.to_vec()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl BatchExecutor for FakeChain {
    async fn aggregate(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> Result<(U256, Vec<Bytes>), NodeError> {
        self.batches.fetch_add(1, Ordering::SeqCst);

        let return_data = calls
            .into_iter()
            .map(|(target, calldata)| {
                self.reads
                    .get(&(target, calldata.to_vec()))
                    .cloned()
                    .ok_or_else(|| NodeError::Reverted("Multicall3: call failed".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((self.block, return_data))
    }
}
