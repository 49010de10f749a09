use ethers::abi::Token;
use ethers::types::Address;
use ethers::types::U256;
use futures_util::future::join_all;
use futures_util::future::try_join_all;
use metrics::counter;
use mq_types::BuildError;
use mq_types::QuoteMeta;
use mq_types::ReadRequest;
use rust_decimal::Decimal;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::chain::contracts::AssetMetadata;
use crate::chain::contracts::Erc20;
use crate::chain::contracts::Pool;
use crate::chain::contracts::QUOTE_EXACT_INPUT_SINGLE;
use crate::chain::CallError;
use crate::chain::ContractReader;

/// A quote read ready to be batched, with the metadata needed to render its answer.
#[derive(Clone, Debug)]
pub struct PairRequest {
    pub meta: QuoteMeta,
    pub request: ReadRequest,
}

/// A pool whose request could not be built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedPair {
    pub pool: String,
    pub error: BuildError,
}

/// Outcome of building the requests for every tracked pool, in pool order.
#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    pub pairs: Vec<PairRequest>,
    pub failed: Vec<FailedPair>,
}

/// Turns tracked pools into quoter reads.
pub struct RequestBuilder<R> {
    reader: R,
    quoter: Address,
}

impl<R: ContractReader> RequestBuilder<R> {
    pub fn new(
        reader: R,
        quoter: Address,
    ) -> Self {
        Self { reader, quoter }
    }

    /// Builds the `quoteExactInputSingle` read selling `input_amount` of the
    /// pool's first asset for its second one.
    #[tracing::instrument(skip(self), err(Display))]
    pub async fn build(
        &self,
        input_amount: Decimal,
        pool: &str,
    ) -> Result<PairRequest, BuildError> {
        let pool_address = pool.parse::<Address>().map_err(|err| {
            BuildError::InvalidAddress {
                pool: pool.to_owned(),
                reason: err.to_string(),
            }
        })?;

        let immutables = Pool::new(&self.reader, pool_address)
            .immutables()
            .await
            .map_err(|err| {
                match err {
                    CallError::NoContract(_) => {
                        BuildError::InvalidAddress {
                            pool: pool.to_owned(),
                            reason: err.to_string(),
                        }
                    },
                    _ => {
                        BuildError::MetadataUnavailable {
                            contract: pool_address,
                            reason: err.to_string(),
                        }
                    },
                }
            })?;

        let asset0 = Erc20::new(&self.reader, immutables.token0);
        let asset1 = Erc20::new(&self.reader, immutables.token1);
        let ((input_symbol, input_decimals), (output_symbol, output_decimals)) =
            tokio::try_join!(
                describe(&asset0, immutables.token0),
                describe(&asset1, immutables.token1),
            )?;

        let amount_in = to_base_units(input_amount, input_decimals)?;
        debug!(
            "pool {:?}: {} ({} decimals) -> {} ({} decimals), fee {}, amount in {}",
            pool_address,
            input_symbol,
            input_decimals,
            output_symbol,
            output_decimals,
            immutables.fee,
            amount_in,
        );

        let request = ReadRequest::new(
            self.quoter,
            QUOTE_EXACT_INPUT_SINGLE,
            vec![
                Token::Address(immutables.token0),
                Token::Address(immutables.token1),
                Token::Uint(U256::from(immutables.fee)),
                Token::Uint(amount_in),
                Token::Uint(U256::zero()),
            ],
        )?;

        Ok(PairRequest {
            meta: QuoteMeta {
                pool: pool_address,
                input_amount,
                input_symbol,
                output_symbol,
                output_decimals,
            },
            request,
        })
    }

    /// Builds every pool's request concurrently and joins them in pool order.
    ///
    /// With `fail_fast` the first failure aborts the whole set; otherwise
    /// failed pools are collected next to the successful ones.
    pub async fn build_all(
        &self,
        input_amount: Decimal,
        pools: &[String],
        fail_fast: bool,
    ) -> Result<BuildReport, BuildError> {
        let builds = pools.iter().enumerate().map(|(index, pool)| {
            async move {
                info!("Generating request for pool. index: {} pool: {}", index, pool);
                self.build(input_amount, pool).await
            }
        });

        if fail_fast {
            let pairs = try_join_all(builds).await?;
            return Ok(BuildReport {
                pairs,
                failed: vec![],
            });
        }

        let mut report = BuildReport::default();
        for (pool, outcome) in pools.iter().zip(join_all(builds).await) {
            match outcome {
                Ok(pair) => report.pairs.push(pair),
                Err(error) => {
                    warn!("skipping pool. pool: {} err: {}", pool, error);
                    counter!("multiquote_pairs_failed_total").increment(1);
                    report.failed.push(FailedPair {
                        pool: pool.clone(),
                        error,
                    });
                },
            }
        }

        Ok(report)
    }
}

async fn describe<A: AssetMetadata + Sync>(
    asset: &A,
    contract: Address,
) -> Result<(String, u8), BuildError> {
    let unavailable = |err: CallError| {
        BuildError::MetadataUnavailable {
            contract,
            reason: err.to_string(),
        }
    };

    tokio::try_join!(
        async { asset.symbol().await.map_err(unavailable) },
        async { asset.decimals().await.map_err(unavailable) },
    )
}

/// Converts a human amount to the integer an asset with `decimals` uses on chain.
pub fn to_base_units(
    amount: Decimal,
    decimals: u8,
) -> Result<U256, BuildError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(BuildError::InvalidAmount {
            amount,
            reason: "amount must be positive".to_string(),
        });
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(BuildError::InvalidAmount {
            amount,
            reason: format!("more fractional digits than the asset's {decimals} decimals"),
        });
    }

    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    U256::from(10)
        .checked_pow(U256::from(u32::from(decimals) - scale))
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(BuildError::AmountOverflow { amount, decimals })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ethers::types::H160;

    use super::*;
    use crate::testing::FakeChain;

    const QUOTER: Address = H160([0xb2; 20]);

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn wbtc_eth_chain() -> (FakeChain, Address) {
        let pool = Address::repeat_byte(0xcb);
        let wbtc = Address::repeat_byte(0x22);
        let weth = Address::repeat_byte(0xc0);

        let mut chain = FakeChain::new(1);
        chain.pool(pool, wbtc, weth, 3000);
        chain.token(wbtc, "WBTC", 8);
        chain.token(weth, "WETH", 18);

        (chain, pool)
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(
            to_base_units(dec("1"), 18).unwrap(),
            U256::exp10(18)
        );
        assert_eq!(
            to_base_units(dec("0.5"), 8).unwrap(),
            U256::from(50_000_000u64)
        );
        assert_eq!(
            to_base_units(dec("2.500"), 1).unwrap(),
            U256::from(25)
        );
        assert_eq!(to_base_units(dec("7"), 0).unwrap(), U256::from(7));
    }

    #[test]
    fn test_to_base_units_rejects_bad_amounts() {
        assert!(matches!(
            to_base_units(dec("0"), 18),
            Err(BuildError::InvalidAmount { .. })
        ));
        assert!(matches!(
            to_base_units(dec("-1"), 18),
            Err(BuildError::InvalidAmount { .. })
        ));
        assert!(matches!(
            to_base_units(dec("0.001"), 2),
            Err(BuildError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_to_base_units_overflow() {
        assert_eq!(
            to_base_units(dec("1"), 200),
            Err(BuildError::AmountOverflow {
                amount: dec("1"),
                decimals: 200,
            })
        );
        assert!(to_base_units(dec("1"), 77).is_ok());
    }

    #[tokio::test]
    async fn test_build_quote_request() {
        let (chain, pool) = wbtc_eth_chain();
        let builder = RequestBuilder::new(chain, QUOTER);

        let pair = builder
            .build(dec("1"), &format!("{pool:?}"))
            .await
            .unwrap();

        assert_eq!(
            pair.meta,
            QuoteMeta {
                pool,
                input_amount: dec("1"),
                input_symbol: "WBTC".to_string(),
                output_symbol: "WETH".to_string(),
                output_decimals: 18,
            }
        );
        assert_eq!(pair.request.target(), QUOTER);
        assert_eq!(pair.request.function_name(), "quoteExactInputSingle");
        assert_eq!(
            pair.request.arguments(),
            &[
                Token::Address(Address::repeat_byte(0x22)),
                Token::Address(Address::repeat_byte(0xc0)),
                Token::Uint(U256::from(3000)),
                Token::Uint(U256::from(100_000_000u64)),
                Token::Uint(U256::zero()),
            ]
        );
    }

    #[tokio::test]
    async fn test_build_rejects_malformed_address() {
        let (chain, _) = wbtc_eth_chain();
        let builder = RequestBuilder::new(chain, QUOTER);

        let err = builder.build(dec("1"), "0x1234").await.unwrap_err();

        assert!(matches!(err, BuildError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_address_without_contract() {
        let (chain, _) = wbtc_eth_chain();
        let builder = RequestBuilder::new(chain, QUOTER);

        let err = builder
            .build(dec("1"), &format!("{:?}", Address::repeat_byte(0x99)))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_build_reports_missing_metadata() {
        let pool = Address::repeat_byte(0xcb);
        let token1 = Address::repeat_byte(0xc0);
        let mut chain = FakeChain::new(1);
        chain.pool(pool, Address::repeat_byte(0x22), token1, 500);
        chain.token(token1, "WETH", 18);
        let builder = RequestBuilder::new(chain, QUOTER);

        let err = builder
            .build(dec("1"), &format!("{pool:?}"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::MetadataUnavailable { contract, .. } if contract == Address::repeat_byte(0x22)
        ));
    }

    #[tokio::test]
    async fn test_build_all_fail_fast() {
        let (chain, pool) = wbtc_eth_chain();
        let builder = RequestBuilder::new(chain, QUOTER);
        let pools = vec![format!("{pool:?}"), "garbage".to_string()];

        let err = builder.build_all(dec("1"), &pools, true).await.unwrap_err();

        assert!(matches!(err, BuildError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_build_all_isolates_failures() {
        let (chain, pool) = wbtc_eth_chain();
        let builder = RequestBuilder::new(chain, QUOTER);
        let pools = vec![
            "garbage".to_string(),
            format!("{pool:?}"),
            format!("{pool:?}"),
        ];

        let report = builder.build_all(dec("1"), &pools, false).await.unwrap();

        assert_eq!(report.pairs.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].pool, "garbage");
        assert!(report.pairs.iter().all(|pair| pair.meta.pool == pool));
    }
}
