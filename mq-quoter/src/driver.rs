use mq_types::AggregateError;
use mq_types::BatchEnvelope;
use mq_types::BlockReference;
use mq_types::BuildError;
use mq_types::FormatError;
use mq_types::PairQuote;
use rust_decimal::Decimal;
use serde_derive::Serialize;
use thiserror::Error;
use tracing::info;

use crate::aggregator::BatchAggregator;
use crate::builder::RequestBuilder;
use crate::chain::BatchExecutor;
use crate::chain::ContractReader;
use crate::config::Config;
use crate::formatter;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum PipelineError {
    #[error("building requests: {0}")]
    Build(#[from] BuildError),

    #[error("aggregating batch: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("formatting results: {0}")]
    Format(#[from] FormatError),
}

/// A pool left out of the batch because its request could not be built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedPool {
    pub pool: String,
    pub reason: String,
}

/// Everything one pass of the pipeline produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub block: BlockReference,
    pub quotes: Vec<PairQuote>,
    pub skipped: Vec<SkippedPool>,
}

/// Runs build → aggregate → format once over the configured pools.
pub struct Driver<R, E> {
    builder: RequestBuilder<R>,
    aggregator: BatchAggregator<E>,
    input_amount: Decimal,
    pools: Vec<String>,
    fail_fast: bool,
}

impl<R: ContractReader, E: BatchExecutor> Driver<R, E> {
    pub fn new(
        config: &Config,
        reader: R,
        executor: E,
    ) -> Self {
        Self {
            builder: RequestBuilder::new(reader, config.contracts.quoter),
            aggregator: BatchAggregator::new(executor, config.rpc.batch_timeout()),
            input_amount: config.quote.input_amount,
            pools: config.quote.pools.clone(),
            fail_fast: config.quote.fail_fast,
        }
    }

    pub async fn run(&self) -> Result<Report, PipelineError> {
        let built = self
            .builder
            .build_all(self.input_amount, &self.pools, self.fail_fast)
            .await?;

        let skipped = built
            .failed
            .into_iter()
            .map(|failed| {
                SkippedPool {
                    pool: failed.pool,
                    reason: failed.error.to_string(),
                }
            })
            .collect();

        let (metas, requests): (Vec<_>, Vec<_>) = built
            .pairs
            .into_iter()
            .map(|pair| (pair.meta, pair.request))
            .unzip();

        let envelope = BatchEnvelope::new(requests)?;
        info!("Prepared {} quote requests", envelope.len());

        let result = self.aggregator.aggregate(&envelope).await?;
        let block = result.block;
        let quotes = formatter::format(&metas, result)?;

        Ok(Report {
            block,
            quotes,
            skipped,
        })
    }
}
