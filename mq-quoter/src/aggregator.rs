use std::time::Duration;
use std::time::Instant;

use metrics::counter;
use metrics::histogram;
use mq_types::AggregateError;
use mq_types::BatchEnvelope;
use mq_types::BatchResult;
use mq_types::RawValue;
use tracing::debug;
use tracing::info;

use crate::chain::BatchExecutor;
use crate::chain::NodeError;

/// Packs a batch of reads into one call-bundle and splits the answer back
/// into one decoded value per read.
///
/// Every `aggregate` call costs exactly one round trip to the node. Results
/// come back positionally, so the i-th return payload is decoded with the
/// output types of the i-th request and tagged with its correlation id. The
/// batch either fully succeeds or fails as a whole.
pub struct BatchAggregator<E> {
    executor: E,
    deadline: Duration,
}

impl<E: BatchExecutor> BatchAggregator<E> {
    pub fn new(
        executor: E,
        deadline: Duration,
    ) -> Self {
        Self { executor, deadline }
    }

    #[tracing::instrument(skip_all, fields(batch_size = envelope.len()), err(Display))]
    pub async fn aggregate(
        &self,
        envelope: &BatchEnvelope,
    ) -> Result<BatchResult, AggregateError> {
        let calls = envelope.calls();
        debug!("Submitting call-bundle. calls: {}", calls.len());

        counter!("multiquote_batches_submitted_total").increment(1);
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.deadline, self.executor.aggregate(calls)).await;
        histogram!("multiquote_batch_round_trip_seconds").record(start.elapsed().as_secs_f64());

        let (block, return_data) = match outcome {
            Err(_) => return Err(failed(AggregateError::BatchTimeout(self.deadline))),
            Ok(Err(NodeError::Transport(reason))) => {
                return Err(failed(AggregateError::BatchSubmissionFailed(reason)));
            },
            Ok(Err(NodeError::Reverted(reason))) => {
                return Err(failed(AggregateError::BatchDecodeFailed(format!(
                    "call-bundle reverted: {reason}"
                ))));
            },
            Ok(Ok(answer)) => answer,
        };

        if return_data.len() != envelope.len() {
            return Err(failed(AggregateError::BatchDecodeFailed(format!(
                "submitted {} calls, node returned {} payloads",
                envelope.len(),
                return_data.len()
            ))));
        }

        let results = envelope
            .iter()
            .zip(&return_data)
            .map(|(request, data)| {
                request
                    .decode(data)
                    .map(|tokens| RawValue::new(request.correlation_id(), tokens))
                    .map_err(|err| {
                        AggregateError::BatchDecodeFailed(format!(
                            "entry {} (`{}` on {:?}): {}",
                            request.correlation_id(),
                            request.function_name(),
                            request.target(),
                            err
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(failed)?;

        info!(
            "Batch executed. block: {} results: {} elapsed: {:?}",
            block,
            results.len(),
            start.elapsed()
        );

        Ok(BatchResult {
            block: block.into(),
            results,
        })
    }
}

fn failed(err: AggregateError) -> AggregateError {
    let reason = match err {
        AggregateError::EmptyBatch => "empty",
        AggregateError::BatchSubmissionFailed(_) => "submission",
        AggregateError::BatchDecodeFailed(_) => "decode",
        AggregateError::BatchTimeout(_) => "timeout",
    };
    counter!("multiquote_batch_failures_total", "reason" => reason).increment(1);
    err
}
