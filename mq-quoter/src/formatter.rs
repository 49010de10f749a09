use ethers::types::U256;
use ethers::utils::format_units;
use mq_types::BatchResult;
use mq_types::FormatError;
use mq_types::PairQuote;
use mq_types::QuoteMeta;

/// Zips batch results back onto the metadata of the requests that produced them.
pub fn format(
    batch: &[QuoteMeta],
    result: BatchResult,
) -> Result<Vec<PairQuote>, FormatError> {
    if batch.len() != result.results.len() {
        return Err(FormatError::LengthMismatch {
            expected: batch.len(),
            actual: result.results.len(),
        });
    }

    batch
        .iter()
        .zip(result.results)
        .enumerate()
        .map(|(index, (meta, value))| {
            if value.correlation_id() != index {
                return Err(FormatError::CorrelationMismatch {
                    index,
                    found: value.correlation_id(),
                });
            }

            let output_base_units = value
                .as_uint()
                .ok_or(FormatError::UnexpectedValue { index })?;

            Ok(PairQuote {
                pool: meta.pool,
                input_amount: meta.input_amount,
                input_symbol: meta.input_symbol.clone(),
                output_symbol: meta.output_symbol.clone(),
                output_amount: render_units(output_base_units, meta.output_decimals)?,
                output_base_units,
            })
        })
        .collect()
}

/// Renders base units as a decimal string, trailing zeros trimmed down to a
/// single fractional digit: `14200000000000000000` at 18 decimals is `14.2`.
pub fn render_units(
    amount: U256,
    decimals: u8,
) -> Result<String, FormatError> {
    // 10^77 no longer fits in 256 bits
    if decimals >= 77 {
        return Err(FormatError::InvalidPrecision {
            decimals,
            reason: "exceeds the 256-bit range".to_string(),
        });
    }

    let rendered = format_units(amount, u32::from(decimals)).map_err(|err| {
        FormatError::InvalidPrecision {
            decimals,
            reason: err.to_string(),
        }
    })?;

    let (integer, fraction) = rendered.split_once('.').unwrap_or((&rendered, ""));
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        Ok(format!("{integer}.0"))
    } else {
        Ok(format!("{integer}.{fraction}"))
    }
}
