use std::fmt::Display;
use std::fmt::Formatter;

use ethers::types::Address;
use ethers::types::U256;
use rust_decimal::Decimal;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// What the formatter needs to know about the request behind each result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMeta {
    pub pool: Address,
    pub input_amount: Decimal,
    pub input_symbol: String,
    pub output_symbol: String,
    /// Display precision of the output asset.
    pub output_decimals: u8,
}

/// A rendered quote for one tracked pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairQuote {
    pub pool: Address,
    pub input_amount: Decimal,
    pub input_symbol: String,
    pub output_symbol: String,
    /// Human-readable decimal, trailing zeros trimmed.
    pub output_amount: String,
    pub output_base_units: U256,
}

impl Display for PairQuote {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} {} price is {} {}",
            self.input_amount, self.input_symbol, self.output_amount, self.output_symbol
        )
    }
}
