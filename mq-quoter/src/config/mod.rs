use std::time::Duration;

use anyhow::ensure;
use anyhow::Context;
use config::FileFormat;
use ethers::types::Address;
use lazy_static_include::*;
use redact::Secret;
use rust_decimal::Decimal;
use serde_derive::Deserialize;
use tracing::debug;

lazy_static_include_str! {
    DEFAULT_CONFIG => "src/config/default.toml",
}

/// Prefix of the environment variables overriding the configuration, e.g.
/// `MULTIQUOTE__RPC__URL`.
const ENV_PREFIX: &str = "MULTIQUOTE";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub rpc: RpcConfig,
    pub contracts: ContractsConfig,
    pub quote: QuoteConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint. Hosted providers embed the API key in the URL.
    pub url: Secret<String>,
    /// Deadline for the batched call.
    pub batch_timeout_secs: u64,
}

impl RpcConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.url.expose_secret().is_empty(), "RPC URL is required");
        ensure!(
            self.batch_timeout_secs > 0,
            "Batch timeout must be at least one second"
        );
        Ok(())
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContractsConfig {
    /// The contract answering `quoteExactInputSingle`.
    pub quoter: Address,
    /// The Multicall3 deployment batches are sent through.
    pub multicall: Address,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuoteConfig {
    /// Amount of each pool's first asset to quote, in human units.
    pub input_amount: Decimal,
    /// Abort on the first pool that cannot be prepared instead of skipping it.
    pub fail_fast: bool,
    pub pools: Vec<String>,
}

impl QuoteConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.pools.is_empty(), "At least one pool is required");
        ensure!(
            self.input_amount > Decimal::ZERO,
            "Input amount must be positive, got {}",
            self.input_amount
        );
        Ok(())
    }
}

/// `MULTIQUOTE__QUOTE__POOLS` takes a comma-separated list.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("quote.pools")
}

impl Config {
    /// Layers the embedded defaults, an optional local file, the environment
    /// and finally an RPC URL given on the command line.
    pub fn load(
        local_file: Option<String>,
        rpc_url: Option<String>,
    ) -> anyhow::Result<Config> {
        Self::load_from(local_file, rpc_url, environment())
    }

    fn load_from(
        local_file: Option<String>,
        rpc_url: Option<String>,
        environment: config::Environment,
    ) -> anyhow::Result<Config> {
        let mut config_builder = config::Config::builder();
        config_builder =
            config_builder.add_source(config::File::from_str(&DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(local_file) = local_file {
            debug!("Loading local configuration from {}", local_file);
            config_builder = config_builder.add_source(config::File::with_name(&local_file));
        }

        config_builder
            .add_source(environment)
            .set_override_option("rpc.url", rpc_url)
            .context("overriding RPC URL")?
            .build()
            .context("Could not load configuration")?
            .try_deserialize()
            .context("Could not deserialize configuration")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.rpc.validate()?;
        self.quote.validate()
    }
}
