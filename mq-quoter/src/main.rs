use std::panic;

use anyhow::Context;
use backtrace::Backtrace;
use clap::Parser;
use clap::ValueEnum;
use mq_quoter::chain::rpc::RpcNode;
use mq_quoter::config::Config;
use mq_quoter::driver::Driver;
use mq_quoter::driver::Report;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// One line per quote, preceded by the block number.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

#[derive(Parser, Clone, Debug)]
#[clap(version, about = "Quotes every tracked pool in a single batched call")]
struct Cli {
    /// Path to the configuration file.
    #[clap(short, long)]
    config: Option<String>,

    /// If set, output logs in JSON format.
    #[clap(short, long, action)]
    json: bool,

    /// JSON-RPC endpoint, overriding the configured one.
    #[clap(long, env = "RPC_URL", hide_env_values = true)]
    rpc_url: Option<String>,

    /// How quotes are printed on stdout.
    #[clap(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

fn setup_logging(json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    // stdout carries the quotes
    if json {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(env_filter)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("Setting up logging failed")
    } else {
        let subscriber = tracing_subscriber::fmt()
            .pretty()
            .compact()
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(env_filter)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("Setting up logging failed")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.json)?;

    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => {
                match panic_info.payload().downcast_ref::<String>() {
                    Some(s) => &s[..],
                    None => "Box<dyn Any>",
                }
            },
        };
        let (file, lineno, col) = match panic_info.location() {
            Some(l) => (l.file(), l.line(), l.column()),
            None => ("<unknown>", 0, 0),
        };

        error!(
            msg,
            file,
            lineno,
            col,
            "Panic occurred: {:?}",
            Backtrace::new(),
        );
    }));

    run(cli).await.inspect_err(|err| {
        error!("Quoting failed: {:?}", err);
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting multiquote. version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config, cli.rpc_url)?;
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    let node = RpcNode::connect(config.rpc.url.expose_secret(), config.contracts.multicall)?;
    let driver = Driver::new(&config, node.clone(), node);

    let report = driver.run().await.context("running quote batch")?;
    print_report(&report, cli.output)
}

fn print_report(
    report: &Report,
    output: OutputFormat,
) -> anyhow::Result<()> {
    for skipped in &report.skipped {
        eprintln!("skipped pool {}: {}", skipped.pool, skipped.reason);
    }

    match output {
        OutputFormat::Text => {
            println!("Block number for the multicall: {}", report.block);
            for quote in &report.quotes {
                println!("{quote}");
            }
        },
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(report).context("serializing quote report")?;
            println!("{rendered}");
        },
    }

    Ok(())
}
