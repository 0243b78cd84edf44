//! Tally CLI - token analysis for agent frameworks
//!
//! Measures how many tokens agents, their tasks, templates and data files
//! put into a model's context.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing.
///
/// All tracing output goes to stderr so `--json` output on stdout stays
/// machine readable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tally=debug,tally_token=debug,tally_core=debug"
    } else {
        "tally=warn,tally_token=warn,tally_core=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
