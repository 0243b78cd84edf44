//! Token analysis CLI command.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tally_core::bundle::parse_agent_list;
use tally_core::layout;
use tally_core::FsDiscovery;
use tally_token::pool::DEFAULT_WORKERS;
use tally_token::{check_limit, with_deadline, Aggregator, AggregatorConfig, Engine, TokenError};

use crate::output;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["agent", "all", "bundle"]),
))]
pub struct TokensArgs {
    /// Analyze tokens for a specific agent
    #[arg(long)]
    pub agent: Option<String>,

    /// Analyze tokens for all agents in the project
    #[arg(long)]
    pub all: bool,

    /// Analyze a pre-built bundle ('pm', 'pm,architect', 'all')
    #[arg(long)]
    pub bundle: Option<String>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Timeout for the whole analysis (e.g. 30s, 2m)
    #[arg(long, env = "TALLY_TIMEOUT", default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Concurrent workers per pool
    #[arg(long, env = "TALLY_WORKERS", default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Fail when the reported total exceeds this many tokens
    #[arg(long, env = "TALLY_MAX_TOKENS")]
    pub max_tokens: Option<usize>,
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("workers must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

pub async fn execute(args: TokensArgs, project_dir: &Path) -> Result<()> {
    let json = args.json;

    let result = run(args, project_dir).await;
    if let Err(err) = &result {
        if !json {
            output::print_error(err.as_ref());
        }
    }
    result
}

async fn run(args: TokensArgs, project_dir: &Path) -> Result<()> {
    let framework_dir = layout::framework_path(project_dir);
    debug!(framework = %framework_dir.display(), workers = args.workers, "starting token analysis");

    let engine = Engine::cl100k().context("failed to initialize token calculator")?;
    let aggregator = Aggregator::new(
        engine,
        Arc::new(FsDiscovery::new(&framework_dir)),
        &framework_dir,
        AggregatorConfig {
            workers: args.workers,
        },
    );

    debug!(
        tokenizer = aggregator.engine().tokenizer_name().unwrap_or("none"),
        "token calculator ready"
    );

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    if let Some(agent) = &args.agent {
        agent_analysis(&aggregator, &cancel, agent, &args).await
    } else if let Some(scope) = &args.bundle {
        bundle_analysis(&aggregator, &cancel, scope, &args).await
    } else {
        project_analysis(&aggregator, &cancel, &args).await
    }
}

/// Cancel the analysis on Ctrl+C.
fn install_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    info!("received Ctrl+C, cancelling token analysis");
                    cancel.cancel();
                }
            }
        }
    });
}

async fn agent_analysis(
    aggregator: &Aggregator,
    cancel: &CancellationToken,
    agent: &str,
    args: &TokensArgs,
) -> Result<()> {
    if !args.json {
        output::print_progress(&format!("Analyzing tokens for agent '{}'...", agent));
    }

    let mut report = with_deadline(cancel, args.timeout, aggregator.agent_report(cancel, agent)).await?;
    report.sort_for_display();

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_agent_report(&report);
    }

    check_limit(report.total_cost, args.max_tokens)?;
    Ok(())
}

async fn project_analysis(
    aggregator: &Aggregator,
    cancel: &CancellationToken,
    args: &TokensArgs,
) -> Result<()> {
    if !args.json {
        output::print_progress("Analyzing tokens for entire project...");
    }

    let mut report = with_deadline(cancel, args.timeout, aggregator.project_report(cancel)).await?;
    report.sort_for_display();

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_project_report(&report);
    }

    check_limit(report.total_cost, args.max_tokens)?;
    Ok(())
}

async fn bundle_analysis(
    aggregator: &Aggregator,
    cancel: &CancellationToken,
    scope: &str,
    args: &TokensArgs,
) -> Result<()> {
    if !args.json {
        output::print_progress(&format!("Analyzing tokens for bundle scope '{}'...", scope));
    }

    let agents = if scope.trim() == "all" {
        Vec::new()
    } else {
        let agents = parse_agent_list(scope);
        if agents.is_empty() {
            return Err(TokenError::Configuration(
                "no valid agents specified in bundle scope".into(),
            ))
            .context("bundle token analysis failed");
        }
        agents
    };

    let report = with_deadline(cancel, args.timeout, aggregator.bundle_report(cancel, &agents))
        .await
        .context("bundle token analysis failed")?;

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_bundle_report(&report, scope);
    }

    check_limit(report.total_cost, args.max_tokens)?;
    Ok(())
}
