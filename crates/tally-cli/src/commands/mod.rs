//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod list;
pub mod tokens;

/// Tally - token analysis for agent frameworks
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true, env = tally_core::layout::PROJECT_DIR_ENV)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze token usage for agents, the whole project, or bundles
    Tokens(tokens::TokensArgs),

    /// List installed framework components
    #[command(subcommand)]
    List(list::ListCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let project_dir = match self.project {
            Some(dir) => dir,
            None => tally_core::layout::project_root()
                .context("failed to resolve project directory")?,
        };

        match self.command {
            Commands::Tokens(args) => tokens::execute(args, &project_dir).await,
            Commands::List(cmd) => list::execute(cmd, &project_dir, self.verbose).await,
        }
    }
}
