//! Framework listing commands.

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tally_core::layout;
use tally_core::{AgentRecord, Discovery, FsDiscovery};

use crate::output;

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// List all installed agents (use --verbose for their dependencies)
    Agents,
}

pub async fn execute(cmd: ListCommands, project_dir: &Path, verbose: bool) -> Result<()> {
    match cmd {
        ListCommands::Agents => {
            let discovery = FsDiscovery::new(layout::framework_path(project_dir));
            list_agents(&discovery, verbose).await
        }
    }
}

async fn list_agents(discovery: &FsDiscovery, verbose: bool) -> Result<()> {
    let agents = match load_agents(discovery).await {
        Ok(agents) => agents,
        Err(err) => {
            output::print_error(&err);
            return Err(err.into());
        }
    };

    if agents.is_empty() {
        output::print_warning(&format!(
            "No agents found in {}",
            layout::agents_path(discovery.framework_dir()).display()
        ));
        return Ok(());
    }

    output::print_success(&format!("Found {} agent(s):", agents.len()));
    println!();
    if verbose {
        print!("{}", output::format_agent_dependencies(&agents));
    } else {
        print!("{}", output::format_agent_summary(&agents));
        println!();
        output::print_hint("Use 'tally list agents --verbose' to see tasks, templates, data files and MCP servers");
    }
    Ok(())
}

async fn load_agents(discovery: &dyn Discovery) -> tally_core::CoreResult<Vec<AgentRecord>> {
    let agents = discovery.get_agents(&CancellationToken::new()).await?;
    debug!(count = agents.len(), "listing agents");
    Ok(agents)
}
