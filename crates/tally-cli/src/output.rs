//! Terminal output formatting.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;

use tally_core::AgentRecord;
use tally_token::{
    friendly_message, suggest_solutions, AgentCostReport, ArtifactCost, BundleCostReport,
    ProjectCostReport,
};

const APPROXIMATION_NOTE: &str = "Token counts are approximate and best aligned with GPT-4 models.";

/// Longest description shown in the agent summary table.
const MAX_DESCRIPTION_CHARS: usize = 60;

const NONE_VALUE: &str = "none";

/// Print a progress line to stderr.
pub fn print_progress(message: &str) {
    eprintln!("{} {}", "⏳".dimmed(), message.dimmed());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_hint(message: &str) {
    println!("{}  {}", "ℹ️".cyan(), message.dimmed());
}

/// Print any report as pretty JSON on stdout.
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to marshal JSON output")?;
    println!("{}", json);
    Ok(())
}

/// Print a single agent report.
pub fn print_agent_report(report: &AgentCostReport) {
    println!();
    println!("{}", "📊 Token Analysis Results".bold());
    println!("{} {}", "Agent:".cyan(), report.agent_name);
    println!("{} {}", "File:".cyan(), report.agent_file_path.display());
    println!("{} {} tokens", "Total:".cyan(), report.total_cost.to_string().bold());
    println!();

    println!("{}", "Agent Configuration:".bold());
    println!(
        "  {} {} ({} tokens)",
        "✓".green().bold(),
        report.own_artifact.path.display(),
        report.own_artifact.cost
    );
    println!();

    if report.dependency_count() == 0 {
        println!("  {} No dependencies found", "ℹ️".cyan());
    } else {
        println!("{}", "Dependencies:".bold());
        print_dependency_list(&"📋 Tasks:".yellow().to_string(), &report.dependency_tasks);
        print_dependency_list(&"📄 Templates:".magenta().to_string(), &report.dependency_templates);
        print_dependency_list(&"📊 Data Files:".cyan().to_string(), &report.dependency_data_files);
    }

    println!();
    println!("{}  {}", "ℹ️".cyan(), APPROXIMATION_NOTE);
}

fn print_dependency_list(label: &str, artifacts: &[ArtifactCost]) {
    if artifacts.is_empty() {
        return;
    }

    let subtotal: usize = artifacts.iter().map(|a| a.cost).sum();
    println!("  {} {}", label, format!("({} tokens)", subtotal).dimmed());
    for artifact in artifacts {
        println!("    • {} ({} tokens)", artifact.path.display(), artifact.cost);
    }
}

/// Print a project report.
pub fn print_project_report(report: &ProjectCostReport) {
    println!();
    println!("{}", "📊 Project Token Analysis".bold());
    println!("{} {} agents analyzed", "Agents:".cyan(), report.agents.len());
    println!("{} {} total tokens", "Total:".cyan(), report.total_cost.to_string().bold());
    println!();

    let breakdown = &report.breakdown;
    println!("{}", "Token Breakdown by Asset Type:".bold());
    println!("  {} Agents: {} tokens", "🤖".green().bold(), breakdown.agents);
    println!("  {} Tasks: {} tokens", "📋".yellow(), breakdown.tasks);
    println!("  {} Templates: {} tokens", "📄".magenta(), breakdown.templates);
    println!("  {} Data Files: {} tokens", "📊".blue(), breakdown.data_files);
    println!();

    if report.agents.is_empty() {
        println!("{}", "No agents found.".dimmed());
    } else {
        println!("{}", "Individual Agent Token Counts:".bold());
        for agent in &report.agents {
            let pct = if report.total_cost > 0 {
                agent.total_cost * 100 / report.total_cost
            } else {
                0
            };
            println!(
                "  {} {}: {} tokens {}",
                "✓".green().bold(),
                agent.agent_name,
                agent.total_cost,
                format!("({}%)", pct).dimmed()
            );
        }
    }

    println!();
    println!("{}  {}", "ℹ️".cyan(), APPROXIMATION_NOTE);
}

/// Print a bundle report.
pub fn print_bundle_report(report: &BundleCostReport, scope: &str) {
    println!();
    println!("{}", "📊 Bundle Token Analysis".bold());
    println!("{} {}", "Bundle Scope:".cyan(), scope);
    println!("{} {}", "Bundle File:".cyan(), report.bundle_file);
    println!("{} {} tokens", "Total Tokens:".cyan(), report.total_cost.to_string().bold());
    println!();
    println!("{}  Token count is from the actual bundle file content.", "ℹ️".cyan());
    println!("{}  {}", "ℹ️".cyan(), APPROXIMATION_NOTE);
}

/// NAME / ROLE / DESCRIPTION table, one row per agent.
pub fn format_agent_summary(agents: &[AgentRecord]) -> String {
    let rows: Vec<(&str, &str, String)> = agents
        .iter()
        .map(|a| (a.name.as_str(), a.role.as_str(), truncate(&a.description, MAX_DESCRIPTION_CHARS)))
        .collect();

    let name_width = column_width("NAME", rows.iter().map(|r| r.0));
    let role_width = column_width("ROLE", rows.iter().map(|r| r.1));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<role_width$}  {}",
        "NAME", "ROLE", "DESCRIPTION"
    );
    for (name, role, description) in &rows {
        let _ = writeln!(out, "{:<name_width$}  {:<role_width$}  {}", name, role, description);
    }
    out
}

/// Per-agent dependency listing: tasks, templates, data files, MCP servers.
pub fn format_agent_dependencies(agents: &[AgentRecord]) -> String {
    let mut out = String::new();
    for agent in agents {
        let template_paths = agent.template_paths();
        let data_paths = agent.data_file_paths();
        let tasks: Vec<&str> = agent.tasks.iter().map(|t| t.name.as_str()).collect();
        let templates = file_names(&template_paths);
        let data_files = file_names(&data_paths);

        let _ = writeln!(out, "{} ({})", agent.name, agent.short_name);
        let _ = writeln!(out, "  Tasks:       {}", join_or_none(&tasks));
        let _ = writeln!(out, "  Templates:   {}", join_or_none(&templates));
        let _ = writeln!(out, "  Data Files:  {}", join_or_none(&data_files));
        let _ = writeln!(out, "  MCP Servers: {}", join_or_none(&agent.mcp_servers()));
        out.push('\n');
    }
    out
}

fn file_names(paths: &[PathBuf]) -> Vec<&str> {
    paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect()
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        NONE_VALUE.to_string()
    } else {
        items.join(", ")
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Print a friendly error with suggestions to stderr.
pub fn print_error(err: &(dyn Error + 'static)) {
    eprintln!("{}", friendly_message(err).red());

    let suggestions = suggest_solutions(err);
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("{}", "💡 Suggestions:".bold());
        for suggestion in &suggestions {
            eprintln!("{}", suggestion);
        }
    }
}
