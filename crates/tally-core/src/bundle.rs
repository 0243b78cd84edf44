//! Bundle naming conventions.
//!
//! Bundles are pre-built Markdown documents under `.tally/bundle/`. Their file
//! names are derived from the agent selection so that other commands can
//! locate them without a manifest.

/// File name of the bundle covering every agent.
pub const ALL_AGENTS_BUNDLE: &str = "all.md";

const BUNDLE_EXTENSION: &str = ".md";

/// Derive a bundle file name.
///
/// - an explicit `custom_output` wins (`.md` appended when missing)
/// - no agents selects the all-agents bundle
/// - one agent plus a task gives `<agent>-<task>.md`
/// - otherwise agent names are lowercased, sorted and joined with `-`
pub fn bundle_filename(custom_output: Option<&str>, agents: &[String], task: Option<&str>) -> String {
    if let Some(custom) = custom_output.filter(|c| !c.is_empty()) {
        if custom.ends_with(BUNDLE_EXTENSION) {
            return custom.to_string();
        }
        return format!("{}{}", custom, BUNDLE_EXTENSION);
    }

    if agents.is_empty() {
        return ALL_AGENTS_BUNDLE.to_string();
    }

    if let (Some(task), [agent]) = (task.filter(|t| !t.is_empty()), agents) {
        return format!(
            "{}-{}{}",
            agent.to_lowercase(),
            task.to_lowercase(),
            BUNDLE_EXTENSION
        );
    }

    let mut names: Vec<String> = agents.iter().map(|a| a.to_lowercase()).collect();
    names.sort();
    format!("{}{}", names.join("-"), BUNDLE_EXTENSION)
}

/// Split an agent selection into names.
///
/// Comma-separated when a comma is present, whitespace-separated otherwise.
pub fn parse_agent_list(input: &str) -> Vec<String> {
    if input.contains(',') {
        return input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    input.split_whitespace().map(String::from).collect()
}
