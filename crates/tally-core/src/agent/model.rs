//! Agent domain models.

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// An agent with its resolved task tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentRecord {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub role: String,
    pub file_path: PathBuf,
    pub tasks: Vec<TaskEntry>,
}

/// A task referenced directly by an agent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskEntry {
    pub name: String,
    pub path: PathBuf,
    pub dependencies: TaskDependencies,
}

/// Resolved dependencies declared in a task's front matter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskDependencies {
    pub templates: Vec<PathBuf>,
    pub data_files: Vec<PathBuf>,
    pub tasks: Vec<PathBuf>,
    pub mcp_servers: Vec<String>,
}

impl AgentRecord {
    /// Paths of the tasks the agent lists directly.
    pub fn task_paths(&self) -> Vec<PathBuf> {
        self.tasks.iter().map(|t| t.path.clone()).collect()
    }

    /// Templates used by any of the agent's tasks.
    pub fn template_paths(&self) -> Vec<PathBuf> {
        dedup(self.tasks.iter().flat_map(|t| t.dependencies.templates.iter()))
    }

    /// Data files used by any of the agent's tasks.
    pub fn data_file_paths(&self) -> Vec<PathBuf> {
        dedup(self.tasks.iter().flat_map(|t| t.dependencies.data_files.iter()))
    }

    /// Tasks referenced from within the agent's tasks.
    pub fn referenced_task_paths(&self) -> Vec<PathBuf> {
        dedup(self.tasks.iter().flat_map(|t| t.dependencies.tasks.iter()))
    }

    /// MCP servers required by any of the agent's tasks.
    pub fn mcp_servers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.tasks
            .iter()
            .flat_map(|t| t.dependencies.mcp_servers.iter())
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Direct tasks followed by referenced tasks not already listed.
    pub fn dependency_task_paths(&self) -> Vec<PathBuf> {
        dedup(
            self.tasks
                .iter()
                .map(|t| &t.path)
                .chain(self.tasks.iter().flat_map(|t| t.dependencies.tasks.iter())),
        )
    }
}

/// Deduplicate while keeping first-seen order.
fn dedup<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .filter(move |p| seen.insert(*p))
        .cloned()
        .collect()
}
