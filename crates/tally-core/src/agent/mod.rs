//! Agent loading.
//!
//! Reads an agent definition and the front matter of every task it lists,
//! producing an [`AgentRecord`] with absolute dependency paths.

pub mod model;
pub mod parser;

use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::layout;
pub use model::{AgentRecord, TaskDependencies, TaskEntry};

/// Load one agent file and resolve its task tree.
pub fn load_agent(framework_dir: &Path, agent_path: &Path) -> CoreResult<AgentRecord> {
    let content =
        std::fs::read_to_string(agent_path).map_err(|e| CoreError::io(agent_path, e))?;
    let raw = parser::parse_agent(agent_path, &content)?;

    let tasks = raw
        .agent
        .tasks
        .iter()
        .map(|reference| load_task(framework_dir, reference))
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(AgentRecord {
        name: raw.agent.identity.name,
        short_name: file_stem(agent_path),
        description: raw.agent.identity.description,
        role: raw.agent.identity.role,
        file_path: agent_path.to_path_buf(),
        tasks,
    })
}

fn load_task(framework_dir: &Path, reference: &str) -> CoreResult<TaskEntry> {
    let path = parser::resolve_task_ref(framework_dir, reference);
    let content = std::fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
    let deps = parser::parse_task(&path, &content)?.dependencies;

    let templates_dir = layout::templates_path(framework_dir);
    let data_dir = layout::data_path(framework_dir);
    let tasks_dir = layout::tasks_path(framework_dir);

    Ok(TaskEntry {
        name: file_stem(&path),
        dependencies: TaskDependencies {
            templates: deps.templates.iter().map(|t| templates_dir.join(t)).collect(),
            data_files: deps.data_files.iter().map(|d| data_dir.join(d)).collect(),
            tasks: deps.tasks.iter().map(|t| tasks_dir.join(t)).collect(),
            mcp_servers: deps.mcp_servers,
        },
        path,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
