//! Parsers for agent YAML files and task front matter.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::layout;

/// Raw agent file as written on disk.
#[derive(Debug, Default, Deserialize)]
pub struct AgentFile {
    pub agent: AgentSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentSection {
    #[serde(default)]
    pub identity: AgentIdentity,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: String,
}

/// Dependency block of a task's front matter.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFrontMatter {
    #[serde(default)]
    pub dependencies: DependencySection,
}

#[derive(Debug, Default, Deserialize)]
pub struct DependencySection {
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default, rename = "data")]
    pub data_files: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub mcp_servers: Vec<String>,
}

/// Parse an agent definition.
pub fn parse_agent(path: &Path, content: &str) -> CoreResult<AgentFile> {
    serde_yaml::from_str(content).map_err(|source| CoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the front matter of a task file.
///
/// Tasks without front matter have no dependencies.
pub fn parse_task(path: &Path, content: &str) -> CoreResult<TaskFrontMatter> {
    let Some(yaml) = front_matter(content) else {
        return Ok(TaskFrontMatter::default());
    };

    if yaml.trim().is_empty() {
        return Ok(TaskFrontMatter::default());
    }

    serde_yaml::from_str(yaml).map_err(|source| CoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract the `---` delimited block at the very top of a Markdown file.
pub fn front_matter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Resolve a task reference from an agent file to a path under `tasks/`.
///
/// References may be bare (`create-prd.md`) or framework-relative
/// (`./.tally/tasks/create-prd.md`).
pub fn resolve_task_ref(framework_dir: &Path, reference: &str) -> PathBuf {
    let prefix = format!("./{}/{}/", layout::FRAMEWORK_DIR, layout::TASKS_DIR);
    let name = reference.strip_prefix(&prefix).unwrap_or(reference);
    layout::tasks_path(framework_dir).join(name)
}
