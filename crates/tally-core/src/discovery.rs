//! Agent discovery.
//!
//! [`Discovery`] hands out fully resolved [`AgentRecord`]s. Two sources exist:
//! [`FsDiscovery`] reads an installed framework from disk, [`StaticDiscovery`]
//! serves a record set handed to its constructor.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::WalkDir;

use crate::agent::{self, AgentRecord};
use crate::error::{CoreError, CoreResult};
use crate::layout;

/// Source of resolved agent records.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// All agents of the project, ordered by short name.
    async fn get_agents(&self, cancel: &CancellationToken) -> CoreResult<Vec<AgentRecord>>;

    /// A single agent by short name.
    async fn get_agent(
        &self,
        cancel: &CancellationToken,
        short_name: &str,
    ) -> CoreResult<AgentRecord> {
        self.get_agents(cancel)
            .await?
            .into_iter()
            .find(|a| a.short_name == short_name)
            .ok_or_else(|| CoreError::agent_not_found(short_name))
    }

    /// Agents in the requested order. Fails on the first unknown name.
    async fn get_agents_by_names(
        &self,
        cancel: &CancellationToken,
        names: &[String],
    ) -> CoreResult<Vec<AgentRecord>> {
        let agents = self.get_agents(cancel).await?;
        names
            .iter()
            .map(|name| {
                agents
                    .iter()
                    .find(|a| &a.short_name == name)
                    .cloned()
                    .ok_or_else(|| CoreError::agent_not_found(name.as_str()))
            })
            .collect()
    }
}

/// Discovery over an installed framework directory.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    framework_dir: PathBuf,
}

impl FsDiscovery {
    pub fn new(framework_dir: impl Into<PathBuf>) -> Self {
        Self {
            framework_dir: framework_dir.into(),
        }
    }

    pub fn framework_dir(&self) -> &Path {
        &self.framework_dir
    }
}

#[async_trait]
impl Discovery for FsDiscovery {
    async fn get_agents(&self, cancel: &CancellationToken) -> CoreResult<Vec<AgentRecord>> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let agents_dir = layout::agents_path(&self.framework_dir);
        if !agents_dir.is_dir() {
            return Err(CoreError::FrameworkNotInstalled(self.framework_dir.clone()));
        }

        let framework_dir = self.framework_dir.clone();
        let scan = tokio::task::spawn_blocking(move || scan_agents(&framework_dir, &agents_dir));

        let agents = tokio::select! {
            _ = cancel.cancelled() => return Err(CoreError::Cancelled),
            joined = scan => joined.map_err(|e| CoreError::Task(e.to_string()))??,
        };

        debug!(count = agents.len(), dir = %self.framework_dir.display(), "discovered agents");
        Ok(agents)
    }
}

fn scan_agents(framework_dir: &Path, agents_dir: &Path) -> CoreResult<Vec<AgentRecord>> {
    let mut agents = Vec::new();

    for entry in WalkDir::new(agents_dir).sort_by_file_name() {
        let entry = entry.map_err(|source| CoreError::Walk {
            path: agents_dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let is_agent = entry.file_type().is_file()
            && path.extension().map_or(false, |e| e == layout::AGENT_EXTENSION);
        if !is_agent {
            continue;
        }

        agents.push(agent::load_agent(framework_dir, path)?);
    }

    agents.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    Ok(agents)
}

/// Discovery over a fixed, caller-supplied record set.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    agents: Vec<AgentRecord>,
}

impl StaticDiscovery {
    pub fn new(mut agents: Vec<AgentRecord>) -> Self {
        agents.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        Self { agents }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn get_agents(&self, cancel: &CancellationToken) -> CoreResult<Vec<AgentRecord>> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        Ok(self.agents.clone())
    }
}
