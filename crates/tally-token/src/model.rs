//! Token cost reports.
//!
//! All reports are built fresh per invocation. Costs are plain token counts
//! and every total is a sum over its parts, so reduction order never matters.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kind of artifact a cost belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Agent,
    Task,
    Template,
    Data,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Task => "task",
            Self::Template => "template",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured cost of one artifact file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactCost {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub cost: usize,
    #[serde(skip)]
    pub raw_content: String,
}

/// Cost of one agent and everything it pulls in.
///
/// `total_cost` always equals the own artifact plus every dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentCostReport {
    pub agent_name: String,
    pub agent_short_name: String,
    pub agent_file_path: PathBuf,
    pub total_cost: usize,
    pub own_artifact: ArtifactCost,
    pub dependency_tasks: Vec<ArtifactCost>,
    pub dependency_templates: Vec<ArtifactCost>,
    pub dependency_data_files: Vec<ArtifactCost>,
}

impl AgentCostReport {
    pub fn new(
        agent_name: String,
        agent_short_name: String,
        own_artifact: ArtifactCost,
        dependency_tasks: Vec<ArtifactCost>,
        dependency_templates: Vec<ArtifactCost>,
        dependency_data_files: Vec<ArtifactCost>,
    ) -> Self {
        let total_cost = own_artifact.cost
            + sum(&dependency_tasks)
            + sum(&dependency_templates)
            + sum(&dependency_data_files);

        Self {
            agent_name,
            agent_short_name,
            agent_file_path: own_artifact.path.clone(),
            total_cost,
            own_artifact,
            dependency_tasks,
            dependency_templates,
            dependency_data_files,
        }
    }

    /// Number of dependency artifacts across all categories.
    pub fn dependency_count(&self) -> usize {
        self.dependency_tasks.len() + self.dependency_templates.len() + self.dependency_data_files.len()
    }

    /// Every artifact of the report, own artifact first.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactCost> {
        std::iter::once(&self.own_artifact)
            .chain(&self.dependency_tasks)
            .chain(&self.dependency_templates)
            .chain(&self.dependency_data_files)
    }

    /// Sort dependency lists by path. Aggregation order is not stable.
    pub fn sort_for_display(&mut self) {
        for list in [
            &mut self.dependency_tasks,
            &mut self.dependency_templates,
            &mut self.dependency_data_files,
        ] {
            list.sort_by(|a, b| a.path.cmp(&b.path));
        }
    }
}

/// Project-wide token totals by artifact kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub agents: usize,
    pub tasks: usize,
    pub templates: usize,
    pub data_files: usize,
}

impl CostBreakdown {
    /// Attribute every artifact of an agent report to its counter.
    pub fn absorb(&mut self, report: &AgentCostReport) {
        for artifact in report.artifacts() {
            match artifact.kind {
                ArtifactKind::Agent => self.agents += artifact.cost,
                ArtifactKind::Task => self.tasks += artifact.cost,
                ArtifactKind::Template => self.templates += artifact.cost,
                ArtifactKind::Data => self.data_files += artifact.cost,
            }
        }
    }

    pub fn total(&self) -> usize {
        self.agents + self.tasks + self.templates + self.data_files
    }
}

/// Token totals for a set of agents.
///
/// Agents sharing a dependency each count it; reports are self-contained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectCostReport {
    pub total_cost: usize,
    pub agents: Vec<AgentCostReport>,
    pub breakdown: CostBreakdown,
}

impl ProjectCostReport {
    pub fn with_capacity(agents: usize) -> Self {
        Self {
            agents: Vec::with_capacity(agents),
            ..Default::default()
        }
    }

    /// Fold one agent into the totals.
    pub fn absorb(&mut self, report: AgentCostReport) {
        self.total_cost += report.total_cost;
        self.breakdown.absorb(&report);
        self.agents.push(report);
    }

    /// Order agents by short name and their dependencies by path.
    pub fn sort_for_display(&mut self) {
        self.agents
            .sort_by(|a, b| a.agent_short_name.cmp(&b.agent_short_name));
        for agent in &mut self.agents {
            agent.sort_for_display();
        }
    }
}

/// Cost of a pre-built bundle document, measured as one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleCostReport {
    pub scope: String,
    pub total_cost: usize,
    pub bundle_file: String,
}

fn sum(artifacts: &[ArtifactCost]) -> usize {
    artifacts.iter().map(|a| a.cost).sum()
}
