//! Hierarchical token aggregation.
//!
//! Measures every artifact an agent depends on and rolls the counts up into
//! agent and project totals. Fan-out happens at two levels: one pool over
//! agents, and inside each agent one pool per dependency category.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tally_core::bundle;
use tally_core::layout;
use tally_core::{AgentRecord, Discovery};

use crate::engine::Engine;
use crate::error::{TokenError, TokenResult};
use crate::model::{
    AgentCostReport, ArtifactCost, ArtifactKind, BundleCostReport, ProjectCostReport,
};
use crate::pool::{self, DEFAULT_WORKERS};

/// Tuning for the aggregator's worker pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Workers per pool; each level and category gets its own pool.
    pub workers: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Computes agent, project and bundle token reports.
#[derive(Clone)]
pub struct Aggregator {
    engine: Arc<Engine>,
    discovery: Arc<dyn Discovery>,
    framework_dir: PathBuf,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(
        engine: Engine,
        discovery: Arc<dyn Discovery>,
        framework_dir: impl Into<PathBuf>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            discovery,
            framework_dir: framework_dir.into(),
            config,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Report for a single agent.
    pub async fn agent_report(
        &self,
        cancel: &CancellationToken,
        short_name: &str,
    ) -> TokenResult<AgentCostReport> {
        let record = self.discovery.get_agent(cancel, short_name).await?;
        self.compute_agent(record, cancel.clone()).await
    }

    /// Report over every agent of the project.
    pub async fn project_report(&self, cancel: &CancellationToken) -> TokenResult<ProjectCostReport> {
        let records = self.discovery.get_agents(cancel).await?;
        self.aggregate(records, cancel).await
    }

    /// Report over the named agents only.
    pub async fn agents_report(
        &self,
        cancel: &CancellationToken,
        names: &[String],
    ) -> TokenResult<ProjectCostReport> {
        let records = self.discovery.get_agents_by_names(cancel, names).await?;
        self.aggregate(records, cancel).await
    }

    /// Measure a pre-built bundle as one document.
    ///
    /// An empty selection means the all-agents bundle. The bundle is never
    /// generated here; a missing file is an IO error.
    pub async fn bundle_report(
        &self,
        cancel: &CancellationToken,
        agents: &[String],
    ) -> TokenResult<BundleCostReport> {
        let bundle_file = bundle::bundle_filename(None, agents, None);
        let path = layout::bundle_path(&self.framework_dir).join(&bundle_file);

        let content = read_artifact(cancel, &path).await?;
        let total_cost = self
            .engine
            .measure_text(cancel, content)
            .await
            .map_err(|e| TokenError::measurement(&path, e))?;

        let scope = if agents.is_empty() {
            "all".to_string()
        } else {
            agents.join(",")
        };
        debug!(bundle = %bundle_file, total_cost, "measured bundle");

        Ok(BundleCostReport {
            scope,
            total_cost,
            bundle_file,
        })
    }

    /// Check that discovery knows the agent.
    pub async fn validate_agent_exists(&self, cancel: &CancellationToken, short_name: &str) -> TokenResult<()> {
        self.discovery.get_agent(cancel, short_name).await?;
        Ok(())
    }

    async fn aggregate(
        &self,
        records: Vec<AgentRecord>,
        cancel: &CancellationToken,
    ) -> TokenResult<ProjectCostReport> {
        let capacity = records.len();
        let this = self.clone();

        let project = pool::bounded_fold(
            records,
            self.config.workers,
            cancel,
            move |record, token| {
                let this = this.clone();
                async move {
                    let name = record.name.clone();
                    this.compute_agent(record, token)
                        .await
                        .map_err(|e| TokenError::in_agent(name, e))
                }
            },
            ProjectCostReport::with_capacity(capacity),
            |project, report| project.absorb(report),
        )
        .await?;

        info!(
            agents = project.agents.len(),
            total_cost = project.total_cost,
            "project token analysis complete"
        );
        Ok(project)
    }

    async fn compute_agent(
        &self,
        record: AgentRecord,
        cancel: CancellationToken,
    ) -> TokenResult<AgentCostReport> {
        let content = read_artifact(&cancel, &record.file_path).await?;
        let own = self
            .engine
            .measure_artifact(&cancel, &record.file_path, ArtifactKind::Agent, content)
            .await?;

        let (tasks, templates, data_files) = tokio::try_join!(
            self.measure_category(&cancel, record.dependency_task_paths(), ArtifactKind::Task),
            self.measure_category(&cancel, record.template_paths(), ArtifactKind::Template),
            self.measure_category(&cancel, record.data_file_paths(), ArtifactKind::Data),
        )?;

        let report = AgentCostReport::new(
            record.name,
            record.short_name,
            own,
            tasks,
            templates,
            data_files,
        );
        debug!(
            agent = %report.agent_short_name,
            total_cost = report.total_cost,
            dependencies = report.dependency_count(),
            "agent measured"
        );
        Ok(report)
    }

    async fn measure_category(
        &self,
        cancel: &CancellationToken,
        paths: Vec<PathBuf>,
        kind: ArtifactKind,
    ) -> TokenResult<Vec<ArtifactCost>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let engine = Arc::clone(&self.engine);
        pool::bounded_map(paths, self.config.workers, cancel, move |path, token| {
            let engine = Arc::clone(&engine);
            async move {
                let content = read_artifact(&token, &path).await?;
                engine.measure_artifact(&token, &path, kind, content).await
            }
        })
        .await
    }
}

/// Read an artifact, giving up early on cancellation.
///
/// Content that is not valid UTF-8 is a measurement failure of that
/// artifact, not a read failure.
async fn read_artifact(cancel: &CancellationToken, path: &Path) -> TokenResult<String> {
    let bytes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TokenError::Cancelled),
        read = tokio::fs::read(path) => read.map_err(|e| TokenError::io(path, e))?,
    };

    String::from_utf8(bytes).map_err(|e| {
        TokenError::measurement(path, TokenError::Backend(format!("invalid UTF-8: {}", e)))
    })
}
