//! # Tally Token
//!
//! Token cost aggregation for agents and their dependency trees.
//!
//! An [`Engine`] wraps one tokenizer backend. The [`Aggregator`] asks
//! discovery for agents, measures every artifact on bounded worker pools and
//! reduces the counts into per-agent and project reports.

pub mod aggregator;
pub mod backend;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod limits;
pub mod model;
pub mod pool;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use backend::{Cl100kTokenizer, Tokenizer};
pub use diagnostics::{friendly_message, suggest_solutions, Diagnosis};
pub use engine::Engine;
pub use error::{TokenError, TokenResult};
pub use limits::{check_limit, with_deadline};
pub use model::{
    AgentCostReport, ArtifactCost, ArtifactKind, BundleCostReport, CostBreakdown,
    ProjectCostReport,
};
