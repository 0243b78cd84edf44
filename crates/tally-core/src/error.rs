//! Centralized error types for Tally discovery and layout.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for framework discovery operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error("framework not installed at {}", .0.display())]
    FrameworkNotInstalled(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("discovery task failed: {0}")]
    Task(String),

    #[error("discovery canceled")]
    Cancelled,
}

/// Result type for discovery operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an IO error tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a not found error for an agent short name.
    pub fn agent_not_found(name: impl Into<String>) -> Self {
        Self::AgentNotFound(name.into())
    }
}
