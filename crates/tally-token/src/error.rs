//! Error types for token measurement and aggregation.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use tally_core::CoreError;

/// Errors raised while measuring or aggregating token costs.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("discovery failed: {0}")]
    Discovery(#[source] CoreError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to calculate tokens for {}: {source}", path.display())]
    Measurement {
        path: PathBuf,
        #[source]
        source: Box<TokenError>,
    },

    #[error("failed to encode text: {0}")]
    Backend(String),

    #[error("failed to calculate tokens for agent {agent}: {source}")]
    Agent {
        agent: String,
        #[source]
        source: Box<TokenError>,
    },

    #[error("token count {count} exceeds limit {limit}")]
    LimitExceeded { count: usize, limit: usize },

    #[error("operation canceled")]
    Cancelled,

    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

impl TokenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach an artifact path to a backend failure.
    pub fn measurement(path: impl Into<PathBuf>, source: TokenError) -> Self {
        match source {
            Self::Cancelled | Self::DeadlineExceeded(_) => source,
            other => Self::Measurement {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Attach an agent name to a failure inside that agent's tree.
    pub fn in_agent(agent: impl Into<String>, source: TokenError) -> Self {
        match source {
            Self::Cancelled | Self::DeadlineExceeded(_) => source,
            other => Self::Agent {
                agent: agent.into(),
                source: Box::new(other),
            },
        }
    }

    /// Whether this error stems from cancellation rather than a real failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded(_))
    }
}

impl From<CoreError> for TokenError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Cancelled => Self::Cancelled,
            other => Self::Discovery(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_wrapped() {
        let err = TokenError::in_agent("pm", TokenError::Cancelled);
        assert!(matches!(err, TokenError::Cancelled));

        let err = TokenError::measurement("/a.md", TokenError::DeadlineExceeded(Duration::from_secs(1)));
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_context_in_message() {
        let err = TokenError::in_agent(
            "Peter Manager",
            TokenError::measurement("/fw/tasks/a.md", TokenError::Backend("bad bytes".into())),
        );
        assert_eq!(
            err.to_string(),
            "failed to calculate tokens for agent Peter Manager: failed to calculate tokens for /fw/tasks/a.md: failed to encode text: bad bytes"
        );
    }

    #[test]
    fn test_discovery_cancel_maps_to_cancelled() {
        let err: TokenError = CoreError::Cancelled.into();
        assert!(matches!(err, TokenError::Cancelled));

        let err: TokenError = CoreError::agent_not_found("ghost").into();
        assert_eq!(err.to_string(), "discovery failed: agent 'ghost' not found");
    }
}
