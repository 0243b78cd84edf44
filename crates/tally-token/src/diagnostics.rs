//! User-facing error messages and remediation hints.
//!
//! Classification works on the error text (the whole source chain), so it
//! applies equally to library errors and errors wrapped by the CLI.

use std::error::Error;

/// Broad category of a failure, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    AgentNotFound,
    NotInstalled,
    FileNotFound,
    PermissionDenied,
    Encoding,
    Canceled,
    DeadlineExceeded,
    LimitExceeded,
    Unknown,
}

impl Diagnosis {
    pub fn classify(err: &(dyn Error + 'static)) -> Self {
        Self::from_text(&chain_text(err))
    }

    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |needle: &str| text.contains(needle);

        if has("agent") && has("not found") {
            Self::AgentNotFound
        } else if has("framework not installed") {
            Self::NotInstalled
        } else if has("file not found") || has("no such file") {
            Self::FileNotFound
        } else if has("permission denied") {
            Self::PermissionDenied
        } else if has("failed to encode text") {
            Self::Encoding
        } else if has("canceled") || has("cancelled") {
            Self::Canceled
        } else if has("deadline exceeded") {
            Self::DeadlineExceeded
        } else if has("token count") && has("exceeds") && has("limit") {
            Self::LimitExceeded
        } else {
            Self::Unknown
        }
    }
}

/// Short, friendly description of `err`.
pub fn friendly_message(err: &(dyn Error + 'static)) -> String {
    match Diagnosis::classify(err) {
        Diagnosis::AgentNotFound => {
            "❌ Agent not found. Use 'tally list agents' to see available agents.".to_string()
        }
        Diagnosis::NotInstalled => {
            "❌ Framework not installed in this project. Install it into .tally/ first.".to_string()
        }
        Diagnosis::FileNotFound => {
            "❌ Required file is missing. Please ensure all framework files are present.".to_string()
        }
        Diagnosis::PermissionDenied => {
            "❌ Permission denied. Please check file permissions and try again.".to_string()
        }
        Diagnosis::Encoding => {
            "❌ Failed to process text content. The file may contain unsupported characters.".to_string()
        }
        Diagnosis::Canceled => "❌ Operation was canceled. Please try again.".to_string(),
        Diagnosis::DeadlineExceeded => {
            "❌ Operation timed out. Please try again or raise --timeout for large projects.".to_string()
        }
        Diagnosis::LimitExceeded => {
            "⚠️  Token limit exceeded. Consider breaking down your configuration into smaller components."
                .to_string()
        }
        Diagnosis::Unknown => format!(
            "❌ An error occurred: {}\n\nIf this problem persists, please check your framework installation and file permissions.",
            err
        ),
    }
}

/// Remediation bullets for `err`.
pub fn suggest_solutions(err: &(dyn Error + 'static)) -> Vec<String> {
    let hints: &[&str] = match Diagnosis::classify(err) {
        Diagnosis::AgentNotFound => &[
            "Run 'tally list agents' to see every installed agent",
            "Check the agent name spelling",
            "Ensure the framework is properly installed",
        ],
        Diagnosis::NotInstalled => &[
            "Install the framework into the project's .tally/ directory",
            "Navigate to your project directory or pass --project",
            "Set TALLY_PROJECT_DIR to the project root",
        ],
        Diagnosis::FileNotFound => &[
            "Verify all framework files are present",
            "Check if files were accidentally deleted or moved",
            "For bundles, generate the bundle file before measuring it",
        ],
        Diagnosis::PermissionDenied => &[
            "Check file and directory permissions",
            "Ensure you have read access to framework files",
        ],
        Diagnosis::Encoding => &[
            "Make sure framework files are valid UTF-8",
            "Remove binary content from templates and data files",
        ],
        Diagnosis::Canceled => &["Re-run the command"],
        Diagnosis::DeadlineExceeded => &[
            "Increase the timeout with --timeout (e.g. --timeout 2m)",
            "Analyze a single agent with --agent",
        ],
        Diagnosis::LimitExceeded => &[
            "Break down large configurations into smaller components",
            "Remove unnecessary content from templates and tasks",
            "Use references instead of inline content where possible",
        ],
        Diagnosis::Unknown => &[
            "Ensure all required files are present and accessible",
            "Re-run with RUST_LOG=debug for more detail",
        ],
    };

    hints.iter().map(|h| format!("• {}", h)).collect()
}

/// Display text of an error and all of its sources.
fn chain_text(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use std::time::Duration;
    use tally_core::CoreError;

    #[test]
    fn test_classification() {
        let cases: Vec<(TokenError, Diagnosis)> = vec![
            (CoreError::agent_not_found("ghost").into(), Diagnosis::AgentNotFound),
            (
                CoreError::FrameworkNotInstalled("/p/.tally".into()).into(),
                Diagnosis::NotInstalled,
            ),
            (
                TokenError::io(
                    "/p/.tally/tasks/a.md",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
                ),
                Diagnosis::FileNotFound,
            ),
            (
                TokenError::io(
                    "/p/.tally/tasks/a.md",
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied"),
                ),
                Diagnosis::PermissionDenied,
            ),
            (TokenError::Backend("bad".into()), Diagnosis::Encoding),
            (TokenError::Cancelled, Diagnosis::Canceled),
            (TokenError::DeadlineExceeded(Duration::from_secs(30)), Diagnosis::DeadlineExceeded),
            (TokenError::LimitExceeded { count: 9, limit: 5 }, Diagnosis::LimitExceeded),
            (TokenError::Worker("boom".into()), Diagnosis::Unknown),
        ];

        for (err, expected) in cases {
            assert_eq!(Diagnosis::classify(&err), expected, "{}", err);
        }
    }

    #[test]
    fn test_nested_error_uses_source_chain() {
        let err = TokenError::in_agent(
            "pm",
            TokenError::io(
                "/p/.tally/templates/x.md",
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            ),
        );
        assert_eq!(Diagnosis::classify(&err), Diagnosis::FileNotFound);
        assert!(friendly_message(&err).contains("Required file is missing"));
    }

    #[test]
    fn test_unknown_error_includes_text() {
        let err = TokenError::Worker("boom".into());
        let message = friendly_message(&err);
        assert!(message.contains("worker task failed: boom"));
        assert!(!suggest_solutions(&err).is_empty());
    }

    #[test]
    fn test_suggestions_are_bullets() {
        let suggestions = suggest_solutions(&TokenError::LimitExceeded { count: 9, limit: 5 });
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| s.starts_with("• ")));
    }
}
