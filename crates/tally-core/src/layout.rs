//! On-disk layout of an installed framework.
//!
//! ```text
//! <project>/.tally/
//!   agents/     *.yaml agent definitions
//!   tasks/      *.md tasks with optional YAML front matter
//!   templates/
//!   data/
//!   bundle/     pre-built bundle documents
//! ```

use std::path::{Path, PathBuf};

/// Framework directory name inside a project.
pub const FRAMEWORK_DIR: &str = ".tally";

pub const AGENTS_DIR: &str = "agents";
pub const TASKS_DIR: &str = "tasks";
pub const TEMPLATES_DIR: &str = "templates";
pub const DATA_DIR: &str = "data";
pub const BUNDLE_DIR: &str = "bundle";

/// Environment variable overriding the project root.
pub const PROJECT_DIR_ENV: &str = "TALLY_PROJECT_DIR";

/// Extension of agent definition files.
pub const AGENT_EXTENSION: &str = "yaml";

pub fn framework_path(project_dir: &Path) -> PathBuf {
    project_dir.join(FRAMEWORK_DIR)
}

pub fn agents_path(framework_dir: &Path) -> PathBuf {
    framework_dir.join(AGENTS_DIR)
}

pub fn tasks_path(framework_dir: &Path) -> PathBuf {
    framework_dir.join(TASKS_DIR)
}

pub fn templates_path(framework_dir: &Path) -> PathBuf {
    framework_dir.join(TEMPLATES_DIR)
}

pub fn data_path(framework_dir: &Path) -> PathBuf {
    framework_dir.join(DATA_DIR)
}

pub fn bundle_path(framework_dir: &Path) -> PathBuf {
    framework_dir.join(BUNDLE_DIR)
}

/// Resolve the project root.
///
/// Uses `TALLY_PROJECT_DIR` when set and non-empty, otherwise the current
/// working directory.
pub fn project_root() -> std::io::Result<PathBuf> {
    match std::env::var(PROJECT_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => std::env::current_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_nest_under_framework() {
        let fw = framework_path(Path::new("/work/project"));
        assert_eq!(fw, PathBuf::from("/work/project/.tally"));
        assert_eq!(agents_path(&fw), PathBuf::from("/work/project/.tally/agents"));
        assert_eq!(tasks_path(&fw), PathBuf::from("/work/project/.tally/tasks"));
        assert_eq!(templates_path(&fw), PathBuf::from("/work/project/.tally/templates"));
        assert_eq!(data_path(&fw), PathBuf::from("/work/project/.tally/data"));
        assert_eq!(bundle_path(&fw), PathBuf::from("/work/project/.tally/bundle"));
    }
}
