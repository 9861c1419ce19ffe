//! Subcommand handlers.
//!
//! Every handler opens the [`Project`] it runs in, drives a
//! [`HierarchyController`] over the project's JSON store, and renders through
//! [`crate::output`].

pub mod create;
pub mod delete;
pub mod expand;
pub mod init;
pub mod show;
pub mod tree;
pub mod update;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use vitrine_core::config::{self, ProjectConfig};
use vitrine_core::store::file::JsonFileStore;
use vitrine_core::{ErrorCode, ExpansionState, HierarchyController};

use crate::output::CliError;

/// An initialized project directory and its loaded config.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Find the project enclosing `start` and load its config.
    ///
    /// # Errors
    ///
    /// Fails with `E1001` if no `.vitrine/` directory exists at or above
    /// `start`, or `E1002` if its config does not parse.
    pub fn open(start: &Path) -> Result<Self> {
        let Some(root) = config::find_project_root(start) else {
            return Err(coded(
                ErrorCode::NotInitialized,
                format!("no .vitrine/ directory found at or above {}", start.display()),
            )
            .into());
        };
        let config = config::load_project_config(&root)
            .map_err(|e| coded(ErrorCode::ConfigParseError, format!("{e:#}")))?;
        debug!(root = %root.display(), "opened project");
        Ok(Self { root, config })
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.config.store_path(&self.root))
    }

    /// A controller over this project's store, seeded with the persisted
    /// expansion set.
    pub fn controller(&self) -> Result<HierarchyController<JsonFileStore>> {
        Ok(HierarchyController::new(self.store())
            .with_max_name_len(self.config.validation.max_name_len)
            .with_expansion(self.load_expansion()?))
    }

    pub fn expansion_path(&self) -> PathBuf {
        config::expansion_path(&self.root)
    }

    /// Read `.vitrine/expanded.json`. A missing or blank file is an empty set.
    pub fn load_expansion(&self) -> Result<ExpansionState> {
        let path = self.expansion_path();
        if !path.exists() {
            return Ok(ExpansionState::new());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(ExpansionState::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_expansion(&self, expansion: &ExpansionState) -> Result<()> {
        let path = self.expansion_path();
        let mut body = serde_json::to_string_pretty(expansion)?;
        body.push('\n');
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), open = expansion.len(), "saved expansion state");
        Ok(())
    }
}

/// A [`CliError`] carrying `code` and its stock hint.
pub fn coded(code: ErrorCode, message: impl Into<String>) -> CliError {
    CliError::with_details(
        message,
        code.hint().unwrap_or(code.message()),
        code.code(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_dir() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".vitrine")).expect("mkdir");
        dir
    }

    #[test]
    fn open_outside_project_is_not_initialized() {
        let dir = TempDir::new().expect("tempdir");
        let err = Project::open(dir.path()).unwrap_err();
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1001"));
    }

    #[test]
    fn open_reports_config_parse_errors() {
        let dir = init_dir();
        std::fs::write(dir.path().join(".vitrine/config.toml"), "[display\n").expect("write");
        let err = Project::open(dir.path()).unwrap_err();
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1002"));
        assert!(cli.message.contains("config.toml"));
    }

    #[test]
    fn expansion_round_trips_through_disk() {
        let dir = init_dir();
        let project = Project::open(dir.path()).expect("open");
        assert!(project.load_expansion().expect("load").is_empty());

        let state: ExpansionState = ["cat-2", "cat-1"].into_iter().collect();
        project.save_expansion(&state).expect("save");

        let raw = std::fs::read_to_string(project.expansion_path()).expect("read");
        let ids: Vec<String> = serde_json::from_str(&raw).expect("json array");
        assert_eq!(ids, vec!["cat-1", "cat-2"]);
        assert_eq!(project.load_expansion().expect("load"), state);
    }
}
