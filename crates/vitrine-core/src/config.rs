use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::validate::DEFAULT_MAX_NAME_LEN;

/// Directory holding project state, relative to the project root.
pub const PROJECT_DIR: &str = ".vitrine";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Category file, relative to the project root unless absolute.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default)]
    pub show_descriptions: bool,
    #[serde(default)]
    pub expand_all: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            show_descriptions: false,
            expand_all: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

impl ProjectConfig {
    /// Absolute location of the category file for `project_root`.
    #[must_use]
    pub fn store_path(&self, project_root: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            project_root.join(&self.store.path)
        }
    }
}

/// Location of the persisted expansion set for `project_root`.
#[must_use]
pub fn expansion_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("expanded.json")
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("vitrine/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and settle the output mode.
///
/// `cli_format` is the explicit `--format` value (or `"json"` for `--json`).
pub fn resolve_config(project_root: &Path, cli_format: Option<&str>) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Walk up from `start` looking for a `.vitrine` directory.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Canonical output mode name for `raw`, accepting the legacy aliases.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_format: Option<&str>,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    if let Some(mode) = cli_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_store_path() -> PathBuf {
    Path::new(PROJECT_DIR).join("categories.json")
}

const fn default_max_name_len() -> usize {
    DEFAULT_MAX_NAME_LEN
}

const fn default_indent() -> usize {
    2
}
