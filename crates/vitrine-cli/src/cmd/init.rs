use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use vitrine_core::ExpansionState;
use vitrine_core::config::{self, PROJECT_DIR};
use vitrine_core::store::file::JsonFileStore;

use super::Project;
use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `.vitrine/config.toml` even if the project already exists.
    /// Existing categories are kept.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[store]\n\
    path = \".vitrine/categories.json\"\n\
    \n\
    [validation]\n\
    max_name_len = 200\n\
    \n\
    [display]\n\
    indent = 2\n\
    show_descriptions = false\n\
    expand_all = false\n";

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub root: PathBuf,
    pub config: PathBuf,
    pub store: PathBuf,
    /// `false` if an existing category file was kept.
    pub created_store: bool,
}

fn render_init_text(result: &InitResult, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "root\t{}", result.root.display())?;
    writeln!(w, "config\t{}", result.config.display())?;
    writeln!(w, "store\t{}", result.store.display())
}

fn render_init_pretty(result: &InitResult, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "✓ Initialized {PROJECT_DIR}/ in {}", result.root.display())?;
    writeln!(w)?;
    pretty_kv(w, "Config", result.config.display().to_string())?;
    let note = if result.created_store { "" } else { " (kept)" };
    pretty_kv(w, "Store", format!("{}{note}", result.store.display()))?;
    writeln!(w)?;
    writeln!(w, "Next steps:")?;
    writeln!(w, "  vt create --name \"Rings\"")?;
    writeln!(w, "  vt tree --all")
}

/// Execute `vt init`. Creates the project skeleton:
///
/// ```text
/// .vitrine/
///   config.toml       (default project config)
///   categories.json   (empty category list, unless one exists)
///   expanded.json     (empty expansion set, unless one exists)
/// ```
///
/// # Errors
///
/// Returns an error if `.vitrine/config.toml` already exists and `--force`
/// is not set, or if any filesystem operation fails.
pub async fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let dir = project_root.join(PROJECT_DIR);
    let config_path = dir.join("config.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!("{PROJECT_DIR}/ already exists. Use `vt init --force` to rewrite its config.");
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let project = Project::open(project_root)?;
    let store = JsonFileStore::new(project.config.store_path(&project.root));
    let created_store = store.ensure_exists().await?;

    if !config::expansion_path(&project.root).exists() {
        project.save_expansion(&ExpansionState::new())?;
    }

    let result = InitResult {
        root: project.root.clone(),
        config: config_path,
        store: store.path().to_path_buf(),
        created_store,
    };
    render_mode(output, &result, render_init_text, render_init_pretty)
}
