//! `vt toggle`, `vt expand-all`, `vt collapse-all`: change and persist the
//! expansion set.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use vitrine_core::ErrorCode;

use super::tree::{RowStyle, TreeView, render_tree};
use super::{Project, coded};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Category id to open or close.
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub id: String,
    pub expanded: bool,
}

fn render_toggle_text(result: &ToggleResult, w: &mut dyn Write) -> io::Result<()> {
    let state = if result.expanded { "open" } else { "closed" };
    writeln!(w, "{}\t{state}", result.id)
}

fn render_toggle_pretty(result: &ToggleResult, w: &mut dyn Write) -> io::Result<()> {
    if result.expanded {
        writeln!(w, "▾ [{}] expanded", result.id)
    } else {
        writeln!(w, "▸ [{}] collapsed", result.id)
    }
}

/// Execute `vt toggle`.
///
/// # Errors
///
/// Fails with `E4001` if the id is not in the current hierarchy.
pub async fn run_toggle(args: &ToggleArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;
    controller.refresh().await?;

    if !controller.forest().contains(&args.id) {
        return Err(coded(
            ErrorCode::CategoryNotFound,
            format!("category '{}' not found", args.id),
        )
        .into());
    }

    let expanded = controller.toggle_expand(&args.id);
    project.save_expansion(&controller.expansion())?;

    let result = ToggleResult {
        id: args.id.clone(),
        expanded,
    };
    render_mode(output, &result, render_toggle_text, render_toggle_pretty)
}

/// Execute `vt expand-all`: open every node that has children.
///
/// # Errors
///
/// Fails if the project cannot be opened, the store cannot be read, or the
/// expansion file cannot be written.
pub async fn run_expand_all(output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;
    controller.refresh().await?;

    controller.expand_all();
    project.save_expansion(&controller.expansion())?;

    render_tree(
        output,
        &TreeView::of(&controller),
        RowStyle::from(&project.config.display),
    )
}

/// Execute `vt collapse-all`. The empty set is saved before the store is read.
///
/// # Errors
///
/// Fails if the project cannot be opened or the expansion file cannot be
/// written.
pub async fn run_collapse_all(output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;

    controller.collapse_all();
    project.save_expansion(&controller.expansion())?;
    controller.refresh().await?;

    render_tree(
        output,
        &TreeView::of(&controller),
        RowStyle::from(&project.config.display),
    )
}
