//! `vt tree`: print the category hierarchy.
//!
//! Only rows under open nodes are shown. `--all` and `--open` widen the view
//! for this invocation without touching the persisted expansion set.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;
use vitrine_core::config::DisplayConfig;
use vitrine_core::store::CategoryStore;
use vitrine_core::tree::query::VisibleRow;
use vitrine_core::{HierarchyController, RefreshOutcome};

use super::Project;
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Show every category regardless of the saved expansion state.
    #[arg(long)]
    pub all: bool,

    /// Also reveal this category (open its ancestors and itself). Repeatable.
    #[arg(long, value_name = "ID")]
    pub open: Vec<String>,
}

/// What `vt tree` and the expansion commands print.
#[derive(Debug, Serialize)]
pub struct TreeView {
    pub total: usize,
    pub rows: Vec<VisibleRow>,
}

impl TreeView {
    pub fn of<S: CategoryStore>(controller: &HierarchyController<S>) -> Self {
        Self {
            total: controller.forest().len(),
            rows: controller.visible_rows(),
        }
    }
}

/// Indentation and detail settings for row output.
#[derive(Debug, Clone, Copy)]
pub struct RowStyle {
    pub indent: usize,
    pub show_descriptions: bool,
}

impl From<&DisplayConfig> for RowStyle {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            indent: display.indent,
            show_descriptions: display.show_descriptions,
        }
    }
}

const fn marker(row: &VisibleRow) -> &'static str {
    match (row.has_children, row.expanded) {
        (true, true) => "▾",
        (true, false) => "▸",
        (false, _) => "·",
    }
}

pub fn write_rows_pretty(w: &mut dyn Write, view: &TreeView, style: RowStyle) -> io::Result<()> {
    pretty_section(w, &format!("Categories ({} total)", view.total))?;
    if view.rows.is_empty() {
        return writeln!(w, "(no categories)");
    }
    for row in &view.rows {
        let pad = " ".repeat(row.depth * style.indent);
        write!(w, "{pad}{} {}  [{}]", marker(row), row.name, row.id)?;
        match (&row.description, style.show_descriptions) {
            (Some(description), true) => writeln!(w, "  {description}")?,
            _ => writeln!(w)?,
        }
    }
    Ok(())
}

pub fn write_rows_text(w: &mut dyn Write, view: &TreeView, style: RowStyle) -> io::Result<()> {
    for row in &view.rows {
        let pad = " ".repeat(row.depth * style.indent);
        write!(w, "{pad}{}\t{}", row.id, row.name)?;
        match (&row.description, style.show_descriptions) {
            (Some(description), true) => writeln!(w, "\t{description}")?,
            _ => writeln!(w)?,
        }
    }
    Ok(())
}

/// Render a [`TreeView`] in `output` mode.
pub fn render_tree(output: OutputMode, view: &TreeView, style: RowStyle) -> Result<()> {
    render_mode(
        output,
        view,
        |v, w| write_rows_text(w, v, style),
        |v, w| write_rows_pretty(w, v, style),
    )
}

/// Execute `vt tree`.
///
/// # Errors
///
/// Fails if the project cannot be opened or the store cannot be read.
pub async fn run_tree(args: &TreeArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;

    if let RefreshOutcome::Applied { report, .. } = controller.refresh().await? {
        if !report.is_clean() {
            warn!(
                orphans = report.orphans.len(),
                self_parents = report.self_parents.len(),
                duplicates = report.duplicates.len(),
                cycle_breaks = report.cycle_breaks.len(),
                "category list needed corrections"
            );
        }
    }

    if args.all || project.config.display.expand_all {
        controller.expand_all();
    }
    for id in &args.open {
        if !controller.reveal(id) {
            warn!(category = %id, "cannot open unknown category");
            continue;
        }
        if !controller.is_expanded(id) {
            controller.toggle_expand(id);
        }
    }

    let view = TreeView::of(&controller);
    render_tree(output, &view, RowStyle::from(&project.config.display))
}
