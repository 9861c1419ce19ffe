//! `vt update`: rename, move, or re-describe a category.
//!
//! Flags that are not given keep the category's current value. The
//! controller always sends the full draft, so the store sees a complete
//! overwrite of name, parent and description.

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};
use std::path::Path;
use vitrine_core::{Category, CategoryDraft, ErrorCode};

use super::create::render_category_text;
use super::{Project, coded};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Category id.
    pub id: String,

    /// New name.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Move under this parent id.
    #[arg(long, short = 'p', value_name = "ID", conflicts_with = "root")]
    pub parent: Option<String>,

    /// Move to the top level.
    #[arg(long)]
    pub root: bool,

    /// New description. An empty string clears it.
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

impl UpdateArgs {
    /// The draft that results from applying these flags to `current`.
    fn draft_for(&self, current: &Category) -> CategoryDraft {
        let mut draft = CategoryDraft::from_category(current);
        if let Some(name) = &self.name {
            draft.name.clone_from(name);
        }
        if self.root {
            draft.parent_id = None;
        } else if let Some(parent) = &self.parent {
            draft.parent_id = Some(parent.clone());
        }
        if let Some(description) = &self.description {
            draft.description = Some(description.clone());
        }
        draft
    }
}

fn render_updated_pretty(category: &Category, w: &mut dyn Write) -> io::Result<()> {
    write!(w, "✓ Updated {} [{}]", category.name, category.id)?;
    match category.parent() {
        Some(parent) => writeln!(w, " (parent {parent})"),
        None => writeln!(w, " (top level)"),
    }
}

/// Execute `vt update`.
///
/// # Errors
///
/// Fails with `E4001` if the id is unknown, `E2001`-`E2003` if the draft is
/// invalid (nothing is written), or a store error code.
pub async fn run_update(args: &UpdateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;
    controller.refresh().await?;

    let records = controller.records();
    let current = records.iter().find(|c| c.id == args.id).ok_or_else(|| {
        coded(
            ErrorCode::CategoryNotFound,
            format!("category '{}' not found", args.id),
        )
    })?;

    let updated = controller.update(&args.id, args.draft_for(current)).await?;

    render_mode(output, &updated, render_category_text, render_updated_pretty)
}
