//! `vt create`: add a category.

use anyhow::Result;
use clap::Args;
use std::io::{self, Write};
use std::path::Path;
use vitrine_core::{Category, NewCategory};

use super::Project;
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Category name (trimmed; must not be blank).
    #[arg(long, short = 'n')]
    pub name: String,

    /// Parent category id. Omit for a top-level category.
    #[arg(long, short = 'p', value_name = "ID")]
    pub parent: Option<String>,

    /// Free-form description.
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

impl CreateArgs {
    fn to_new_category(&self) -> NewCategory {
        NewCategory {
            name: self.name.clone(),
            parent_id: self.parent.clone(),
            description: self.description.clone(),
        }
    }
}

pub(crate) fn render_category_text(category: &Category, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}",
        category.id,
        category.name,
        category.parent().unwrap_or("")
    )
}

fn render_created_pretty(category: &Category, w: &mut dyn Write) -> io::Result<()> {
    write!(w, "✓ Created {} [{}]", category.name, category.id)?;
    match category.parent() {
        Some(parent) => writeln!(w, " under {parent}"),
        None => writeln!(w, " at the top level"),
    }
}

/// Execute `vt create`.
///
/// # Errors
///
/// Fails with `E2001` for a blank or oversized name, or with a store error
/// code if the write or the follow-up reload fails.
pub async fn run_create(args: &CreateArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;

    let created = controller.create(args.to_new_category()).await?;

    render_mode(output, &created, render_category_text, render_created_pretty)
}
