//! `vt delete`: remove one category.
//!
//! Children are not deleted. They stay in the store pointing at the removed
//! id and show up at the top level from then on.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use vitrine_core::{DeleteOutcome, ErrorCode};

use super::{Project, coded};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Category id.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
    /// Direct children that are now top-level.
    pub orphaned: Vec<String>,
}

/// Ask on the terminal. Without a terminal nothing is confirmed.
fn confirm_delete(id: &str, name: &str, children: usize) -> Result<bool> {
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        return Ok(false);
    }

    if children > 0 {
        eprintln!("{children} direct children will move to the top level.");
    }
    eprint!("Delete {name} [{id}]? [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn render_delete_text(result: &DeleteResult, w: &mut dyn Write) -> io::Result<()> {
    let status = if result.deleted { "deleted" } else { "cancelled" };
    writeln!(w, "{}\t{status}", result.id)
}

fn render_delete_pretty(result: &DeleteResult, w: &mut dyn Write) -> io::Result<()> {
    if !result.deleted {
        writeln!(w, "Delete of [{}] cancelled; nothing changed.", result.id)?;
        return writeln!(w, "  Pass --force to delete without a prompt.");
    }
    writeln!(w, "✓ Deleted [{}]", result.id)?;
    if !result.orphaned.is_empty() {
        writeln!(w, "  Now top-level: {}", result.orphaned.join(", "))?;
    }
    Ok(())
}

/// Execute `vt delete`.
///
/// # Errors
///
/// Fails with `E4001` if the id is not in the current hierarchy, or a store
/// error code if the delete or the follow-up reload fails.
pub async fn run_delete(args: &DeleteArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;
    controller.refresh().await?;

    let forest = controller.forest();
    let node = forest.find(&args.id).ok_or_else(|| {
        coded(
            ErrorCode::CategoryNotFound,
            format!("category '{}' not found", args.id),
        )
    })?;
    let orphaned: Vec<String> = node.children.iter().map(|c| c.id().to_string()).collect();

    let confirmed = args.force || confirm_delete(&args.id, node.name(), orphaned.len())?;
    let outcome = controller.delete(&args.id, confirmed).await?;

    let deleted = outcome == DeleteOutcome::Deleted;
    let result = DeleteResult {
        id: args.id.clone(),
        deleted,
        orphaned: if deleted { orphaned } else { Vec::new() },
    };
    render_mode(output, &result, render_delete_text, render_delete_pretty)
}
