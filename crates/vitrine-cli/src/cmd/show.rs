//! `vt show`: details for one category.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use vitrine_core::tree::query;
use vitrine_core::{Category, ErrorCode, Forest};

use super::{Project, coded};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Category id.
    pub id: String,
}

/// A child reference in `vt show` output.
#[derive(Debug, Serialize)]
pub struct ChildRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowItem {
    #[serde(flatten)]
    pub category: Category,
    pub depth: usize,
    /// Names from the root down to the category itself.
    pub path: Vec<String>,
    pub children: Vec<ChildRef>,
    pub descendants: usize,
    pub expanded: bool,
}

impl ShowItem {
    /// Look `id` up in `forest`. `None` if it is not displayed.
    pub fn build(forest: &Forest, id: &str, expanded: bool) -> Option<Self> {
        let path = query::path_to(forest, id)?;
        let node = *path.last()?;
        Some(Self {
            category: node.category.clone(),
            depth: path.len() - 1,
            path: path.iter().map(|n| n.name().to_string()).collect(),
            children: node
                .children
                .iter()
                .map(|c| ChildRef {
                    id: c.id().to_string(),
                    name: c.name().to_string(),
                })
                .collect(),
            descendants: node.descendant_count(),
            expanded,
        })
    }
}

fn render_show_pretty(item: &ShowItem, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} [{}]", item.category.name, item.category.id))?;
    pretty_kv(w, "Path", item.path.join(" › "))?;
    pretty_kv(w, "Parent", item.category.parent().unwrap_or("(root)"))?;
    if let Some(description) = &item.category.description {
        pretty_kv(w, "Description", description)?;
    }
    pretty_kv(w, "Depth", item.depth.to_string())?;
    pretty_kv(w, "Expanded", if item.expanded { "yes" } else { "no" })?;
    pretty_kv(
        w,
        "Children",
        format!("{} ({} descendants)", item.children.len(), item.descendants),
    )?;
    for child in &item.children {
        writeln!(w, "  - {} [{}]", child.name, child.id)?;
    }
    Ok(())
}

fn render_show_text(item: &ShowItem, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id\t{}", item.category.id)?;
    writeln!(w, "name\t{}", item.category.name)?;
    writeln!(w, "parent\t{}", item.category.parent().unwrap_or(""))?;
    writeln!(
        w,
        "description\t{}",
        item.category.description.as_deref().unwrap_or("")
    )?;
    writeln!(w, "path\t{}", item.path.join("/"))?;
    writeln!(w, "depth\t{}", item.depth)?;
    writeln!(w, "children\t{}", item.children.len())?;
    writeln!(w, "descendants\t{}", item.descendants)
}

/// Execute `vt show`.
///
/// # Errors
///
/// Fails with `E4001` if the id is not in the current hierarchy.
pub async fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let controller = project.controller()?;
    controller.refresh().await?;

    let forest = controller.forest();
    let item = ShowItem::build(&forest, &args.id, controller.is_expanded(&args.id))
        .ok_or_else(|| {
            coded(
                ErrorCode::CategoryNotFound,
                format!("category '{}' not found", args.id),
            )
        })?;

    render_mode(output, &item, render_show_text, render_show_pretty)
}
