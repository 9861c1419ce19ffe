//! vitrine-core library.
//!
//! Turns the flat, parent-referencing category list a backend returns into a
//! navigable forest, tracks which subtrees are open, and orchestrates
//! validated create/update/delete calls against a [`store::CategoryStore`].
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in the library, `anyhow::Result` at
//!   the edges (config loading, the CLI).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod controller;
pub mod error;
pub mod expansion;
pub mod model;
pub mod store;
pub mod tree;
pub mod validate;

pub use controller::{DeleteOutcome, HierarchyController, RefreshOutcome};
pub use error::{ErrorCode, HierarchyError};
pub use expansion::ExpansionState;
pub use model::category::{Category, CategoryDraft, CategoryPatch, NewCategory};
pub use tree::builder::{Forest, TreeNode, build_forest};
