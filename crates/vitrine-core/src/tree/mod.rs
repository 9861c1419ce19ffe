//! Hierarchy construction and queries.
//!
//! ## Submodules
//!
//! - [`builder`]: flat list → [`Forest`](builder::Forest), with the orphan,
//!   self-parent and duplicate rules.
//! - [`cycles`]: promotion of one member per parent loop.
//! - [`query`]: paths, subtrees, parent candidates and visible rows.

pub mod builder;
pub mod cycles;
pub mod query;
