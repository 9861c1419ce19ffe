//! The category store boundary.
//!
//! The store owns canonical state. The hierarchy controller only ever sees it
//! through the four operations of [`CategoryStore`]; transport, retries and
//! authentication live behind the trait.
//!
//! ## Adapters
//!
//! - [`memory::MemoryStore`]: in-process, used by tests and embedders.
//! - [`file::JsonFileStore`]: a JSON array on disk, used by the CLI.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;

use crate::error::ErrorCode;
use crate::model::category::{Category, CategoryPatch, NewCategory};

pub mod file;
pub mod memory;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A failed store operation.
///
/// Carries a human-readable message and, where one applies, an HTTP-style
/// status via [`StoreError::status`]. Callers treat every variant the same
/// way; the distinction exists for display and exit codes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The id does not name a stored category.
    #[error("category not found: '{0}'")]
    NotFound(String),

    /// The store refused the request (server-side validation and the like).
    #[error("rejected by store ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store could not be reached or is not ready.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error reading or writing the backing file.
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored data could not be decoded.
    #[error("malformed store data: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: 422,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// HTTP-style status, if the failure maps to one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Rejected { status, .. } => Some(*status),
            Self::Unavailable(_) => Some(503),
            Self::Io(_) | Self::Malformed(_) => None,
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::CategoryNotFound,
            Self::Rejected { .. } => ErrorCode::StoreRejected,
            Self::Unavailable(_) | Self::Io(_) | Self::Malformed(_) => {
                ErrorCode::StoreUnavailable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Remote collection of category records.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// The full flat collection. No pagination.
    async fn list(&self) -> Result<Vec<Category>, StoreError>;

    async fn create(&self, input: NewCategory) -> Result<Category, StoreError>;

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category, StoreError>;

    /// Remove one record. Children are left pointing at the removed id.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: CategoryStore + ?Sized> CategoryStore for Arc<S> {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        (**self).list().await
    }

    async fn create(&self, input: NewCategory) -> Result<Category, StoreError> {
        (**self).create(input).await
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// Server-side record checks shared by the bundled adapters.
///
/// These mirror what a backend enforces independently of the controller's
/// own validation.
pub(crate) fn check_record(category: &Category) -> Result<(), StoreError> {
    if category.name.trim().is_empty() {
        return Err(StoreError::invalid("name must not be empty"));
    }
    if category.has_self_parent() {
        return Err(StoreError::invalid("a category cannot be its own parent"));
    }
    Ok(())
}
