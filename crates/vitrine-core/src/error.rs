use std::fmt;

use crate::store::StoreError;
use crate::validate::ValidationError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidName,
    SelfParent,
    CycleDetected,
    CategoryNotFound,
    StoreRejected,
    StoreUnavailable,
    StaleView,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidName => "E2001",
            Self::SelfParent => "E2002",
            Self::CycleDetected => "E2003",
            Self::CategoryNotFound => "E4001",
            Self::StoreRejected => "E4002",
            Self::StoreUnavailable => "E4003",
            Self::StaleView => "E4004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidName => "Invalid category name",
            Self::SelfParent => "Category cannot be its own parent",
            Self::CycleDetected => "Cycle would be created",
            Self::CategoryNotFound => "Category not found",
            Self::StoreRejected => "Category store rejected the request",
            Self::StoreUnavailable => "Category store unavailable",
            Self::StaleView => "Write succeeded but the tree could not be refreshed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `vt init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .vitrine/config.toml and retry."),
            Self::InvalidName => Some("Provide a non-empty name without control characters."),
            Self::SelfParent => Some("Pick a different parent, or move the category to the root."),
            Self::CycleDetected => {
                Some("Pick a parent outside the category's own subtree.")
            }
            Self::CategoryNotFound => Some("Run `vt tree` to list current category ids."),
            Self::StoreRejected => None,
            Self::StoreUnavailable => Some("Check the store location and retry."),
            Self::StaleView => Some("Run `vt tree` to reload the hierarchy."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the hierarchy controller.
///
/// [`HierarchyError::Validation`] is raised before any store call and never
/// reaches the network. [`HierarchyError::Store`] means the store rejected or
/// failed the operation; the displayed forest is untouched.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Local precondition failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The category store failed the operation.
    #[error("category store error: {0}")]
    Store(#[from] StoreError),

    /// The store confirmed the write but the follow-up fetch failed.
    ///
    /// The forest still shows the last known-good state, which predates the
    /// write.
    #[error("write confirmed but refresh failed: {0}")]
    RefreshAfterWrite(StoreError),
}

impl HierarchyError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code,
            Self::Store(e) => e.error_code(),
            Self::RefreshAfterWrite(_) => ErrorCode::StaleView,
        }
    }

    /// `true` for local precondition failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Remediation text suitable for a `suggestion:` line.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::Validation(e) => e.suggestion.clone(),
            other => other
                .error_code()
                .hint()
                .unwrap_or("Retry the operation.")
                .to_string(),
        }
    }
}
