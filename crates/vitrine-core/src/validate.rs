//! Local precondition checks run before any store call.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ErrorCode;
use crate::model::category::Category;

pub const DEFAULT_MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: ErrorCode,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: ErrorCode,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}': {}", self.field, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_name(s: &str, max_len: usize) -> Result<(), ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "name",
            s,
            "must not be empty",
            "provide a non-empty category name",
            ErrorCode::InvalidName,
        ));
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::new(
            "name",
            s,
            format!("must be <= {max_len} characters"),
            "shorten the name",
            ErrorCode::InvalidName,
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "name",
            s,
            "must not contain control characters",
            "remove control characters from the name",
            ErrorCode::InvalidName,
        ));
    }
    Ok(())
}

/// Reject a category that names itself as parent.
pub fn validate_parent(id: &str, parent_id: Option<&str>) -> Result<(), ValidationError> {
    if parent_id == Some(id) {
        return Err(ValidationError::new(
            "parent",
            id,
            "cannot be its own parent",
            "choose another parent or leave the parent empty",
            ErrorCode::SelfParent,
        ));
    }
    Ok(())
}

/// Reject moving `id` beneath one of its own descendants.
///
/// Walks the ancestor chain of `parent_id` through `records`. Chains that
/// leave the list (orphans) or loop without passing `id` are accepted; the
/// tree builder already copes with both.
pub fn validate_reparent(
    records: &[Category],
    id: &str,
    parent_id: Option<&str>,
) -> Result<(), ValidationError> {
    validate_parent(id, parent_id)?;
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    let parent_of: HashMap<&str, Option<&str>> = records
        .iter()
        .rev()
        .map(|c| (c.id.as_str(), c.parent()))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(ancestor) = current {
        if ancestor == id {
            return Err(ValidationError::new(
                "parent",
                parent_id,
                format!("moving '{id}' under '{parent_id}' would create a cycle"),
                "choose a parent outside this category's subtree",
                ErrorCode::CycleDetected,
            ));
        }
        if !visited.insert(ancestor) {
            break; // pre-existing loop that does not involve `id`
        }
        current = parent_of.get(ancestor).copied().flatten();
    }
    Ok(())
}
