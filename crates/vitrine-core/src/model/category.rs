use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A category record as owned by the category store.
///
/// Field names follow the backend's camelCase JSON (`parentId`). A missing
/// `parentId` and an explicit `null` both mean root level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `true` when the record carries no parent reference at all.
    ///
    /// Orphans (a `parent_id` that resolves to nothing) are *not* roots by
    /// this definition; they only become roots once the tree is built.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.as_deref().is_none_or(str::is_empty)
    }

    /// `true` when the record names itself as its parent.
    #[must_use]
    pub fn has_self_parent(&self) -> bool {
        self.parent_id.as_deref() == Some(self.id.as_str())
    }

    /// The parent reference, treating an empty string as absent.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update sent to the store.
///
/// Each field is tri-state: the outer `None` leaves the stored value alone,
/// `Some(None)` clears it, `Some(Some(v))` sets it. On the wire a cleared
/// field is an explicit `null` and an untouched one is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub parent_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub description: Option<Option<String>>,
}

impl CategoryPatch {
    /// Apply this patch to a stored record in place.
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name.clone_from(name);
        }
        if let Some(parent_id) = &self.parent_id {
            category.parent_id.clone_from(parent_id);
        }
        if let Some(description) = &self.description {
            category.description.clone_from(description);
        }
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none() && self.description.is_none()
    }
}

/// The full set of editable fields a caller submits for an update.
///
/// Unlike [`CategoryPatch`] every field is explicit: `parent_id: None` moves
/// the category to root level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Start a draft from the stored record, as an edit form would.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            parent_id: category.parent_id.clone(),
            description: category.description.clone(),
        }
    }

    /// Convert into a patch that overwrites every editable field.
    #[must_use]
    pub fn into_patch(self) -> CategoryPatch {
        CategoryPatch {
            name: Some(self.name),
            parent_id: Some(self.parent_id),
            description: Some(self.description),
        }
    }
}

/// Trim a free-text description, mapping blank input to `None`.
#[must_use]
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Map an empty parent reference to `None`.
#[must_use]
pub fn normalize_parent(parent_id: Option<String>) -> Option<String> {
    parent_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
