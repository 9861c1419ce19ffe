//! Hierarchy controller: fetch, build, mutate, expand.
//!
//! # Overview
//!
//! The controller holds the last known-good [`Forest`] as an immutable
//! snapshot and swaps it wholesale after every confirmed fetch. Mutations go
//! to the [`CategoryStore`] first; the forest only changes once the follow-up
//! fetch lands. Nothing is edited optimistically.
//!
//! # Stale responses
//!
//! Every fetch is tagged with a monotonically increasing sequence number. A
//! response is applied only if its tag is still the latest one issued, so a
//! slow early fetch can never overwrite the result of a later one.
//!
//! # Locking
//!
//! State sits behind `std::sync::Mutex`es that are never held across an
//! `.await`. Expansion toggles therefore stay responsive while a store call
//! is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::error::HierarchyError;
use crate::expansion::ExpansionState;
use crate::model::category::{
    Category, CategoryDraft, NewCategory, normalize_description, normalize_parent,
};
use crate::store::CategoryStore;
use crate::tree::builder::{BuildReport, Forest, TreeNode, build_forest_with_report};
use crate::tree::query::{self, VisibleRow};
use crate::validate::{self, DEFAULT_MAX_NAME_LEN};

/// Callback invoked when a node is selected.
pub type SelectCallback = Box<dyn Fn(&TreeNode) + Send + Sync>;

/// Result of a [`HierarchyController::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was the latest issued and is now displayed.
    Applied { records: usize, report: BuildReport },
    /// A newer fetch was issued while this one was in flight; its response
    /// was discarded.
    Superseded { seq: u64, latest: u64 },
}

impl RefreshOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a [`HierarchyController::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The caller did not confirm; nothing was sent to the store.
    Cancelled,
}

#[derive(Debug, Default)]
struct View {
    forest: Arc<Forest>,
    records: Arc<Vec<Category>>,
    /// Sequence number of the last fetch that settled while still latest.
    settled: u64,
}

/// Settles a fetch whose future was dropped before the store answered.
///
/// Only the latest issued fetch is settled this way; the forest is left
/// untouched.
struct InFlight<'a> {
    view: &'a Mutex<View>,
    issued: &'a AtomicU64,
    seq: u64,
    landed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.landed {
            return;
        }
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        if self.issued.load(Ordering::SeqCst) == self.seq && view.settled < self.seq {
            debug!(seq = self.seq, "category fetch abandoned");
            view.settled = self.seq;
        }
    }
}

pub struct HierarchyController<S> {
    store: S,
    max_name_len: usize,
    view: Mutex<View>,
    expansion: Mutex<ExpansionState>,
    issued: AtomicU64,
    on_select: Option<SelectCallback>,
}

impl<S: CategoryStore> HierarchyController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            view: Mutex::new(View::default()),
            expansion: Mutex::new(ExpansionState::new()),
            issued: AtomicU64::new(0),
            on_select: None,
        }
    }

    #[must_use]
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Start from a previously persisted expansion set.
    #[must_use]
    pub fn with_expansion(self, expansion: ExpansionState) -> Self {
        *self.lock_expansion() = expansion;
        self
    }

    #[must_use]
    pub fn on_select(mut self, callback: impl Fn(&TreeNode) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Presentation surface
    // -----------------------------------------------------------------------

    /// The current forest snapshot.
    pub fn forest(&self) -> Arc<Forest> {
        Arc::clone(&self.lock_view().forest)
    }

    /// The flat list the current forest was built from.
    pub fn records(&self) -> Arc<Vec<Category>> {
        Arc::clone(&self.lock_view().records)
    }

    /// `true` while the most recently issued fetch has not settled.
    pub fn is_loading(&self) -> bool {
        let settled = self.lock_view().settled;
        self.issued.load(Ordering::SeqCst) > settled
    }

    /// Rows a tree view should draw right now.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let forest = self.forest();
        query::visible_rows(&forest, &self.lock_expansion())
    }

    /// Categories that may become the parent of `editing`.
    ///
    /// Excludes `editing` and its descendants. The controller still
    /// re-validates whatever parent the caller finally submits.
    pub fn parent_candidates(&self, editing: Option<&str>) -> Vec<(usize, Category)> {
        let forest = self.forest();
        query::parent_candidates(&forest, editing)
            .into_iter()
            .map(|(depth, category)| (depth, category.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Expansion
    // -----------------------------------------------------------------------

    /// Flip a node open/closed. Returns the new state.
    pub fn toggle_expand(&self, id: &str) -> bool {
        self.lock_expansion().toggle(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.lock_expansion().is_open(id)
    }

    /// Snapshot of the expansion set, e.g. for persisting between sessions.
    pub fn expansion(&self) -> ExpansionState {
        self.lock_expansion().clone()
    }

    pub fn expand_all(&self) {
        let forest = self.forest();
        self.lock_expansion().expand_all(&forest);
    }

    pub fn collapse_all(&self) {
        self.lock_expansion().collapse_all();
    }

    /// Open every ancestor of `id`. Returns `false` if `id` is not displayed.
    pub fn reveal(&self, id: &str) -> bool {
        let forest = self.forest();
        self.lock_expansion().reveal(&forest, id)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Forward a selection to the `on_select` callback. No state changes.
    pub fn select(&self, node: &TreeNode) {
        if let Some(callback) = &self.on_select {
            callback(node);
        }
    }

    /// Select by id. Returns `false` if `id` is not in the current forest.
    pub fn select_id(&self, id: &str) -> bool {
        let forest = self.forest();
        match forest.find(id) {
            Some(node) => {
                self.select(node);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    /// Fetch the flat list and rebuild the forest.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::Store`] if the latest fetch fails; the
    /// previous forest stays in place. Failures of superseded fetches are
    /// discarded along with their data.
    pub async fn refresh(&self) -> Result<RefreshOutcome, HierarchyError> {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "fetching category list");

        let mut in_flight = InFlight {
            view: &self.view,
            issued: &self.issued,
            seq,
            landed: false,
        };
        let result = self.store.list().await;
        in_flight.landed = true;

        let mut view = self.lock_view();
        let latest = self.issued.load(Ordering::SeqCst);
        if seq != latest {
            debug!(seq, latest, "discarding superseded category list");
            return Ok(RefreshOutcome::Superseded { seq, latest });
        }
        view.settled = seq;

        let records = result?;
        let count = records.len();
        let (forest, report) = build_forest_with_report(records.clone());
        view.forest = Arc::new(forest);
        view.records = Arc::new(records);
        drop(view);

        debug!(seq, records = count, "applied category list");
        Ok(RefreshOutcome::Applied {
            records: count,
            report,
        })
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a category, then rebuild from the store.
    ///
    /// The new category is neither expanded nor selected.
    ///
    /// # Errors
    ///
    /// [`HierarchyError::Validation`] for a blank or oversized name (no store
    /// call), [`HierarchyError::Store`] if the store rejects the create, or
    /// [`HierarchyError::RefreshAfterWrite`] if the follow-up fetch fails.
    pub async fn create(&self, input: NewCategory) -> Result<Category, HierarchyError> {
        validate::validate_name(&input.name, self.max_name_len)?;
        let input = NewCategory {
            name: input.name.trim().to_string(),
            parent_id: normalize_parent(input.parent_id),
            description: normalize_description(input.description),
        };

        let created = self.store.create(input).await?;
        info!(category = %created.id, name = %created.name, "created category");

        self.refresh_after_write().await?;
        Ok(created)
    }

    /// Overwrite a category's name, parent and description.
    ///
    /// # Errors
    ///
    /// [`HierarchyError::Validation`] if the name is blank, if `parent_id`
    /// equals `id`, or if the new parent lies inside `id`'s own subtree in
    /// the current snapshot; none of these reach the store.
    /// [`HierarchyError::Store`] / [`HierarchyError::RefreshAfterWrite`] as
    /// for [`Self::create`].
    pub async fn update(&self, id: &str, draft: CategoryDraft) -> Result<Category, HierarchyError> {
        validate::validate_name(&draft.name, self.max_name_len)?;
        let draft = CategoryDraft {
            name: draft.name.trim().to_string(),
            parent_id: normalize_parent(draft.parent_id),
            description: normalize_description(draft.description),
        };
        validate::validate_reparent(&self.records(), id, draft.parent_id.as_deref())?;

        let updated = self.store.update(id, draft.into_patch()).await?;
        info!(category = %updated.id, name = %updated.name, "updated category");

        self.refresh_after_write().await?;
        Ok(updated)
    }

    /// Delete one category. Children are not touched; on the next rebuild
    /// they surface as roots until the store clears their parent.
    ///
    /// `confirmed` is the caller's already-made decision; without it nothing
    /// is sent.
    ///
    /// # Errors
    ///
    /// [`HierarchyError::Store`] / [`HierarchyError::RefreshAfterWrite`] as
    /// for [`Self::create`].
    pub async fn delete(&self, id: &str, confirmed: bool) -> Result<DeleteOutcome, HierarchyError> {
        if !confirmed {
            debug!(category = %id, "delete not confirmed; skipping");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.store.delete(id).await?;
        info!(category = %id, "deleted category");

        self.refresh_after_write().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn refresh_after_write(&self) -> Result<(), HierarchyError> {
        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(HierarchyError::Store(e)) => Err(HierarchyError::RefreshAfterWrite(e)),
            Err(other) => Err(other),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock_view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_expansion(&self) -> MutexGuard<'_, ExpansionState> {
        self.expansion.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
