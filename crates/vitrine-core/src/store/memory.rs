//! In-process category store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{CategoryStore, StoreError, check_record};
use crate::model::category::{Category, CategoryPatch, NewCategory};

/// A category store held in memory.
///
/// Ids are sequential decimal strings. Deleting a record leaves any children
/// pointing at the removed id, the way a backend that does not cascade
/// behaves until it cleans up.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Category>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing flat list.
    ///
    /// New ids continue after the largest numeric id present.
    #[must_use]
    pub fn with_records(records: Vec<Category>) -> Self {
        let max_numeric = records
            .iter()
            .filter_map(|c| c.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            records: RwLock::new(records),
            next_id: AtomicU64::new(max_numeric),
        }
    }

    /// Copy of the current records, in storage order.
    pub async fn snapshot(&self) -> Vec<Category> {
        self.records.read().await.clone()
    }

    /// Replace a record wholesale, bypassing validation.
    ///
    /// Lets tests model a backend that changed underneath the controller.
    pub async fn put_raw(&self, category: Category) {
        let mut records = self.records.write().await;
        if let Some(existing) = records.iter_mut().find(|c| c.id == category.id) {
            *existing = category;
        } else {
            records.push(category);
        }
    }

    fn allocate_id(&self) -> Result<String, StoreError> {
        self.next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .ok()
            .and_then(|last| last.checked_add(1))
            .map(|id| id.to_string())
            .ok_or_else(|| StoreError::unavailable("category id space exhausted"))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.snapshot().await)
    }

    async fn create(&self, input: NewCategory) -> Result<Category, StoreError> {
        let mut category = Category {
            id: String::new(),
            name: input.name,
            parent_id: input.parent_id,
            description: input.description,
        };
        check_record(&category)?;
        category.id = self.allocate_id()?;
        self.records.write().await.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category, StoreError> {
        let mut records = self.records.write().await;
        let existing = records
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;

        let mut updated = existing.clone();
        patch.apply_to(&mut updated);
        check_record(&updated)?;
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let pos = records
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        records.remove(pos);
        Ok(())
    }
}
