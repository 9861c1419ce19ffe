//! Category store backed by a JSON file.
//!
//! The file holds the flat list exactly as a backend would return it: a JSON
//! array of `{id, name, parentId, description}` objects. Writes go to a
//! sibling temp file first and are renamed into place.
//!
//! Ids are `cat-<n>`. The highest `n` ever issued is kept in a sidecar
//! `.seq` file next to the list, so an id freed by a delete is never handed
//! out again.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CategoryStore, StoreError, check_record};
use crate::model::category::{Category, CategoryPatch, NewCategory};

const ID_PREFIX: &str = "cat-";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The id high-water file, e.g. `categories.seq` beside `categories.json`.
    #[must_use]
    pub fn seq_path(&self) -> PathBuf {
        self.path.with_extension("seq")
    }

    /// Write an empty list if the file does not exist yet.
    ///
    /// Returns `true` if a file was created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the parent directory or file cannot be
    /// created.
    pub async fn ensure_exists(&self) -> Result<bool, StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        self.save(&[]).await?;
        Ok(true)
    }

    async fn load(&self) -> Result<Vec<Category>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, records: &[Category]) -> Result<(), StoreError> {
        let mut body = serde_json::to_vec_pretty(records)?;
        body.push(b'\n');
        write_atomic(&self.path, &body).await?;
        debug!(path = %self.path.display(), records = records.len(), "saved category file");
        Ok(())
    }

    /// Highest id number recorded in the `.seq` file; 0 if there is none.
    async fn load_high_water(&self) -> Result<u64, StoreError> {
        let raw = match tokio::fs::read_to_string(self.seq_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(0);
        }
        Ok(serde_json::from_str(raw.trim())?)
    }

    /// Reserve the next id and persist the new high-water mark.
    ///
    /// Files written before the `.seq` file existed are covered by also
    /// looking at the ids already in `records`.
    async fn allocate_id(&self, records: &[Category]) -> Result<String, StoreError> {
        let last = self.load_high_water().await?.max(max_issued(records));
        let next = last
            .checked_add(1)
            .ok_or_else(|| StoreError::unavailable("category id space exhausted"))?;
        write_atomic(&self.seq_path(), format!("{next}\n").as_bytes()).await?;
        Ok(format!("{ID_PREFIX}{next}"))
    }
}

/// Largest `n` among the `cat-<n>` ids in `records`.
fn max_issued(records: &[Category]) -> u64 {
    records
        .iter()
        .filter_map(|c| c.id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Write `body` to a `<path>.tmp` sibling and rename it over `path`.
///
/// The temp file is removed again if either step fails.
async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = match tokio::fs::write(&tmp, body).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            debug!(path = %tmp.display(), error = %cleanup, "temp file not removed");
        }
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl CategoryStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.load().await
    }

    async fn create(&self, input: NewCategory) -> Result<Category, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let mut category = Category {
            id: String::new(),
            name: input.name,
            parent_id: input.parent_id,
            description: input.description,
        };
        check_record(&category)?;
        category.id = self.allocate_id(&records).await?;
        records.push(category.clone());
        self.save(&records).await?;
        Ok(category)
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let existing = records
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;

        let mut updated = existing.clone();
        patch.apply_to(&mut updated);
        check_record(&updated)?;
        *existing = updated.clone();
        self.save(&records).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|c| c.id != id);
        if records.len() == before {
            return Err(StoreError::not_found(id));
        }
        self.save(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("nested/categories.json"))
    }

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn ensure_exists_creates_once() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.ensure_exists().await.expect("ensure"));
        assert!(!store.ensure_exists().await.expect("ensure again"));
        let raw = std::fs::read_to_string(store.path()).expect("read");
        assert_eq!(raw.trim(), "[]");
    }

    #[tokio::test]
    async fn create_update_delete_round_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let rings = store.create(NewCategory::new("Rings")).await.expect("create");
        let gold = store
            .create(NewCategory::new("Gold").under(&rings.id))
            .await
            .expect("create child");
        assert_eq!(rings.id, "cat-1");
        assert_eq!(gold.id, "cat-2");

        let renamed = store
            .update(
                &gold.id,
                CategoryPatch {
                    name: Some("Gold Rings".into()),
                    ..CategoryPatch::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(renamed.parent_id.as_deref(), Some("cat-1"));

        // A second handle sees the same data.
        let reopened = JsonFileStore::new(store.path());
        let listed = reopened.list().await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].name, "Gold Rings");

        store.delete(&rings.id).await.expect("delete");
        let listed = store.list().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].parent_id.as_deref(), Some("cat-1"));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let err = store.delete("cat-9").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.path(), "{not json").expect("write");
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn max_issued_skips_foreign_ids() {
        let records = vec![
            Category::new("cat-3", "Rings"),
            Category::new("42", "Legacy"),
            Category::new("cat-x", "Odd"),
        ];
        assert_eq!(max_issued(&records), 3);
        assert_eq!(max_issued(&[]), 0);
    }

    #[tokio::test]
    async fn deleted_top_id_is_not_reissued() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let rings = store.create(NewCategory::new("Rings")).await.expect("create");
        let tmp = store.create(NewCategory::new("Tmp")).await.expect("create");
        assert_eq!(tmp.id, "cat-2");
        store.delete(&tmp.id).await.expect("delete");

        let watches = store.create(NewCategory::new("Watches")).await.expect("create");
        assert_eq!(watches.id, "cat-3");

        // A fresh handle reads the same high-water mark from disk.
        let reopened = JsonFileStore::new(store.path());
        reopened.delete(&watches.id).await.expect("delete");
        let next = reopened.create(NewCategory::new("Clocks")).await.expect("create");
        assert_eq!(next.id, "cat-4");
        assert_ne!(next.id, rings.id);
        assert_eq!(
            std::fs::read_to_string(store.seq_path()).expect("seq").trim(),
            "4"
        );
    }

    #[tokio::test]
    async fn ids_continue_after_a_list_written_without_seq_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.path(), r#"[{"id":"cat-7","name":"Rings"}]"#).expect("seed");

        let created = store.create(NewCategory::new("Gold")).await.expect("create");
        assert_eq!(created.id, "cat-8");
    }

    #[tokio::test]
    async fn rejected_create_does_not_consume_an_id() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.create(NewCategory::new("  ")).await.is_err());
        let created = store.create(NewCategory::new("Rings")).await.expect("create");
        assert_eq!(created.id, "cat-1");
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.seq_path(), format!("{}\n", u64::MAX)).expect("seed");

        let err = store.create(NewCategory::new("Rings")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("categories.json");
        std::fs::create_dir_all(target.join("occupied")).expect("block target");

        assert!(write_atomic(&target, b"[]\n").await.is_err());
        assert!(!dir.path().join("categories.json.tmp").exists());
    }
}
