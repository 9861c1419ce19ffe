//! Hierarchy controller scenarios: build, mutate, orphan promotion, stale
//! fetches and failure handling, all through the public API.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use vitrine_core::store::file::JsonFileStore;
use vitrine_core::store::memory::MemoryStore;
use vitrine_core::store::{CategoryStore, StoreError};
use vitrine_core::{
    Category, CategoryDraft, CategoryPatch, DeleteOutcome, ErrorCode, HierarchyController,
    HierarchyError, NewCategory, RefreshOutcome, TreeNode,
};

// ---------------------------------------------------------------------------
// Test stores
// ---------------------------------------------------------------------------

/// Wraps a store and counts every call that reaches it.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    writes: AtomicUsize,
    fail_lists: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingStore {
    fn seeded(records: Vec<Category>) -> Self {
        Self {
            inner: MemoryStore::with_records(records),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategoryStore for CountingStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("backend down"));
        }
        self.inner.list().await
    }

    async fn create(&self, input: NewCategory) -> Result<Category, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::invalid("server says no"));
        }
        self.inner.create(input).await
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Category, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::invalid("server says no"));
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::invalid("server says no"));
        }
        self.inner.delete(id).await
    }
}

/// A store whose `list` calls each wait for a response the test releases.
struct GatedStore {
    pending: Mutex<VecDeque<oneshot::Receiver<Result<Vec<Category>, StoreError>>>>,
    started: mpsc::UnboundedSender<usize>,
    count: AtomicUsize,
}

impl GatedStore {
    #[allow(clippy::type_complexity)]
    fn new(
        gates: usize,
    ) -> (
        Self,
        Vec<oneshot::Sender<Result<Vec<Category>, StoreError>>>,
        mpsc::UnboundedReceiver<usize>,
    ) {
        let mut senders = Vec::new();
        let mut receivers = VecDeque::new();
        for _ in 0..gates {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            receivers.push_back(rx);
        }
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let store = Self {
            pending: Mutex::new(receivers),
            started: started_tx,
            count: AtomicUsize::new(0),
        };
        (store, senders, started_rx)
    }
}

#[async_trait]
impl CategoryStore for GatedStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let rx = self
            .pending
            .lock()
            .expect("gate lock")
            .pop_front()
            .expect("test opened enough gates");
        let n = self.count.fetch_add(1, Ordering::SeqCst);
        self.started.send(n).expect("test listens for starts");
        rx.await.expect("gate released")
    }

    async fn create(&self, _input: NewCategory) -> Result<Category, StoreError> {
        Err(StoreError::unavailable("read-only"))
    }

    async fn update(&self, _id: &str, _patch: CategoryPatch) -> Result<Category, StoreError> {
        Err(StoreError::unavailable("read-only"))
    }

    async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable("read-only"))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn basic_rings() -> Vec<Category> {
    vec![
        Category::new("1", "Rings"),
        Category::new("2", "Gold Rings").with_parent("1"),
        Category::new("3", "Silver Rings").with_parent("1"),
    ]
}

fn root_names<S: CategoryStore>(controller: &HierarchyController<S>) -> Vec<String> {
    controller
        .forest()
        .roots()
        .iter()
        .map(|n| n.name().to_string())
        .collect()
}

fn child_names(node: &TreeNode) -> Vec<&str> {
    node.children.iter().map(TreeNode::name).collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn basic_tree_scenario() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");

    let forest = controller.forest();
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.roots()[0].name(), "Rings");
    assert_eq!(
        child_names(&forest.roots()[0]),
        vec!["Gold Rings", "Silver Rings"]
    );
}

#[tokio::test]
async fn orphan_scenario() {
    let controller = HierarchyController::new(MemoryStore::with_records(vec![
        Category::new("2", "Gold Rings").with_parent("1"),
    ]));
    let outcome = controller.refresh().await.expect("refresh");

    assert_eq!(root_names(&controller), vec!["Gold Rings"]);
    match outcome {
        RefreshOutcome::Applied { report, .. } => assert_eq!(report.orphans, vec!["2"]),
        other => panic!("expected applied refresh, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_leaves_orphaned_children_as_roots() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");

    let outcome = controller.delete("1", true).await.expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deleted);

    // The store has not cleared the dangling parentId.
    let records = controller.records();
    assert!(records.iter().all(|c| c.parent_id.as_deref() == Some("1")));
    assert_eq!(root_names(&controller), vec!["Gold Rings", "Silver Rings"]);
}

#[tokio::test]
async fn reject_self_parent_without_store_call() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");
    let before = controller.forest();
    let calls_before = store.calls();

    let err = controller
        .update("1", CategoryDraft::new("Rings").under("1"))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.error_code(), ErrorCode::SelfParent);
    assert!(err.to_string().contains("cannot be its own parent"));
    assert_eq!(store.calls(), calls_before, "no network call issued");
    assert_eq!(*controller.forest(), *before, "forest unchanged");
}

#[tokio::test]
async fn reject_move_under_own_descendant() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");

    let err = controller
        .update("1", CategoryDraft::new("Rings").under("2"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::CycleDetected);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn blank_name_never_reaches_store() {
    let store = Arc::new(CountingStore::default());
    let controller = HierarchyController::new(Arc::clone(&store));

    for name in ["", "   "] {
        let err = controller.create(NewCategory::new(name)).await.unwrap_err();
        assert!(matches!(err, HierarchyError::Validation(_)));
    }
    let err = controller
        .update("1", CategoryDraft::new(" \t "))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn create_then_rebuild_shows_new_child() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");

    let created = controller
        .create(NewCategory::new("Platinum Rings").under("1"))
        .await
        .expect("create");

    let forest = controller.forest();
    assert_eq!(
        child_names(&forest.roots()[0]),
        vec!["Gold Rings", "Silver Rings", "Platinum Rings"]
    );
    assert!(!controller.is_expanded(&created.id));
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn update_moves_category_to_root() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");

    let updated = controller
        .update("3", CategoryDraft::new("Silver").with_description("925"))
        .await
        .expect("update");
    assert!(updated.is_root());
    assert_eq!(root_names(&controller), vec!["Rings", "Silver"]);
    let silver = controller.forest().find("3").cloned().expect("still present");
    assert_eq!(silver.category.description.as_deref(), Some("925"));
}

#[tokio::test]
async fn unconfirmed_delete_is_a_no_op() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");
    let calls_before = store.calls();

    let outcome = controller.delete("1", false).await.expect("cancel");
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(store.calls(), calls_before);
    assert_eq!(controller.forest().len(), 3);
}

#[tokio::test]
async fn expansion_survives_rebuild() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");
    assert!(controller.toggle_expand("1"));

    controller
        .create(NewCategory::new("Bracelets"))
        .await
        .expect("create");

    assert!(controller.is_expanded("1"));
    let rows = controller.visible_rows();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn deleted_category_stays_in_expansion_set() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");
    controller.toggle_expand("1");

    controller.delete("1", true).await.expect("delete");

    assert!(controller.is_expanded("1"));
    assert_eq!(controller.visible_rows().len(), 2);
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_rejection_leaves_forest_untouched() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");
    let before = controller.forest();

    store.fail_writes.store(true, Ordering::SeqCst);
    let err = controller
        .create(NewCategory::new("Anklets"))
        .await
        .unwrap_err();

    match &err {
        HierarchyError::Store(e) => assert_eq!(e.status(), Some(422)),
        other => panic!("expected store error, got {other:?}"),
    }
    assert!(Arc::ptr_eq(&before, &controller.forest()), "no rebuild happened");
}

#[tokio::test]
async fn delete_of_vanished_id_surfaces_not_found() {
    let controller = HierarchyController::new(MemoryStore::with_records(basic_rings()));
    controller.refresh().await.expect("refresh");

    let err = controller.delete("99", true).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::CategoryNotFound);
    assert_eq!(controller.forest().len(), 3);
}

#[tokio::test]
async fn failed_fetch_keeps_last_known_good_forest() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");

    store.fail_lists.store(true, Ordering::SeqCst);
    let err = controller.refresh().await.unwrap_err();
    assert!(matches!(err, HierarchyError::Store(StoreError::Unavailable(_))));
    assert_eq!(controller.forest().len(), 3);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn write_confirmed_but_refresh_failed() {
    let store = Arc::new(CountingStore::seeded(basic_rings()));
    let controller = HierarchyController::new(Arc::clone(&store));
    controller.refresh().await.expect("refresh");

    store.fail_lists.store(true, Ordering::SeqCst);
    let err = controller
        .create(NewCategory::new("Anklets"))
        .await
        .unwrap_err();

    assert!(matches!(err, HierarchyError::RefreshAfterWrite(_)));
    assert_eq!(err.error_code(), ErrorCode::StaleView);
    // The write landed; the displayed forest is still the pre-write one.
    assert_eq!(store.inner.snapshot().await.len(), 4);
    assert_eq!(controller.forest().len(), 3);
}

#[tokio::test]
async fn file_store_never_reuses_a_deleted_id() {
    let dir = TempDir::new().expect("tempdir");
    let controller =
        HierarchyController::new(JsonFileStore::new(dir.path().join("categories.json")));

    let rings = controller
        .create(NewCategory::new("Rings"))
        .await
        .expect("create rings");
    let tmp = controller
        .create(NewCategory::new("Tmp"))
        .await
        .expect("create tmp");
    controller
        .update(
            &rings.id,
            CategoryDraft {
                name: rings.name.clone(),
                parent_id: Some(tmp.id.clone()),
                description: None,
            },
        )
        .await
        .expect("move rings under tmp");
    assert!(controller.toggle_expand(&tmp.id));

    controller.delete(&tmp.id, true).await.expect("delete tmp");
    let watches = controller
        .create(NewCategory::new("Watches"))
        .await
        .expect("create watches");

    assert_ne!(watches.id, tmp.id);
    assert!(!controller.is_expanded(&watches.id));
    assert_eq!(root_names(&controller), vec!["Rings", "Watches"]);
    let forest = controller.forest();
    assert!(forest.roots().iter().all(|n| !n.has_children()));
}

// ---------------------------------------------------------------------------
// Stale responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_early_fetch_does_not_overwrite_newer_one() {
    let (store, mut gates, mut started) = GatedStore::new(2);
    let controller = Arc::new(HierarchyController::new(store));

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.refresh().await }
    });
    assert_eq!(started.recv().await, Some(0));

    let second = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.refresh().await }
    });
    assert_eq!(started.recv().await, Some(1));
    assert!(controller.is_loading());

    // Expansion stays usable while both fetches are in flight.
    assert!(controller.toggle_expand("1"));

    let first_gate = gates.remove(0);
    let second_gate = gates.remove(0);

    second_gate
        .send(Ok(vec![Category::new("1", "Rings (new)")]))
        .expect("release second");
    let second = second.await.expect("join").expect("second refresh");
    assert!(second.is_applied());
    assert!(!controller.is_loading());

    first_gate
        .send(Ok(vec![Category::new("1", "Rings (old)")]))
        .expect("release first");
    let first = first.await.expect("join").expect("first refresh");
    assert_eq!(first, RefreshOutcome::Superseded { seq: 1, latest: 2 });

    assert_eq!(root_names(&controller), vec!["Rings (new)"]);
    assert!(controller.is_expanded("1"));
}

#[tokio::test]
async fn stale_failure_is_discarded_too() {
    let (store, mut gates, mut started) = GatedStore::new(2);
    let controller = Arc::new(HierarchyController::new(store));

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.refresh().await }
    });
    assert_eq!(started.recv().await, Some(0));
    let second = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.refresh().await }
    });
    assert_eq!(started.recv().await, Some(1));

    let first_gate = gates.remove(0);
    let second_gate = gates.remove(0);

    first_gate
        .send(Err(StoreError::unavailable("timeout")))
        .expect("release first");
    let first = first.await.expect("join").expect("stale failure is not surfaced");
    assert!(!first.is_applied());
    assert!(controller.is_loading(), "latest fetch still pending");

    second_gate.send(Ok(basic_rings())).expect("release second");
    second.await.expect("join").expect("second refresh");
    assert_eq!(controller.forest().len(), 3);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn abandoned_fetch_does_not_leave_loading_set() {
    let (store, mut gates, mut started) = GatedStore::new(2);
    let controller = HierarchyController::new(store);

    let timed_out = tokio::time::timeout(Duration::from_millis(10), controller.refresh()).await;
    assert!(timed_out.is_err());
    assert_eq!(started.recv().await, Some(0));
    assert!(!controller.is_loading());
    assert!(controller.forest().is_empty());

    // The next fetch still applies normally.
    let _abandoned_gate = gates.remove(0);
    gates
        .remove(0)
        .send(Ok(basic_rings()))
        .expect("release second");
    let outcome = controller.refresh().await.expect("refresh");
    assert!(outcome.is_applied());
    assert!(!controller.is_loading());
    assert_eq!(controller.forest().len(), 3);
}
