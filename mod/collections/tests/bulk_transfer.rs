//! End-to-end scenarios for the bulk-transfer engine: submission, task
//! lifecycle, duplicate guarding, and failure isolation, driven against
//! the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use rolodex_collections::CollectionsModule;
use rolodex_collections::model::{Collection, Company};
use rolodex_collections::store::{CompanyStore, MemStore};
use rolodex_core::ServiceError;
use rolodex_tasks::model::TaskStatus;
use rolodex_tasks::registry::TaskRegistry;

async fn wait_terminal(registry: &TaskRegistry, task_id: &str) -> rolodex_tasks::model::Task {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let task = registry.get(task_id).unwrap();
            if task.status.is_terminal() {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("task did not reach a terminal state in time")
}

fn module(store: Arc<dyn CompanyStore>) -> (CollectionsModule, Arc<TaskRegistry>) {
    let registry = Arc::new(TaskRegistry::new());
    (
        CollectionsModule::new(store, Arc::clone(&registry)),
        registry,
    )
}

#[tokio::test]
async fn ten_thousand_member_bulk_transfer() {
    let store = Arc::new(MemStore::new(Duration::ZERO));
    let source = store.create_collection("My List").await;
    let target = store.create_collection("Liked Companies").await;
    let ids = store.seed_companies("Company", 10_000).await;
    store.insert_members(&source.id, &ids).await.unwrap();

    let (module, registry) = module(store.clone());
    let resp = module.submit_bulk(&target.id, &source.id).await.unwrap();
    assert_eq!(resp.estimated_count, 10_000);

    // Observe progress while the task runs: current <= total, both
    // non-decreasing across observations.
    let mut last_current = 0u64;
    loop {
        let task = registry.get(&resp.task_id).unwrap();
        if let Some(progress) = task.progress {
            assert_eq!(progress.total, 10_000);
            assert!(progress.current <= progress.total);
            assert!(progress.current >= last_current);
            last_current = progress.current;
        }
        if task.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let task = registry.get(&resp.task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.progress.unwrap().current, 10_000);
    assert_eq!(task.message.as_deref(), Some("Added 10000 companies"));
    assert_eq!(store.count_members(&target.id).await.unwrap(), 10_000);
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let store = Arc::new(MemStore::new(Duration::ZERO));
    let source = store.create_collection("Source").await;
    let target = store.create_collection("Target").await;
    let ids = store.seed_companies("Company", 300).await;
    store.insert_members(&source.id, &ids).await.unwrap();

    let (module, registry) = module(store.clone());

    let first = module.submit_bulk(&target.id, &source.id).await.unwrap();
    let task = wait_terminal(&registry, &first.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.message.as_deref(), Some("Added 300 companies"));

    let second = module.submit_bulk(&target.id, &source.id).await.unwrap();
    let task = wait_terminal(&registry, &second.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(
        task.message.as_deref(),
        Some("Added 0 companies (300 duplicates skipped)")
    );
    assert_eq!(store.count_members(&target.id).await.unwrap(), 300);
}

#[tokio::test]
async fn duplicate_pair_is_rejected_while_active() {
    // A small throttle keeps the first task in flight long enough for
    // the second submission to hit the guard.
    let store = Arc::new(MemStore::new(Duration::from_micros(200)));
    let source = store.create_collection("Source").await;
    let target = store.create_collection("Target").await;
    let other = store.create_collection("Other").await;
    let ids = store.seed_companies("Company", 1_000).await;
    store.insert_members(&source.id, &ids).await.unwrap();

    let (module, registry) = module(store.clone());

    let accepted = module.submit_bulk(&target.id, &source.id).await.unwrap();

    let err = module.submit_bulk(&target.id, &source.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // A different ordered pair is not blocked by the guard.
    let sideways = module.submit_bulk(&other.id, &source.id).await.unwrap();

    let task = wait_terminal(&registry, &accepted.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    let task = wait_terminal(&registry, &sideways.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed);

    // After completion the pair becomes submittable again.
    module.submit_bulk(&target.id, &source.id).await.unwrap();
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

/// Delegating store whose batch inserts fail for the first
/// `failures` calls, then succeed.
struct FlakyStore {
    inner: MemStore,
    insert_calls: AtomicU32,
    failures: u32,
}

#[async_trait]
impl CompanyStore for FlakyStore {
    async fn collections(&self) -> Result<Vec<Collection>, ServiceError> {
        self.inner.collections().await
    }
    async fn collection(&self, id: &str) -> Result<Collection, ServiceError> {
        self.inner.collection(id).await
    }
    async fn count_members(&self, collection_id: &str) -> Result<u64, ServiceError> {
        self.inner.count_members(collection_id).await
    }
    async fn member_ids_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ServiceError> {
        self.inner.member_ids_page(collection_id, offset, limit).await
    }
    async fn companies_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<Company>, u64), ServiceError> {
        self.inner.companies_page(collection_id, offset, limit).await
    }
    async fn contains(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<HashSet<i64>, ServiceError> {
        self.inner.contains(collection_id, company_ids).await
    }
    async fn insert_members(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<u64, ServiceError> {
        let call = self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ServiceError::Storage("simulated write failure".into()));
        }
        self.inner.insert_members(collection_id, company_ids).await
    }
    async fn missing_companies(&self, company_ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        self.inner.missing_companies(company_ids).await
    }
}

#[tokio::test]
async fn transient_write_errors_are_retried_within_the_run() {
    let flaky = Arc::new(FlakyStore {
        inner: MemStore::new(Duration::ZERO),
        insert_calls: AtomicU32::new(0),
        failures: 2,
    });
    let source = flaky.inner.create_collection("Source").await;
    let target = flaky.inner.create_collection("Target").await;
    let ids = flaky.inner.seed_companies("Company", 150).await;
    flaky.inner.insert_members(&source.id, &ids).await.unwrap();

    let (module, registry) = module(flaky.clone());
    let resp = module.submit_bulk(&target.id, &source.id).await.unwrap();
    let task = wait_terminal(&registry, &resp.task_id).await;

    // Two transient failures are absorbed by the in-batch retry.
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(flaky.inner.count_members(&target.id).await.unwrap(), 150);
}

#[tokio::test]
async fn exhausted_retries_fail_the_task_and_keep_partial_progress() {
    // Every insert through the wrapper fails; seeding writes go straight
    // to the inner store.
    let flaky = Arc::new(FlakyStore {
        inner: MemStore::new(Duration::ZERO),
        insert_calls: AtomicU32::new(0),
        failures: u32::MAX,
    });
    let source = flaky.inner.create_collection("Source").await;
    let target = flaky.inner.create_collection("Target").await;
    let ids = flaky.inner.seed_companies("Company", 250).await;
    flaky.inner.insert_members(&source.id, &ids).await.unwrap();

    let (module, registry) = module(flaky.clone());
    let resp = module.submit_bulk(&target.id, &source.id).await.unwrap();
    let task = wait_terminal(&registry, &resp.task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    let error = task.error.expect("failed task carries an error string");
    assert!(error.contains("simulated write failure"), "error: {error}");
    // Progress frozen at the last reported value, below total.
    assert!(task.progress.unwrap().current < 250);

    // The registry itself is intact and accepts unrelated work.
    let other_source = flaky.inner.create_collection("Other").await;
    let other_ids = flaky.inner.seed_companies("Extra", 10).await;
    flaky
        .inner
        .insert_members(&other_source.id, &other_ids)
        .await
        .unwrap();
    assert!(registry.get(&resp.task_id).is_ok());
}
