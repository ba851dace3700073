pub mod api;
pub mod model;
pub mod store;
pub mod transfer;

use std::sync::Arc;

use axum::Router;
use tracing::info;

use rolodex_core::{Module, ServiceError};
use rolodex_tasks::registry::TaskRegistry;
use rolodex_tasks::runner;

use model::{
    AddCompaniesResponse, BulkAddResponse, Collection, CollectionPage,
};
use store::CompanyStore;
use transfer::TransferOutcome;

/// The Collections module — collection listings, explicit adds, and
/// bulk-transfer submission.
///
/// Holds the Data Store seam and a handle to the shared task registry;
/// bulk submissions are validated here, guarded against duplicate active
/// pairs, and handed to the task runner.
pub struct CollectionsModule {
    store: Arc<dyn CompanyStore>,
    registry: Arc<TaskRegistry>,
}

impl CollectionsModule {
    pub fn new(store: Arc<dyn CompanyStore>, registry: Arc<TaskRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<dyn CompanyStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    pub async fn list_collections(&self) -> Result<Vec<Collection>, ServiceError> {
        self.store.collections().await
    }

    pub async fn collection_page(
        &self,
        id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<CollectionPage, ServiceError> {
        let collection = self.store.collection(id).await?;
        let (companies, total) = self.store.companies_page(id, offset, limit).await?;
        Ok(CollectionPage {
            id: collection.id,
            collection_name: collection.collection_name,
            companies,
            total,
        })
    }

    // -----------------------------------------------------------------------
    // Explicit add — synchronous, errors surface directly to the caller
    // -----------------------------------------------------------------------

    pub async fn add_companies(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<AddCompaniesResponse, ServiceError> {
        if company_ids.is_empty() {
            return Err(ServiceError::Validation(
                "company_ids must not be empty".into(),
            ));
        }
        self.store.collection(collection_id).await?;

        let missing = self.store.missing_companies(company_ids).await?;
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(
                "one or more companies not found".into(),
            ));
        }

        // Dedupe the request itself before counting anything.
        let mut unique: Vec<i64> = Vec::with_capacity(company_ids.len());
        let mut seen = std::collections::HashSet::new();
        for id in company_ids {
            if seen.insert(*id) {
                unique.push(*id);
            }
        }

        let existing = self.store.contains(collection_id, &unique).await?;
        let fresh: Vec<i64> = unique
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();

        let added = if fresh.is_empty() {
            0
        } else {
            self.store.insert_members(collection_id, &fresh).await?
        };

        Ok(AddCompaniesResponse {
            added_count: added,
            duplicates_count: unique.len() as u64 - added,
        })
    }

    // -----------------------------------------------------------------------
    // Bulk add — returns immediately; the transfer runs as a task
    // -----------------------------------------------------------------------

    pub async fn submit_bulk(
        &self,
        target_id: &str,
        source_id: &str,
    ) -> Result<BulkAddResponse, ServiceError> {
        let target = self.store.collection(target_id).await.map_err(|_| {
            ServiceError::NotFound(format!("target collection {target_id} not found"))
        })?;
        let source = self.store.collection(source_id).await.map_err(|_| {
            ServiceError::NotFound(format!("source collection {source_id} not found"))
        })?;

        if source_id == target_id {
            return Err(ServiceError::Conflict(
                "cannot bulk add a collection into itself".into(),
            ));
        }

        // Estimate total up front; it is fixed for the task's lifetime.
        let estimated = self.store.count_members(source_id).await?;

        // Duplicate-guard check and task creation are one atomic step.
        let key = format!("{source_id}->{target_id}");
        let task = self.registry.create_guarded(
            key,
            estimated,
            format!(
                "Adding companies from {} to {}",
                source.collection_name, target.collection_name
            ),
        )?;

        info!(
            "bulk add submitted: task {} ({} -> {}, {} members)",
            task.id, source.collection_name, target.collection_name, estimated
        );

        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let task_id = task.id.clone();
        let source_id = source_id.to_string();
        let target_id = target_id.to_string();
        runner::spawn(Arc::clone(&self.registry), task.id.clone(), async move {
            let outcome = transfer::transfer(store.as_ref(), &source_id, &target_id, |current, _total| {
                // A progress report can only fail if the task was swept
                // away mid-run; nothing useful to do about it here.
                let _ = registry.set_progress(&task_id, current);
            })
            .await?;
            Ok(success_message(outcome))
        });

        Ok(BulkAddResponse {
            task_id: task.id,
            estimated_count: estimated,
        })
    }
}

impl Module for CollectionsModule {
    fn name(&self) -> &str {
        "collections"
    }

    fn routes(&self) -> Router {
        api::router(Arc::new(CollectionsModule {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }))
    }
}

/// Build the user-facing success message from the transfer counts,
/// mentioning skipped duplicates only when there were any.
fn success_message(outcome: TransferOutcome) -> String {
    let mut message = format!(
        "Added {} {}",
        outcome.added,
        plural(outcome.added, "company", "companies")
    );
    if outcome.duplicates > 0 {
        message.push_str(&format!(
            " ({} {} skipped)",
            outcome.duplicates,
            plural(outcome.duplicates, "duplicate", "duplicates")
        ));
    }
    message
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
