use tracing::{debug, warn};

use rolodex_core::ServiceError;

use crate::store::CompanyStore;

/// How many source member ids to read per page. Internal tuning constant;
/// correctness does not depend on its value.
pub const PAGE_SIZE: usize = 1000;

/// How many membership edges to insert per batch write.
pub const INSERT_BATCH: usize = 100;

/// How many times a failing batch insert is attempted before the run aborts.
const INSERT_ATTEMPTS: u32 = 3;

/// Result of a finished bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Membership edges actually created in the target.
    pub added: u64,
    /// Source members skipped because they were already in the target.
    pub duplicates: u64,
}

/// Copy every member of `source_id` into `target_id`, skipping companies
/// already present in the target.
///
/// Walks the source membership in [`PAGE_SIZE`] pages, pre-filters each
/// page against the target, and inserts the remainder in [`INSERT_BATCH`]
/// batches. `on_progress(current, total)` fires after every batch —
/// including a failing one — where `current` counts source rows processed
/// so far (inserted or skipped) and `total` is the source size captured
/// once at the start.
///
/// Rows inserted before a failure stay committed; there is no
/// compensating rollback. A storage error on a batch is retried a bounded
/// number of times, then propagated, aborting the run.
pub async fn transfer<F>(
    store: &dyn CompanyStore,
    source_id: &str,
    target_id: &str,
    mut on_progress: F,
) -> Result<TransferOutcome, ServiceError>
where
    F: FnMut(u64, u64),
{
    if source_id == target_id {
        return Err(ServiceError::Conflict(
            "cannot bulk add a collection into itself".into(),
        ));
    }

    let total = store.count_members(source_id).await?;
    debug!("transfer {source_id} -> {target_id}: {total} source members");

    let mut processed: u64 = 0;
    let mut added: u64 = 0;
    let mut duplicates: u64 = 0;
    let mut offset: u64 = 0;

    loop {
        let page = store.member_ids_page(source_id, offset, PAGE_SIZE).await?;
        if page.is_empty() {
            break;
        }

        let existing = store.contains(target_id, &page).await?;

        for chunk in page.chunks(INSERT_BATCH) {
            let fresh: Vec<i64> = chunk
                .iter()
                .copied()
                .filter(|id| !existing.contains(id))
                .collect();

            let inserted = if fresh.is_empty() {
                Ok(0)
            } else {
                insert_with_retry(store, target_id, &fresh).await
            };

            match inserted {
                Ok(n) => {
                    added += n;
                    duplicates += chunk.len() as u64 - n;
                    processed += chunk.len() as u64;
                    on_progress(processed.min(total), total);
                }
                Err(e) => {
                    // Rows of this batch were not processed; report the
                    // progress reached so far before aborting.
                    on_progress(processed.min(total), total);
                    return Err(e);
                }
            }
        }

        if page.len() < PAGE_SIZE {
            break;
        }
        offset += page.len() as u64;
    }

    debug!(
        "transfer {source_id} -> {target_id}: done, added={added} duplicates={duplicates}"
    );
    Ok(TransferOutcome { added, duplicates })
}

/// Retry transient storage failures of one batch insert. Only storage
/// errors are retried; anything else propagates immediately.
async fn insert_with_retry(
    store: &dyn CompanyStore,
    target_id: &str,
    ids: &[i64],
) -> Result<u64, ServiceError> {
    let mut last = String::new();
    for attempt in 1..=INSERT_ATTEMPTS {
        match store.insert_members(target_id, ids).await {
            Ok(n) => return Ok(n),
            Err(ServiceError::Storage(msg)) => {
                warn!(
                    "batch insert into {target_id} failed (attempt {attempt}/{INSERT_ATTEMPTS}): {msg}"
                );
                last = msg;
            }
            Err(e) => return Err(e),
        }
    }
    Err(ServiceError::Storage(format!(
        "batch insert failed after {INSERT_ATTEMPTS} attempts: {last}"
    )))
}
