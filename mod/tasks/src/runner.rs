use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use rolodex_core::ServiceError;

use crate::registry::TaskRegistry;

/// Execute one job off the request path, owning its task for the whole run.
///
/// The task is flipped to `in_progress` before the job starts. On job
/// success the task is completed with the returned message; on job error
/// it is failed with the error string. The job runs inside its own
/// `tokio::spawn`, so a panic is caught at the join handle and recorded
/// as a failure too — nothing escapes the runner, and one task's failure
/// cannot corrupt another task or the registry.
///
/// Returns the outer join handle so callers (mostly tests) can await
/// settlement; submitters drop it and observe the task through polling.
pub fn spawn<F>(registry: Arc<TaskRegistry>, task_id: String, job: F) -> JoinHandle<()>
where
    F: Future<Output = Result<String, ServiceError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = registry.start(&task_id) {
            error!("task {task_id}: cannot start: {e}");
            return;
        }
        debug!("task {task_id}: started");

        let outcome = tokio::spawn(job).await;

        let result = match outcome {
            Ok(Ok(message)) => {
                debug!("task {task_id}: completed");
                registry.complete(&task_id, message)
            }
            Ok(Err(e)) => {
                error!("task {task_id}: failed: {e}");
                registry.fail(&task_id, e.to_string())
            }
            Err(join_err) => {
                error!("task {task_id}: aborted: {join_err}");
                registry.fail(&task_id, "task aborted unexpectedly")
            }
        };

        if let Err(e) = result {
            // Registry refused the terminal transition (e.g. swept away).
            error!("task {task_id}: could not record outcome: {e}");
        }
    })
}
