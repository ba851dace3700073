//! Bulk-transfer submission.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rolodex_client::{ApiError, ClientState, HttpTransport, TrackedTask, Transport};
use tracing::debug;

/// `rolodex bulk <target> --from <source> [--watch]`
///
/// Submits the transfer, remembers the returned task id in the state
/// file, and either returns immediately or keeps polling with `--watch`.
pub async fn submit(
    transport: &Arc<HttpTransport>,
    target_id: &str,
    source_id: &str,
    watch: bool,
    state_path: &Path,
) -> Result<()> {
    debug!("submitting bulk add {source_id} -> {target_id}");
    let result = match transport.submit_bulk(target_id, source_id).await {
        Ok(result) => result,
        Err(e) if e.is_conflict() => {
            // Duplicate pair or self-transfer; the server message says which.
            anyhow::bail!("Submission rejected: {}", server_message(&e));
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Submitted task {} (~{} companies to process).",
        result.task_id, result.estimated_count
    );

    let mut state = ClientState::load(state_path);
    state.remember(TrackedTask {
        task_id: result.task_id,
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
    });
    state.save(state_path)?;

    if watch {
        crate::commands::watch::run(transport, Some(target_id), state_path).await?;
    } else {
        println!("Run `rolodex watch` to follow its progress.");
    }
    Ok(())
}

fn server_message(e: &ApiError) -> String {
    match e {
        ApiError::Server { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
