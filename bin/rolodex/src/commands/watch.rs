//! Polling loop for in-flight transfers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rolodex_client::{ClientState, HttpTransport, PollEvent, TaskPoller, TaskStatus};
use tracing::debug;

/// `rolodex watch [--collection <id>]`
///
/// Loads the persisted task list, reconciles it against the server
/// (dropping ids the server no longer knows), then polls until every
/// tracked transfer settles. When a finished transfer touches the
/// collection being viewed, a refresh notice is printed.
pub async fn run(
    transport: &Arc<HttpTransport>,
    viewed_collection: Option<&str>,
    state_path: &Path,
) -> Result<()> {
    let mut state = ClientState::load(state_path);
    if state.tracked.is_empty() {
        println!("No transfers in flight.");
        return Ok(());
    }

    let mut poller = TaskPoller::new(Arc::clone(transport));
    let persisted = std::mem::take(&mut state.tracked);
    debug!("reconciling {} persisted tasks", persisted.len());
    for event in poller.reconcile(persisted).await {
        handle(event, viewed_collection, &mut state);
    }
    // Reconcile decided what is still live; persist that before looping.
    for tracked in poller.tracked() {
        state.remember(tracked.clone());
    }
    state.save(state_path)?;

    if !poller.is_idle() {
        poller
            .run(|event| handle(event, viewed_collection, &mut state))
            .await;
        state.save(state_path)?;
    }

    println!("All transfers settled.");
    Ok(())
}

fn handle(event: PollEvent, viewed_collection: Option<&str>, state: &mut ClientState) {
    match event {
        PollEvent::Progress(task) => {
            if let Some(progress) = &task.progress {
                println!(
                    "  {} {}/{} {}",
                    task.id,
                    progress.current,
                    progress.total,
                    task.message.as_deref().unwrap_or("")
                );
            }
        }
        PollEvent::Finished { tracked, task } => {
            state.forget(&tracked.task_id);
            match task.status {
                TaskStatus::Completed => {
                    println!(
                        "Task {} completed: {}",
                        tracked.task_id,
                        task.message.as_deref().unwrap_or("done")
                    );
                }
                _ => {
                    println!(
                        "Task {} failed: {}",
                        tracked.task_id,
                        task.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            if let Some(viewed) = viewed_collection {
                if tracked.touches(viewed) {
                    println!("Collection {viewed} changed; refresh to see the result.");
                }
            }
        }
        PollEvent::Dropped(task_id) => {
            state.forget(&task_id);
            println!("Task {task_id} is no longer known to the server; dropping it.");
        }
    }
}
