use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rolodex_tasks::model::Task;

use crate::transport::{ApiError, Transport};

/// Default interval between polling rounds.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One in-flight bulk transfer the client cares about. The collection
/// pair is remembered client-side so a terminal notification can decide
/// whether the currently viewed listing needs a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTask {
    pub task_id: String,
    pub source_id: String,
    pub target_id: String,
}

impl TrackedTask {
    /// Whether this task touches the given collection (as source or target).
    pub fn touches(&self, collection_id: &str) -> bool {
        self.source_id == collection_id || self.target_id == collection_id
    }
}

/// What a polling round observed.
#[derive(Debug)]
pub enum PollEvent {
    /// Fresh non-terminal state for display (message, progress).
    Progress(Task),
    /// The task reached `completed` or `failed`. Emitted exactly once;
    /// the task is no longer tracked afterwards.
    Finished { tracked: TrackedTask, task: Task },
    /// The server no longer recognizes the task id.
    Dropped(String),
}

/// Periodically fetches every tracked task and reconciles local state.
///
/// Each fetch is independent and idempotent: a transient error for one
/// task neither stops polling of the others nor cancels the loop — the
/// failed fetch is simply retried on the next tick. The loop runs while
/// the tracked set is non-empty and exits on its own once it drains.
pub struct TaskPoller<T: Transport> {
    transport: Arc<T>,
    interval: Duration,
    tracked: Vec<TrackedTask>,
}

impl<T: Transport> TaskPoller<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_interval(transport, POLL_INTERVAL)
    }

    pub fn with_interval(transport: Arc<T>, interval: Duration) -> Self {
        Self {
            transport,
            interval,
            tracked: Vec::new(),
        }
    }

    /// Start tracking a task. Duplicate ids are ignored.
    pub fn track(&mut self, task: TrackedTask) {
        if !self.tracked.iter().any(|t| t.task_id == task.task_id) {
            self.tracked.push(task);
        }
    }

    pub fn tracked(&self) -> &[TrackedTask] {
        &self.tracked
    }

    pub fn is_idle(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Reconcile a persisted task list (e.g. after a reload): re-fetch
    /// each id's true status before trusting it. Unknown ids are dropped,
    /// already-terminal ones produce their one-time notification, live
    /// ones resume tracking. A transient fetch error keeps the task
    /// tracked — the regular loop will retry it.
    pub async fn reconcile(&mut self, persisted: Vec<TrackedTask>) -> Vec<PollEvent> {
        let mut events = Vec::new();
        for tracked in persisted {
            match self.transport.fetch_task(&tracked.task_id).await {
                Ok(task) if task.status.is_terminal() => {
                    events.push(PollEvent::Finished { tracked, task });
                }
                Ok(task) => {
                    events.push(PollEvent::Progress(task));
                    self.track(tracked);
                }
                Err(e) if e.is_not_found() => {
                    debug!("task {} no longer known to the server", tracked.task_id);
                    events.push(PollEvent::Dropped(tracked.task_id.clone()));
                }
                Err(e) => {
                    warn!("reconcile fetch for task {} failed: {e}", tracked.task_id);
                    self.track(tracked);
                }
            }
        }
        events
    }

    /// One polling round over the tracked set.
    pub async fn poll_once(&mut self) -> Vec<PollEvent> {
        let snapshot = self.tracked.clone();
        let mut events = Vec::new();
        for tracked in snapshot {
            match self.transport.fetch_task(&tracked.task_id).await {
                Ok(task) if task.status.is_terminal() => {
                    self.untrack(&tracked.task_id);
                    events.push(PollEvent::Finished { tracked, task });
                }
                Ok(task) => events.push(PollEvent::Progress(task)),
                Err(e) if e.is_not_found() => {
                    self.untrack(&tracked.task_id);
                    events.push(PollEvent::Dropped(tracked.task_id.clone()));
                }
                Err(e) => {
                    // Transient; keep tracking and retry next tick.
                    warn!("poll fetch for task {} failed: {e}", tracked.task_id);
                }
            }
        }
        events
    }

    /// Run the polling loop until the tracked set drains, delivering
    /// events to `on_event` as they are observed.
    pub async fn run<F>(&mut self, mut on_event: F)
    where
        F: FnMut(PollEvent),
    {
        while !self.tracked.is_empty() {
            tokio::time::sleep(self.interval).await;
            for event in self.poll_once().await {
                on_event(event);
            }
        }
        debug!("poller idle, loop stopped");
    }

    fn untrack(&mut self, task_id: &str) {
        self.tracked.retain(|t| t.task_id != task_id);
    }
}
