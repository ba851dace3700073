use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::poller::TrackedTask;
use crate::transport::ApiError;

/// Client-side state persisted across sessions. Holds the list of
/// in-flight transfers so a restarted client can resume polling them.
/// The server remains the source of truth; everything here is
/// reconciled against it on load.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(default)]
    pub tracked: Vec<TrackedTask>,
}

impl ClientState {
    /// Load persisted state. A missing or unreadable file yields the
    /// default empty state rather than an error: stale or corrupt local
    /// state is never worth refusing to start over.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("discarding unreadable state file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ApiError::State(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| ApiError::State(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ApiError::State(e.to_string()))
    }

    pub fn remember(&mut self, task: TrackedTask) {
        if !self.tracked.iter().any(|t| t.task_id == task.task_id) {
            self.tracked.push(task);
        }
    }

    pub fn forget(&mut self, task_id: &str) {
        self.tracked.retain(|t| t.task_id != task_id);
    }
}
