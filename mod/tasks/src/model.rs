use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a task.
///
/// ```text
/// pending → in_progress → completed
///                       → failed
/// ```
///
/// Transitions are one-directional; a task never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskProgress
// ---------------------------------------------------------------------------

/// Progress counters for a task. Invariant: `current <= total`, and
/// `current` only ever moves forward. `total` is fixed when the task is
/// created and never revised downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub current: u64,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A single background task tracked by the task registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    pub status: TaskStatus,

    /// `(current, total)` counters, present for tasks that report progress.
    #[serde(default)]
    pub progress: Option<TaskProgress>,

    /// Human-readable status message, set on creation and on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error description, set only when `status = failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    // --- timestamps (RFC 3339) ---
    pub created_at: String,
    pub updated_at: String,

    /// Deduplication key for the duplicate-submission guard. Internal;
    /// never exposed on the wire.
    #[serde(skip)]
    pub key: Option<String>,
}
