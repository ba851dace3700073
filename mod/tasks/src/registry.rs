use std::collections::HashMap;
use std::sync::Mutex;

use rolodex_core::{ServiceError, new_id, now_rfc3339};

use crate::model::{Task, TaskProgress, TaskStatus};

/// Process-wide in-memory task map.
///
/// This is the only shared mutable resource in the core. It is built as
/// an injectable component (each test constructs its own) rather than a
/// hidden global. All read-modify-write operations take the single
/// internal lock for the duration of the mutation, so the duplicate-guard
/// check and the subsequent task creation in [`create_guarded`] are one
/// atomic step relative to concurrent submissions.
///
/// The lock is a plain `std::sync::Mutex`: critical sections are short
/// map operations and it is never held across an await point.
///
/// [`create_guarded`]: TaskRegistry::create_guarded
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, Task>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn build_task(total: u64, message: String, key: Option<String>) -> Task {
        let now = now_rfc3339();
        Task {
            id: new_id(),
            status: TaskStatus::Pending,
            progress: Some(TaskProgress { current: 0, total }),
            message: Some(message),
            error: None,
            created_at: now.clone(),
            updated_at: now,
            key,
        }
    }

    /// Create a new `pending` task with a fixed `total`.
    pub fn create(&self, total: u64, message: impl Into<String>) -> Task {
        let task = Self::build_task(total, message.into(), None);
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(task.id.clone(), task.clone());
        task
    }

    /// Create a new task unless an unfinished task with the same dedup
    /// key already exists.
    ///
    /// The existence check and the insert happen under a single lock
    /// acquisition, closing the race where two submissions for the same
    /// (source, target) pair both pass the check.
    pub fn create_guarded(
        &self,
        key: impl Into<String>,
        total: u64,
        message: impl Into<String>,
    ) -> Result<Task, ServiceError> {
        let key = key.into();
        let mut tasks = self.tasks.lock().unwrap();

        let active = tasks
            .values()
            .any(|t| t.key.as_deref() == Some(key.as_str()) && !t.status.is_terminal());
        if active {
            return Err(ServiceError::Conflict(
                "a bulk add for this source and target is already in progress".into(),
            ));
        }

        let task = Self::build_task(total, message.into(), Some(key));
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    /// Whether an unfinished task with this dedup key exists.
    pub fn has_active(&self, key: &str) -> bool {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .values()
            .any(|t| t.key.as_deref() == Some(key) && !t.status.is_terminal())
    }

    /// Get a snapshot of a task by ID.
    pub fn get(&self, id: &str) -> Result<Task, ServiceError> {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("task {id} not found")))
    }

    /// List all tasks, newest first.
    pub fn list(&self) -> Vec<Task> {
        let tasks = self.tasks.lock().unwrap();
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    // -----------------------------------------------------------------------
    // Lifecycle transitions (runner-facing)
    // -----------------------------------------------------------------------

    fn mutate<F>(&self, id: &str, f: F) -> Result<Task, ServiceError>
    where
        F: FnOnce(&mut Task) -> Result<(), ServiceError>,
    {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(format!("task {id} not found")))?;
        f(task)?;
        task.updated_at = now_rfc3339();
        Ok(task.clone())
    }

    /// Transition `pending → in_progress`.
    pub fn start(&self, id: &str) -> Result<Task, ServiceError> {
        self.mutate(id, |task| {
            if task.status != TaskStatus::Pending {
                return Err(ServiceError::Conflict(format!(
                    "task {} cannot start from status {}",
                    task.id, task.status
                )));
            }
            task.status = TaskStatus::InProgress;
            Ok(())
        })
    }

    /// Advance the progress counter.
    ///
    /// `current` is clamped to `total` and never moves backwards, so
    /// successive observations of the same task see a non-decreasing
    /// `current <= total`.
    pub fn set_progress(&self, id: &str, current: u64) -> Result<Task, ServiceError> {
        self.mutate(id, |task| {
            if task.status.is_terminal() {
                return Err(ServiceError::Conflict(format!(
                    "task {} is already {}",
                    task.id, task.status
                )));
            }
            if let Some(progress) = task.progress.as_mut() {
                progress.current = current.min(progress.total).max(progress.current);
            }
            Ok(())
        })
    }

    /// Terminate with success. Sets the final progress to `total`
    /// only via what the runner reported; the message is replaced.
    pub fn complete(&self, id: &str, message: impl Into<String>) -> Result<Task, ServiceError> {
        let message = message.into();
        self.mutate(id, |task| {
            if task.status.is_terminal() {
                return Err(ServiceError::Conflict(format!(
                    "task {} is already {}",
                    task.id, task.status
                )));
            }
            task.status = TaskStatus::Completed;
            task.message = Some(message);
            Ok(())
        })
    }

    /// Terminate with failure. Progress stays frozen at the last
    /// reported value.
    pub fn fail(&self, id: &str, error: impl Into<String>) -> Result<Task, ServiceError> {
        let error = error.into();
        self.mutate(id, |task| {
            if task.status.is_terminal() {
                return Err(ServiceError::Conflict(format!(
                    "task {} is already {}",
                    task.id, task.status
                )));
            }
            task.status = TaskStatus::Failed;
            task.error = Some(error);
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Retention
    // -----------------------------------------------------------------------

    /// Evict terminal tasks whose last update is older than `ttl_secs`.
    /// Returns the number of tasks removed.
    pub fn sweep_terminal(&self, ttl_secs: i64) -> usize {
        let now = chrono::Utc::now();
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|_, task| {
            if !task.status.is_terminal() {
                return true;
            }
            match chrono::DateTime::parse_from_rfc3339(&task.updated_at) {
                Ok(updated) => (now - updated.with_timezone(&chrono::Utc)).num_seconds() < ttl_secs,
                Err(_) => true,
            }
        });
        before - tasks.len()
    }
}
