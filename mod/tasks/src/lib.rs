pub mod api;
pub mod model;
pub mod registry;
pub mod runner;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use rolodex_core::Module;

use registry::TaskRegistry;
use worker::RetentionConfig;

/// The Tasks module — background task registry and status API.
///
/// Owns the process-wide [`TaskRegistry`] and the retention sweeper.
/// Other modules submit work against the registry via [`runner::spawn`]
/// and clients observe it through `GET /tasks/{id}`.
pub struct TasksModule {
    registry: Arc<TaskRegistry>,
    _sweeper_cancel: tokio_util::sync::CancellationToken,
}

impl TasksModule {
    /// Create the module with default retention settings.
    pub fn new() -> Self {
        Self::with_config(RetentionConfig::default())
    }

    /// Create with explicit retention configuration.
    pub fn with_config(config: RetentionConfig) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let cancel = worker::start(Arc::clone(&registry), config);
        Self {
            registry,
            _sweeper_cancel: cancel,
        }
    }

    /// Get a handle to the task registry for submitting work.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }
}

impl Default for TasksModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for TasksModule {
    fn name(&self) -> &str {
        "tasks"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.registry))
    }
}
