use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use rolodex_core::{ListResult, ServiceError};

use crate::model::Task;
use crate::registry::TaskRegistry;

type RegistryState = Arc<TaskRegistry>;

pub fn router(registry: Arc<TaskRegistry>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}", get(get_task))
        .with_state(registry)
}

// ---------------------------------------------------------------------------
// GET /tasks
// ---------------------------------------------------------------------------

async fn list_tasks(State(registry): State<RegistryState>) -> Json<ListResult<Task>> {
    let items = registry.list();
    let total = items.len();
    Json(ListResult { items, total })
}

// ---------------------------------------------------------------------------
// GET /tasks/:id — polled at a fixed interval by clients
// ---------------------------------------------------------------------------

async fn get_task(
    State(registry): State<RegistryState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ServiceError> {
    let task = registry.get(&id)?;
    Ok(Json(task))
}
