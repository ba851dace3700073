use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use rolodex_core::ServiceError;

use crate::CollectionsModule;
use crate::model::{
    AddCompaniesRequest, AddCompaniesResponse, BulkAddRequest, BulkAddResponse, Collection,
    CollectionPage, PageQuery,
};

type ModuleState = Arc<CollectionsModule>;

pub fn router(module: Arc<CollectionsModule>) -> Router {
    Router::new()
        .route("/collections", get(list_collections))
        .route("/collections/{id}", get(get_collection_page))
        .route("/collections/{id}/companies", post(add_companies))
        .route("/collections/{id}/companies/bulk", post(bulk_add_companies))
        .with_state(module)
}

// ---------------------------------------------------------------------------
// GET /collections
// ---------------------------------------------------------------------------

async fn list_collections(
    State(module): State<ModuleState>,
) -> Result<Json<Vec<Collection>>, ServiceError> {
    Ok(Json(module.list_collections().await?))
}

// ---------------------------------------------------------------------------
// GET /collections/:id?offset&limit
// ---------------------------------------------------------------------------

async fn get_collection_page(
    State(module): State<ModuleState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CollectionPage>, ServiceError> {
    let page = module
        .collection_page(&id, query.offset, query.limit)
        .await?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// POST /collections/:id/companies — synchronous explicit add
// ---------------------------------------------------------------------------

async fn add_companies(
    State(module): State<ModuleState>,
    Path(id): Path<String>,
    Json(req): Json<AddCompaniesRequest>,
) -> Result<Json<AddCompaniesResponse>, ServiceError> {
    let resp = module.add_companies(&id, &req.company_ids).await?;
    Ok(Json(resp))
}

// ---------------------------------------------------------------------------
// POST /collections/:id/companies/bulk — returns immediately with a task id
// ---------------------------------------------------------------------------

async fn bulk_add_companies(
    State(module): State<ModuleState>,
    Path(id): Path<String>,
    Json(req): Json<BulkAddRequest>,
) -> Result<Json<BulkAddResponse>, ServiceError> {
    let resp = module.submit_bulk(&id, &req.source_collection_id).await?;
    Ok(Json(resp))
}
