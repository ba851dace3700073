use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Core entities
// ---------------------------------------------------------------------------

/// A named collection of company records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub collection_name: String,
}

/// A company row as served in a collection listing. `liked` is computed
/// per company from membership in the liked collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub company_name: String,
    pub liked: bool,
}

// ---------------------------------------------------------------------------
// API request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /collections/{id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// The number of items to skip from the beginning.
    #[serde(default)]
    pub offset: u64,

    /// The number of items to fetch.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// One server-paginated page of a collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPage {
    pub id: String,
    pub collection_name: String,
    pub companies: Vec<Company>,
    pub total: u64,
}

/// Body for `POST /collections/{id}/companies` — synchronous explicit add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCompaniesRequest {
    pub company_ids: Vec<i64>,
}

/// Response for the synchronous explicit add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCompaniesResponse {
    pub added_count: u64,
    pub duplicates_count: u64,
}

/// Body for `POST /collections/{id}/companies/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAddRequest {
    pub source_collection_id: String,
}

/// Response for an accepted bulk submission. The transfer itself runs in
/// the background; progress is observed through `GET /tasks/{task_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAddResponse {
    pub task_id: String,
    pub estimated_count: u64,
}
