use async_trait::async_trait;
use serde::de::DeserializeOwned;

use rolodex_collections::model::{
    AddCompaniesRequest, AddCompaniesResponse, BulkAddRequest, BulkAddResponse, Collection,
    CollectionPage,
};
use rolodex_tasks::model::Task;

// ── Error ───────────────────────────────────────────────────────────

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    #[error("state file: {0}")]
    State(String),
}

impl ApiError {
    /// Whether the server said the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }

    /// Whether the server rejected a duplicate/conflicting submission.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Server { status: 409, .. })
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// The request/response surface the client core depends on. The poller
/// and CLI talk to this trait so tests can substitute a scripted
/// transport for the real HTTP one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn collection_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<CollectionPage, ApiError>;

    /// Synchronous explicit add; the result is final when this returns.
    async fn add_companies(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<AddCompaniesResponse, ApiError>;

    /// Bulk submission; returns immediately with a task id to poll.
    async fn submit_bulk(
        &self,
        target_id: &str,
        source_id: &str,
    ) -> Result<BulkAddResponse, ApiError>;

    async fn fetch_task(&self, task_id: &str) -> Result<Task, ApiError>;
}

// ── HttpTransport ───────────────────────────────────────────────────

/// Transport over HTTP/JSON against a rolodexd server.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Parse an API response, mapping non-2xx to `ApiError::Server` with
    /// the server's `message` field when the body carries one.
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(ApiError::Server { status: code, message });
        }
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let url = format!("{}/collections", self.base_url);
        let resp = self.http.get(&url).send().await?;
        Self::parse(resp).await
    }

    async fn collection_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<CollectionPage, ApiError> {
        let url = format!(
            "{}/collections/{}?offset={}&limit={}",
            self.base_url, collection_id, offset, limit
        );
        let resp = self.http.get(&url).send().await?;
        Self::parse(resp).await
    }

    async fn add_companies(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<AddCompaniesResponse, ApiError> {
        let url = format!("{}/collections/{}/companies", self.base_url, collection_id);
        let body = AddCompaniesRequest {
            company_ids: company_ids.to_vec(),
        };
        let resp = self.http.post(&url).json(&body).send().await?;
        Self::parse(resp).await
    }

    async fn submit_bulk(
        &self,
        target_id: &str,
        source_id: &str,
    ) -> Result<BulkAddResponse, ApiError> {
        let url = format!(
            "{}/collections/{}/companies/bulk",
            self.base_url, target_id
        );
        let body = BulkAddRequest {
            source_collection_id: source_id.to_string(),
        };
        let resp = self.http.post(&url).json(&body).send().await?;
        Self::parse(resp).await
    }

    async fn fetch_task(&self, task_id: &str) -> Result<Task, ApiError> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);
        let resp = self.http.get(&url).send().await?;
        Self::parse(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let t = HttpTransport::new("http://localhost:8080/");
        assert_eq!(t.base_url, "http://localhost:8080");
    }

    #[test]
    fn not_found_and_conflict_classification() {
        let nf = ApiError::Server { status: 404, message: "task x not found".into() };
        assert!(nf.is_not_found());
        assert!(!nf.is_conflict());

        let conflict = ApiError::Server { status: 409, message: "already running".into() };
        assert!(conflict.is_conflict());

        let decode = ApiError::Decode("bad json".into());
        assert!(!decode.is_not_found());
    }
}
