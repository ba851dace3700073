use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rolodex_core::{ServiceError, new_id};

use crate::model::{Collection, Company};

/// Name of the collection whose membership drives the `liked` flag on
/// company listings.
pub const LIKED_COLLECTION: &str = "Liked Companies";

/// The Data Store collaborator: paginated membership reads, existence
/// checks, and batch inserts of new membership edges.
///
/// Inserts may be slow (the reference implementation throttles them
/// artificially); callers must never hold a lock across an insert call
/// and must not assume fast writes.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// All collections, metadata only.
    async fn collections(&self) -> Result<Vec<Collection>, ServiceError>;

    /// Metadata for one collection. `NotFound` if unknown.
    async fn collection(&self, id: &str) -> Result<Collection, ServiceError>;

    /// Number of membership edges in a collection.
    async fn count_members(&self, collection_id: &str) -> Result<u64, ServiceError>;

    /// One page of member company ids, in collection order.
    async fn member_ids_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ServiceError>;

    /// One page of companies with the `liked` flag computed, plus the
    /// collection's total member count.
    async fn companies_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<Company>, u64), ServiceError>;

    /// Which of `company_ids` are already members of the collection.
    async fn contains(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<HashSet<i64>, ServiceError>;

    /// Insert membership edges for the given companies, skipping ids that
    /// are already members. Returns the number actually inserted.
    async fn insert_members(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<u64, ServiceError>;

    /// Which of `company_ids` do not exist as companies at all.
    async fn missing_companies(&self, company_ids: &[i64]) -> Result<Vec<i64>, ServiceError>;
}

// ---------------------------------------------------------------------------
// MemStore — in-memory reference implementation
// ---------------------------------------------------------------------------

struct CollectionData {
    id: String,
    name: String,
    /// Members in insertion order (a collection is an ordered grouping).
    order: Vec<i64>,
    /// Same members, for O(1) membership checks.
    members: HashSet<i64>,
}

struct Inner {
    companies: BTreeMap<i64, String>,
    next_company_id: i64,
    collections: Vec<CollectionData>,
}

impl Inner {
    fn collection(&self, id: &str) -> Result<&CollectionData, ServiceError> {
        self.collections
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("collection {id} not found")))
    }

    fn collection_mut(&mut self, id: &str) -> Result<&mut CollectionData, ServiceError> {
        self.collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("collection {id} not found")))
    }

    fn liked_members(&self) -> Option<&HashSet<i64>> {
        self.collections
            .iter()
            .find(|c| c.name == LIKED_COLLECTION)
            .map(|c| &c.members)
    }
}

/// In-memory Data Store with an artificial per-row insert latency, so
/// bulk writes behave like the throttled relational store they stand in
/// for. The latency sleep happens before the write lock is taken.
pub struct MemStore {
    insert_latency: Duration,
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create a store with the given artificial per-row insert latency.
    /// Use `Duration::ZERO` in tests.
    pub fn new(insert_latency: Duration) -> Self {
        Self {
            insert_latency,
            inner: RwLock::new(Inner {
                companies: BTreeMap::new(),
                next_company_id: 1,
                collections: Vec::new(),
            }),
        }
    }

    /// Create an empty collection. Seed/test helper.
    pub async fn create_collection(&self, name: impl Into<String>) -> Collection {
        let name = name.into();
        let id = new_id();
        let mut inner = self.inner.write().await;
        inner.collections.push(CollectionData {
            id: id.clone(),
            name: name.clone(),
            order: Vec::new(),
            members: HashSet::new(),
        });
        Collection {
            id,
            collection_name: name,
        }
    }

    /// Register a company record. Seed/test helper. Returns its id.
    pub async fn add_company(&self, name: impl Into<String>) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_company_id;
        inner.next_company_id += 1;
        inner.companies.insert(id, name.into());
        id
    }

    /// Register `count` companies named `{prefix} {n}`. Returns their ids.
    pub async fn seed_companies(&self, prefix: &str, count: usize) -> Vec<i64> {
        let mut inner = self.inner.write().await;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = inner.next_company_id;
            inner.next_company_id += 1;
            inner.companies.insert(id, format!("{prefix} {id}"));
            ids.push(id);
        }
        ids
    }

    /// Place companies directly into a collection, bypassing the insert
    /// throttle. Seed/test helper; silently skips unknown collections.
    pub async fn seed_members(&self, collection_id: &str, company_ids: &[i64]) {
        let mut inner = self.inner.write().await;
        if let Some(c) = inner
            .collections
            .iter_mut()
            .find(|c| c.id == collection_id)
        {
            for &id in company_ids {
                if c.members.insert(id) {
                    c.order.push(id);
                }
            }
        }
    }
}

#[async_trait]
impl CompanyStore for MemStore {
    async fn collections(&self) -> Result<Vec<Collection>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .iter()
            .map(|c| Collection {
                id: c.id.clone(),
                collection_name: c.name.clone(),
            })
            .collect())
    }

    async fn collection(&self, id: &str) -> Result<Collection, ServiceError> {
        let inner = self.inner.read().await;
        let c = inner.collection(id)?;
        Ok(Collection {
            id: c.id.clone(),
            collection_name: c.name.clone(),
        })
    }

    async fn count_members(&self, collection_id: &str) -> Result<u64, ServiceError> {
        let inner = self.inner.read().await;
        Ok(inner.collection(collection_id)?.order.len() as u64)
    }

    async fn member_ids_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ServiceError> {
        let inner = self.inner.read().await;
        let order = &inner.collection(collection_id)?.order;
        let start = (offset as usize).min(order.len());
        let end = start.saturating_add(limit).min(order.len());
        Ok(order[start..end].to_vec())
    }

    async fn companies_page(
        &self,
        collection_id: &str,
        offset: u64,
        limit: usize,
    ) -> Result<(Vec<Company>, u64), ServiceError> {
        let inner = self.inner.read().await;
        let col = inner.collection(collection_id)?;
        let total = col.order.len() as u64;
        let start = (offset as usize).min(col.order.len());
        let end = start.saturating_add(limit).min(col.order.len());

        let liked = inner.liked_members();
        let companies = col.order[start..end]
            .iter()
            .map(|id| Company {
                id: *id,
                company_name: inner
                    .companies
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("Company {id}")),
                liked: liked.is_some_and(|m| m.contains(id)),
            })
            .collect();
        Ok((companies, total))
    }

    async fn contains(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<HashSet<i64>, ServiceError> {
        let inner = self.inner.read().await;
        let members = &inner.collection(collection_id)?.members;
        Ok(company_ids
            .iter()
            .copied()
            .filter(|id| members.contains(id))
            .collect())
    }

    async fn insert_members(
        &self,
        collection_id: &str,
        company_ids: &[i64],
    ) -> Result<u64, ServiceError> {
        // Simulated write latency, outside any lock.
        if !self.insert_latency.is_zero() {
            tokio::time::sleep(self.insert_latency * company_ids.len() as u32).await;
        }

        let mut inner = self.inner.write().await;
        let col = inner.collection_mut(collection_id)?;
        let mut added = 0u64;
        for id in company_ids {
            // Uniqueness constraint: a company appears at most once per collection.
            if col.members.insert(*id) {
                col.order.push(*id);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn missing_companies(&self, company_ids: &[i64]) -> Result<Vec<i64>, ServiceError> {
        let inner = self.inner.read().await;
        Ok(company_ids
            .iter()
            .copied()
            .filter(|id| !inner.companies.contains_key(id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemStore {
        MemStore::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn collections_and_lookup() {
        let store = store();
        let a = store.create_collection("My List").await;
        store.create_collection(LIKED_COLLECTION).await;

        let all = store.collections().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.collection(&a.id).await.unwrap().collection_name, "My List");
        assert!(matches!(
            store.collection("missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_skips_existing_members() {
        let store = store();
        let col = store.create_collection("My List").await;
        let ids = store.seed_companies("Company", 5).await;

        assert_eq!(store.insert_members(&col.id, &ids[..3]).await.unwrap(), 3);
        // Re-inserting an overlapping set only adds the new ids.
        assert_eq!(store.insert_members(&col.id, &ids).await.unwrap(), 2);
        assert_eq!(store.count_members(&col.id).await.unwrap(), 5);

        let existing = store.contains(&col.id, &ids).await.unwrap();
        assert_eq!(existing.len(), 5);
    }

    #[tokio::test]
    async fn member_pages_preserve_order() {
        let store = store();
        let col = store.create_collection("My List").await;
        let ids = store.seed_companies("Company", 7).await;
        store.insert_members(&col.id, &ids).await.unwrap();

        let first = store.member_ids_page(&col.id, 0, 3).await.unwrap();
        assert_eq!(first, ids[..3].to_vec());
        let last = store.member_ids_page(&col.id, 6, 3).await.unwrap();
        assert_eq!(last, ids[6..].to_vec());
        let beyond = store.member_ids_page(&col.id, 100, 3).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn liked_flag_comes_from_liked_collection() {
        let store = store();
        let list = store.create_collection("My List").await;
        let liked = store.create_collection(LIKED_COLLECTION).await;
        let ids = store.seed_companies("Company", 3).await;
        store.insert_members(&list.id, &ids).await.unwrap();
        store.insert_members(&liked.id, &ids[1..2]).await.unwrap();

        let (companies, total) = store.companies_page(&list.id, 0, 10).await.unwrap();
        assert_eq!(total, 3);
        assert!(!companies[0].liked);
        assert!(companies[1].liked);
        assert!(!companies[2].liked);
    }

    #[tokio::test]
    async fn missing_companies_reports_unknown_ids() {
        let store = store();
        let ids = store.seed_companies("Company", 2).await;
        let missing = store
            .missing_companies(&[ids[0], 999, ids[1], 1000])
            .await
            .unwrap();
        assert_eq!(missing, vec![999, 1000]);
    }
}
