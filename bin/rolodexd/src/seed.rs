//! Startup seeding for the in-memory store.

use rolodex_collections::store::{MemStore, LIKED_COLLECTION};
use tracing::info;

/// Create the stock collections and fill the source list with `count`
/// companies. "My List" holds every seeded company; the liked and
/// ignore lists start empty so bulk transfers into them are visible
/// end to end.
pub async fn populate(store: &MemStore, count: usize) {
    let my_list = store.create_collection("My List").await;
    let liked = store.create_collection(LIKED_COLLECTION).await;
    let ignored = store.create_collection("Companies to Ignore").await;

    let ids = store.seed_companies("Company", count).await;
    store.seed_members(&my_list.id, &ids).await;

    info!(
        "collections ready: {} ({} companies), {}, {}",
        my_list.collection_name, count, liked.collection_name, ignored.collection_name
    );
}
