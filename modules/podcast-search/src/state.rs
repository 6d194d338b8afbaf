//! Process-lifetime cached index handle, restored lazily on first request
//! (spec §4.6 cold start — no TTL, restart-to-refresh per SPEC_FULL §8).

use std::sync::Arc;

use podcast_blobstore::BlobStore;
use podcast_index::SearchIndex;
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::SearchApiError;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn BlobStore>,
    index: Arc<OnceCell<Arc<SearchIndex>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store, index: Arc::new(OnceCell::new()) }
    }

    /// Restore the index on first call, then return the cached handle for
    /// the rest of the process lifetime.
    pub async fn ensure_index(&self) -> Result<Arc<SearchIndex>, SearchApiError> {
        self.index
            .get_or_try_init(|| async {
                let loaded = podcast_index::load(self.store.as_ref())
                    .await
                    .map_err(SearchApiError::from)?
                    .ok_or(SearchApiError::IndexUnavailable)?;
                info!(entries = loaded.len(), "search index restored into process cache");
                Ok(Arc::new(loaded))
            })
            .await
            .map(|index| index.clone())
    }
}
