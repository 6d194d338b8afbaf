//! SRT indexer: builds the persisted search index from transcripts
//! (spec §4.5 / C5).

mod build;
mod persist;
mod schema;

pub use build::build_index;
pub use persist::{deserialize_compressed, serialize_compressed};
pub use schema::{SearchEntry, SearchIndex};

use podcast_blobstore::BlobStore;
use podcast_common::Result;
use tracing::info;

pub const INDEX_KEY: &str = "search-index/orama_index.msp";

/// Rebuild the full index and upload it atomically (spec §4.5 step 6 —
/// atomicity is provided by the blob store backend: `put` is a single
/// whole-object write on both the local write-then-rename path and S3's
/// `PutObject`).
pub async fn rebuild_and_upload(store: &dyn BlobStore) -> Result<SearchIndex> {
    let index = build::build_index(store).await?;
    let compressed = persist::serialize_compressed(&index)?;
    info!(
        entries = index.len(),
        compressed_bytes = compressed.len(),
        "rebuilt search index"
    );
    store.put(INDEX_KEY, compressed.into()).await?;
    Ok(index)
}

/// Load the persisted index, if present.
pub async fn load(store: &dyn BlobStore) -> Result<Option<SearchIndex>> {
    match store.get(INDEX_KEY).await? {
        Some(bytes) => Ok(Some(persist::deserialize_compressed(&bytes)?)),
        None => Ok(None),
    }
}
