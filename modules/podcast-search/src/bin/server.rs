//! Search HTTP server entry point (spec §4.6).

use std::sync::Arc;

use podcast_blobstore::BlobStore;
use podcast_common::EnvConfig;
use podcast_search::{build_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvConfig::from_env()?;

    let filter = EnvFilter::try_new(&env.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if env.storage_env.is_remote() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let site_id = env.require_site_id()?;
    let store: Arc<dyn BlobStore> = Arc::from(podcast_blobstore::open(&env, site_id).await?);
    let allowed_origin = std::env::var("SEARCH_ALLOWED_ORIGIN").ok();

    let router = build_router(AppState::new(store), allowed_origin.as_deref());

    let addr = std::env::var("SEARCH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, site_id, "search server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
