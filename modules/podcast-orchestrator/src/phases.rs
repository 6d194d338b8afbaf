//! Per-site phase execution (spec §4.8 / C8). Phases 1-2 always run
//! against the local working tree; when `FILE_STORAGE_ENV` names a
//! remote environment, Phase 0 pulls existing remote artifacts down
//! first and Phase 3 pushes local gaps back up, so phases 1-2 never
//! re-download or re-transcribe audio already durable in the remote
//! store.

use podcast_blobstore::{BlobStore, LocalBlobStore};
use podcast_common::{CoreError, EnvConfig, Result, Site};
use podcast_sync::SyncMode;
use tracing::{error, info, warn};

use crate::run_log::SiteOutcome;

pub struct SiteRunConfig<'a> {
    pub env: &'a EnvConfig,
    pub site: &'a Site,
    pub dry_run: bool,
    pub reapply_corrections: bool,
}

pub async fn run_site(config: SiteRunConfig<'_>) -> SiteOutcome {
    let site_id = config.site.site_id.clone();
    match run_site_inner(&config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(site_id, error = %e, "site pipeline run failed");
            SiteOutcome {
                site_id,
                succeeded: false,
                episodes_discovered: 0,
                episodes_downloaded: 0,
                episodes_transcribed: 0,
                files_uploaded: 0,
                index_rebuilt: false,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn run_site_inner(config: &SiteRunConfig<'_>) -> Result<SiteOutcome> {
    let site = config.site;
    let env = config.env;
    let local_store = LocalBlobStore::new(&env.local_storage_root, &site.site_id);
    let remote_store = if env.storage_env.is_remote() {
        Some(podcast_blobstore::open(env, &site.site_id).await?)
    } else {
        None
    };

    if config.dry_run {
        info!(site_id = site.site_id, "dry run: skipping all mutating phases");
        return Ok(SiteOutcome {
            site_id: site.site_id.clone(),
            succeeded: true,
            episodes_discovered: 0,
            episodes_downloaded: 0,
            episodes_transcribed: 0,
            files_uploaded: 0,
            index_rebuilt: false,
            error: None,
        });
    }

    // Phase 0 — pre-sync blob -> local, so phases 1-2 never redo work
    // already durable remotely.
    let mut files_uploaded = 0;
    if let Some(remote) = &remote_store {
        pull_missing(remote.as_ref(), &local_store, &env.local_storage_root, &site.site_id).await?;
    }

    // Phase 1 — RSS retrieval.
    let retrieve_outcome = podcast_rss::retrieve(site, &local_store).await?;

    // Phase 2 — audio processing.
    let manifest = podcast_manifest::load(&local_store).await?;
    let corrections = load_corrections(env, site)?;
    let transcribe_outcome = podcast_transcribe::transcribe_all(
        env,
        &local_store,
        manifest.episodes(),
        &corrections,
        config.reapply_corrections,
    )
    .await?;

    // Phase 3 — consistency check + upload (local -> blob).
    if let Some(remote) = &remote_store {
        files_uploaded = push_gaps(&local_store, remote.as_ref(), &env.local_storage_root, &site.site_id).await?;
    }

    // Phase 4 — indexing trigger, gated on Phase 3 having uploaded
    // anything (or, in local-only mode, on new transcripts existing at all).
    let should_reindex = if remote_store.is_some() {
        files_uploaded > 0
    } else {
        transcribe_outcome.has_new_srt
    };

    let index_rebuilt = if should_reindex {
        let index_store: &dyn BlobStore = match &remote_store {
            Some(remote) => remote.as_ref(),
            None => &local_store,
        };
        podcast_index::rebuild_and_upload(index_store).await?;
        true
    } else {
        false
    };

    Ok(SiteOutcome {
        site_id: site.site_id.clone(),
        succeeded: true,
        episodes_discovered: retrieve_outcome.episodes_discovered,
        episodes_downloaded: retrieve_outcome.new_audio_keys.len(),
        episodes_transcribed: transcribe_outcome.new_srt_keys.len(),
        files_uploaded,
        index_rebuilt,
        error: None,
    })
}

/// Load the site's own corrections table and merge the operator-wide one
/// on top of it (spec §4.4.1 "merged with a custom (operator-scoped)
/// table"). Both files are optional; a missing one is an empty table.
fn load_corrections(env: &EnvConfig, site: &Site) -> Result<podcast_common::CorrectionsFile> {
    let site_table = match &site.corrections_path {
        Some(path) => podcast_common::CorrectionsFile::load_optional(path)?,
        None => podcast_common::CorrectionsFile::default(),
    };
    let operator_table = match &env.operator_corrections_path {
        Some(path) => podcast_common::CorrectionsFile::load_optional(path)?,
        None => podcast_common::CorrectionsFile::default(),
    };
    Ok(site_table.merged_with(&operator_table))
}

const SYNCED_CATEGORIES: &[&str] = &["audio", "transcripts", "episode-manifest", "rss"];

async fn pull_missing(remote: &dyn BlobStore, local: &LocalBlobStore, local_root: &str, site_id: &str) -> Result<()> {
    let report = podcast_sync::check(local_root, site_id, remote, SyncMode::BlobToLocal).await?;
    for category in SYNCED_CATEGORIES {
        let Some(gap) = report.by_category.get(*category) else { continue };
        for key in &gap.s3_only {
            match remote.get(key).await? {
                Some(bytes) => local.put(key, bytes).await?,
                None => warn!(key, "listed remotely but vanished before pull, skipping"),
            }
        }
    }
    Ok(())
}

async fn push_gaps(local: &LocalBlobStore, remote: &dyn BlobStore, local_root: &str, site_id: &str) -> Result<usize> {
    let report = podcast_sync::check(local_root, site_id, remote, SyncMode::LocalToBlob).await?;
    let mut uploaded = 0;
    for category in SYNCED_CATEGORIES {
        let Some(gap) = report.by_category.get(*category) else { continue };
        for key in &gap.local_only {
            match local.get(key).await {
                Ok(Some(bytes)) => {
                    // Bounded retry: a single transient failure doesn't
                    // abort the whole upload batch (spec §4.8 phase 3).
                    match upload_with_retry(remote, key, bytes).await {
                        Ok(()) => uploaded += 1,
                        Err(e) => warn!(key, error = %e, "upload failed after retries, recording gap"),
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "failed to read local file for upload"),
            }
        }
    }
    Ok(uploaded)
}

async fn upload_with_retry(remote: &dyn BlobStore, key: &str, bytes: bytes::Bytes) -> Result<()> {
    let mut last_err = None;
    for attempt in 0..3 {
        match remote.put(key, bytes.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = Some(e);
                if attempt < 2 {
                    tokio::time::sleep(std::time::Duration::from_millis(200 * (attempt + 1) as u64)).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| CoreError::TransientIO("upload retries exhausted".to_string())))
}
