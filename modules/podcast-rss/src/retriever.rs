use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use podcast_blobstore::BlobStore;
use podcast_common::{Result, Site};
use podcast_manifest::{self as manifest, Episode, Manifest};
use tracing::{info, warn};

use crate::feed::{FeedFetcher, ParsedItem};
use crate::retry::with_retry;

const DOWNLOAD_MAX_RETRIES: u32 = 3;
const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 6;
const DEFAULT_FEED_CONCURRENCY: usize = 4;

/// Result struct a stage hands back to the orchestrator instead of
/// emitting an in-process event (spec §9 "event-driven gating → explicit
/// results").
#[derive(Debug, Default)]
pub struct RetrieveOutcome {
    pub has_new_audio: bool,
    pub new_audio_keys: Vec<String>,
    pub episodes_discovered: usize,
    pub download_failures: usize,
}

/// Run one RSS retrieval cycle for a site (spec §4.3 / C3).
pub async fn retrieve(site: &Site, store: &dyn BlobStore) -> Result<RetrieveOutcome> {
    let mut current = manifest::load(store).await?;
    let fetcher = FeedFetcher::new();
    let mut outcome = RetrieveOutcome::default();
    let mut downloads: Vec<(u64, String, String)> = Vec::new(); // (id, feed_id, audio_url)

    // Feeds are fetched concurrently, bounded (spec §4.3 step 1); the
    // manifest mutation below stays sequential once results are back.
    let fetched: Vec<(String, Result<Vec<ParsedItem>>)> = stream::iter(&site.feeds)
        .map(|feed| {
            let fetcher = &fetcher;
            async move { (feed.feed_id.clone(), fetcher.fetch(&feed.url).await) }
        })
        .buffer_unordered(DEFAULT_FEED_CONCURRENCY)
        .collect()
        .await;

    for (feed_id, result) in fetched {
        let items = match result {
            Ok(items) => items,
            Err(e) => {
                // Per-feed errors isolate that feed (spec §4.3 failure policy).
                warn!(feed_id, error = %e, "feed retrieval failed, skipping feed");
                continue;
            }
        };

        for item in items {
            outcome.episodes_discovered += 1;
            if let Some(pending) = assign_episode(&mut current, &feed_id, item) {
                downloads.push(pending);
            }
        }
    }

    if !downloads.is_empty() {
        let new_keys = download_all(store, &mut current, downloads).await;
        outcome.download_failures = new_keys.failures;
        if !new_keys.keys.is_empty() {
            outcome.has_new_audio = true;
            outcome.new_audio_keys = new_keys.keys;
            manifest::save(store, &current).await?;
        }
    }

    info!(
        discovered = outcome.episodes_discovered,
        downloaded = outcome.new_audio_keys.len(),
        failures = outcome.download_failures,
        "rss retrieval cycle complete"
    );
    Ok(outcome)
}

/// Assign a `sequentialId`/`fileKey` to a freshly parsed item, resolving the
/// duplicate-`fileKey`-different-URL case per SPEC_FULL §8 open question 1:
/// the first-seen URL for a `fileKey` keeps it; a later item with the same
/// `fileKey` but a different URL gets a disambiguated `{fileKey}-{n}`.
/// Returns `Some((sequential_id, feed_id, audio_url))` when this item still
/// needs its audio downloaded.
fn assign_episode(manifest: &mut Manifest, feed_id: &str, item: ParsedItem) -> Option<(u64, String, String)> {
    let base_key = match podcast_keygen::file_key(&item.title, &item.published_at_raw) {
        Ok(key) => key,
        Err(e) => {
            warn!(title = item.title, error = %e, "unparseable publish date, skipping item");
            return None;
        }
    };

    if let Some(existing) = manifest.find_existing(&base_key, &item.audio_url) {
        // Already known — either by fileKey (possible retitle) or by URL.
        // The fileKey stays as originally assigned either way; if the prior
        // download never succeeded, re-queue it instead of leaving it stuck.
        if existing.downloaded_at_iso.is_none() {
            return Some((existing.sequential_id, feed_id.to_string(), item.audio_url));
        }
        return None;
    }

    let mut file_key = base_key.clone();
    let mut suffix = 1;
    while manifest.by_file_key(&file_key).is_some() {
        file_key = format!("{base_key}-{suffix}");
        suffix += 1;
    }

    let sequential_id = manifest.next_sequential_id();
    manifest.push_new(Episode {
        sequential_id,
        file_key: file_key.clone(),
        title: item.title,
        original_audio_url: item.audio_url.clone(),
        published_at_iso: item.published_at.to_rfc3339(),
        published_at_unix_ms: item.published_at.timestamp_millis(),
        feed_id: feed_id.to_string(),
        downloaded_at_iso: None,
    });

    Some((sequential_id, feed_id.to_string(), item.audio_url))
}

struct DownloadBatchResult {
    keys: Vec<String>,
    failures: usize,
}

/// Download every pending episode's audio, bounded concurrency (spec §4.3
/// step 4, §5 "configurable concurrency cap (default ~4-8)").
async fn download_all(
    store: &dyn BlobStore,
    manifest: &mut Manifest,
    pending: Vec<(u64, String, String)>,
) -> DownloadBatchResult {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .expect("failed to build audio download client");

    // Resolve file_key per id before the concurrent phase — manifest is
    // mutated sequentially below as results come back.
    let work: Vec<(u64, String, String, String)> = pending
        .into_iter()
        .filter_map(|(id, feed_id, url)| {
            manifest
                .episodes()
                .iter()
                .find(|e| e.sequential_id == id)
                .map(|e| (id, feed_id, url, e.file_key.clone()))
        })
        .collect();

    let results: Vec<(u64, String, Result<bool>)> = stream::iter(work)
        .map(|(id, feed_id, url, file_key)| {
            let client = client.clone();
            async move {
                let key = format!("audio/{feed_id}/{file_key}.mp3");
                let result = download_one(store, &client, &key, &url).await;
                (id, key, result)
            }
        })
        .buffer_unordered(DEFAULT_DOWNLOAD_CONCURRENCY)
        .collect()
        .await;

    let mut keys = Vec::new();
    let mut failures = 0;
    let now = Utc::now();
    for (id, key, result) in results {
        match result {
            Ok(true) => {
                manifest.mark_downloaded(id, now);
                keys.push(key);
            }
            Ok(false) => {
                // Already present with non-zero length; not new, but the
                // episode is still considered downloaded.
                manifest.mark_downloaded(id, now);
            }
            Err(e) => {
                failures += 1;
                warn!(key, error = %e, "audio download failed, skipping episode");
            }
        }
    }

    DownloadBatchResult { keys, failures }
}

/// Download a single audio file, streaming to the blob store. Skips if the
/// target already exists with non-zero length (spec §4.3 step 4).
/// Returns `Ok(true)` if new bytes were written.
async fn download_one(
    store: &dyn BlobStore,
    client: &reqwest::Client,
    key: &str,
    url: &str,
) -> Result<bool> {
    if let Some(existing) = store.get(key).await? {
        if !existing.is_empty() {
            return Ok(false);
        }
    }

    let bytes: Bytes = with_retry(DOWNLOAD_MAX_RETRIES, || async {
        client.get(url).send().await?.error_for_status()?.bytes().await
    })
    .await?;

    store.put(key, bytes).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_manifest::Episode;

    fn sample_episode(id: u64, file_key: &str, url: &str) -> Episode {
        Episode {
            sequential_id: id,
            file_key: file_key.to_string(),
            title: "T".to_string(),
            original_audio_url: url.to_string(),
            published_at_iso: "2020-01-06T00:00:00Z".to_string(),
            published_at_unix_ms: 0,
            feed_id: "feedA".to_string(),
            downloaded_at_iso: None,
        }
    }

    #[test]
    fn duplicate_file_key_different_url_gets_disambiguated() {
        let mut manifest = Manifest::default();
        manifest.push_new(sample_episode(1, "2020-01-06_ep", "https://x/a.mp3"));

        let item = ParsedItem {
            title: "Ep".to_string(),
            audio_url: "https://x/different.mp3".to_string(),
            published_at: chrono::DateTime::parse_from_rfc3339("2020-01-06T00:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            published_at_raw: "2020-01-06T00:00:00Z".to_string(),
        };

        let result = assign_episode(&mut manifest, "feedA", item);
        assert!(result.is_some());
        let new_key = &manifest.episodes()[1].file_key;
        assert_ne!(new_key, "2020-01-06_ep");
        assert!(new_key.starts_with("2020-01-06_ep-"));
    }

    #[test]
    fn same_file_key_and_url_is_not_reassigned() {
        let mut manifest = Manifest::default();
        manifest.push_new(sample_episode(1, "2020-01-06_ep", "https://x/a.mp3"));

        let item = ParsedItem {
            title: "Ep".to_string(),
            audio_url: "https://x/a.mp3".to_string(),
            published_at: chrono::Utc::now(),
            published_at_raw: "2020-01-06T00:00:00Z".to_string(),
        };

        let result = assign_episode(&mut manifest, "feedA", item);
        assert!(result.is_none());
        assert_eq!(manifest.episodes().len(), 1);
    }
}
