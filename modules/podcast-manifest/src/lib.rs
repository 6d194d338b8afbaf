//! Episode manifest: the canonical, single-writer source of episode
//! identity and timestamps for a site (spec §3/§4.9 / C9).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use podcast_blobstore::BlobStore;
use podcast_common::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Well-known key under which the manifest lives (spec §6).
pub const MANIFEST_KEY: &str = "episode-manifest/full-episode-manifest.json";

/// One episode, immutable once assigned (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(rename = "sequentialId")]
    pub sequential_id: u64,
    #[serde(rename = "fileKey")]
    pub file_key: String,
    pub title: String,
    #[serde(rename = "originalAudioURL")]
    pub original_audio_url: String,
    #[serde(rename = "publishedAtIso")]
    pub published_at_iso: String,
    #[serde(rename = "publishedAtUnixMs")]
    pub published_at_unix_ms: i64,
    #[serde(rename = "feedId")]
    pub feed_id: String,
    #[serde(rename = "downloadedAtIso")]
    pub downloaded_at_iso: Option<String>,
}

/// Ordered sequence of episodes for one site (spec §3/§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    episodes: Vec<Episode>,
}

impl Manifest {
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn next_sequential_id(&self) -> u64 {
        self.episodes.iter().map(|e| e.sequential_id).max().unwrap_or(0) + 1
    }

    /// Look up an existing episode by `fileKey` OR `originalAudioURL`
    /// (spec §4.3 step 3 — matching on either is how a retitled episode
    /// keeps its `sequentialId`).
    pub fn find_existing(&self, file_key: &str, original_audio_url: &str) -> Option<&Episode> {
        self.episodes
            .iter()
            .find(|e| e.file_key == file_key || e.original_audio_url == original_audio_url)
    }

    /// Insert a freshly assigned episode. Panics if its `sequentialId` or
    /// `fileKey` collides with an existing entry — callers must resolve
    /// collisions (see `podcast-rss`'s duplicate-fileKey policy) before
    /// calling this.
    pub fn push_new(&mut self, episode: Episode) {
        debug_assert!(
            self.episodes.iter().all(|e| e.sequential_id != episode.sequential_id),
            "sequentialId must be unique"
        );
        debug_assert!(
            self.episodes.iter().all(|e| e.file_key != episode.file_key),
            "fileKey must be unique within a site"
        );
        self.episodes.push(episode);
    }

    pub fn mark_downloaded(&mut self, sequential_id: u64, at: DateTime<Utc>) {
        if let Some(e) = self.episodes.iter_mut().find(|e| e.sequential_id == sequential_id) {
            e.downloaded_at_iso = Some(at.to_rfc3339());
        }
    }

    pub fn by_file_key(&self, file_key: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.file_key == file_key)
    }
}

/// Load the manifest for a site. An absent blob is treated as an empty
/// manifest, not an error (spec §4.9).
pub async fn load(store: &dyn BlobStore) -> Result<Manifest> {
    match store.get(MANIFEST_KEY).await? {
        Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::InputInvariantViolation(format!("malformed manifest: {e}"))
        }),
        None => Ok(Manifest::default()),
    }
}

/// Rewrite the manifest as a whole-file replacement (spec §4.9). The
/// underlying `BlobStore::put` is write-then-rename in local mode and a
/// single PUT in remote mode, so this call itself is the atomic unit.
pub async fn save(store: &dyn BlobStore, manifest: &Manifest) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(manifest)
        .map_err(|e| CoreError::Other(anyhow::anyhow!("failed to serialize manifest: {e}")))?;
    store.put(MANIFEST_KEY, Bytes::from(bytes)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_blobstore::LocalBlobStore;

    fn sample_episode(id: u64, file_key: &str, url: &str) -> Episode {
        Episode {
            sequential_id: id,
            file_key: file_key.to_string(),
            title: "Some Title".to_string(),
            original_audio_url: url.to_string(),
            published_at_iso: "2020-01-06T12:00:00Z".to_string(),
            published_at_unix_ms: 1578312000000,
            feed_id: "feedA".to_string(),
            downloaded_at_iso: None,
        }
    }

    #[test]
    fn sequential_ids_are_monotonic_and_contiguous() {
        let mut manifest = Manifest::default();
        assert_eq!(manifest.next_sequential_id(), 1);
        manifest.push_new(sample_episode(1, "2020-01-06_a", "https://x/a.mp3"));
        assert_eq!(manifest.next_sequential_id(), 2);
        manifest.push_new(sample_episode(2, "2020-01-07_b", "https://x/b.mp3"));
        assert_eq!(manifest.next_sequential_id(), 3);
    }

    #[test]
    fn find_existing_matches_by_file_key_or_url() {
        let mut manifest = Manifest::default();
        manifest.push_new(sample_episode(1, "2020-01-06_a", "https://x/a.mp3"));

        assert!(manifest.find_existing("2020-01-06_a", "https://different").is_some());
        assert!(manifest.find_existing("different-key", "https://x/a.mp3").is_some());
        assert!(manifest.find_existing("nope", "https://nope").is_none());
    }

    #[tokio::test]
    async fn absent_manifest_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap(), "site-a");
        let manifest = load(&store).await.unwrap();
        assert!(manifest.episodes().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap(), "site-a");
        let mut manifest = Manifest::default();
        manifest.push_new(sample_episode(1, "2020-01-06_a", "https://x/a.mp3"));
        save(&store, &manifest).await.unwrap();

        let loaded = load(&store).await.unwrap();
        assert_eq!(loaded.episodes().len(), 1);
        assert_eq!(loaded.episodes()[0].file_key, "2020-01-06_a");
    }
}
