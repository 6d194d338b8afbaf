//! Index build: enumerate transcripts, resolve episode metadata, parse
//! cues into Search Entries (spec §4.5 steps 1-4).

use std::collections::HashMap;

use podcast_blobstore::BlobStore;
use podcast_common::Result;
use podcast_manifest::{self as manifest, Episode};
use podcast_transcribe::parse_srt;
use tracing::warn;

use crate::schema::{SearchEntry, SearchIndex};

const TRANSCRIPTS_PREFIX: &str = "transcripts/";

/// Build the full search index for a site by enumerating every transcript
/// currently in the blob store.
pub async fn build_index(store: &dyn BlobStore) -> Result<SearchIndex> {
    let manifest = manifest::load(store).await?;
    let by_file_key: HashMap<&str, &Episode> =
        manifest.episodes().iter().map(|e| (e.file_key.as_str(), e)).collect();

    let srt_keys = store.list(TRANSCRIPTS_PREFIX).await?;
    let mut entries = Vec::new();

    for key in srt_keys {
        let Some(file_key) = file_key_from_srt_path(&key) else {
            warn!(key, "unrecognized transcript key, skipping");
            continue;
        };
        let Some(episode) = by_file_key.get(file_key.as_str()) else {
            warn!(key, "transcript has no matching manifest entry, skipping");
            continue;
        };

        let Some(bytes) = store.get(&key).await? else { continue };
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(_) => {
                warn!(key, "transcript is not valid utf-8, skipping");
                continue;
            }
        };
        let cues = match parse_srt(text) {
            Ok(cues) => cues,
            Err(e) => {
                warn!(key, error = %e, "malformed transcript, skipping");
                continue;
            }
        };

        for (cue_index, cue) in cues.iter().enumerate() {
            entries.push(SearchEntry {
                id: format!("{}:{}", episode.sequential_id, cue_index),
                text: cue.text.clone(),
                sequential_episode_id_as_string: episode.sequential_id.to_string(),
                start_time_ms: cue.start_ms,
                end_time_ms: cue.end_ms,
                episode_published_unix_timestamp: episode.published_at_unix_ms / 1000,
            });
        }
    }

    Ok(SearchIndex { entries })
}

/// `transcripts/{feedId}/{fileKey}.srt` -> `fileKey`.
fn file_key_from_srt_path(key: &str) -> Option<String> {
    let rest = key.strip_prefix(TRANSCRIPTS_PREFIX)?;
    let file_name = rest.rsplit('/').next()?;
    file_name.strip_suffix(".srt").map(|s| s.to_string())
}
