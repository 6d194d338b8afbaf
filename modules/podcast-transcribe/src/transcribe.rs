//! Orchestration for C4: probe, split, dispatch to the configured
//! provider, rebase and deduplicate cues, apply spelling corrections,
//! write the resulting SRT (spec §4.4).

use podcast_blobstore::BlobStore;
use podcast_common::{CorrectionsFile, CoreError, EnvConfig, Result};
use podcast_manifest::Episode;
use tracing::{info, warn};

use crate::audio::{self, Chunk, CHUNK_OVERLAP_SECS};
use crate::corrections::{CorrectionEngine, CorrectionReport};
use crate::providers::Provider;
use crate::retry::with_retry;
use crate::srt::{self, Cue};

const CHUNK_TRANSCRIBE_MAX_RETRIES: u32 = 3;

#[derive(Debug, Default)]
pub struct TranscribeOutcome {
    pub has_new_srt: bool,
    pub new_srt_keys: Vec<String>,
    pub transcription_failures: usize,
}

fn srt_key(episode: &Episode) -> String {
    format!("transcripts/{}/{}.srt", episode.feed_id, episode.file_key)
}

fn audio_key(episode: &Episode) -> String {
    format!("audio/{}/{}.mp3", episode.feed_id, episode.file_key)
}

/// Transcribe every episode in `episodes` that doesn't already have a
/// non-empty SRT, unless `force` is set (spec §8 "reapply corrections"
/// resolution covers the force path; this covers first-time transcription).
pub async fn transcribe_all(
    env: &EnvConfig,
    store: &dyn BlobStore,
    episodes: &[Episode],
    corrections: &CorrectionsFile,
    force: bool,
) -> Result<TranscribeOutcome> {
    let provider = Provider::from_env(env)?;
    let engine = CorrectionEngine::compile(&corrections.corrections_to_apply)?;
    let ffprobe = audio::resolve_tool(env, "ffprobe");
    let ffmpeg = audio::resolve_tool(env, "ffmpeg");

    // Verify the audio toolchain and transcription backend are usable
    // before touching any episode (spec §4.4 startup check).
    audio::check_tool_available(&ffprobe).await?;
    audio::check_tool_available(&ffmpeg).await?;
    provider
        .health_check()
        .await
        .map_err(|e| CoreError::config(format!("transcription provider unavailable at startup: {e}")))?;

    let mut outcome = TranscribeOutcome::default();

    for episode in episodes {
        let target_key = srt_key(episode);
        if !force {
            if let Some(existing) = store.get(&target_key).await? {
                if !existing.is_empty() {
                    continue;
                }
            }
        }

        match transcribe_one(store, &provider, &engine, &ffprobe, &ffmpeg, episode, &target_key).await {
            Ok(()) => {
                outcome.has_new_srt = true;
                outcome.new_srt_keys.push(target_key);
            }
            Err(e) => {
                outcome.transcription_failures += 1;
                warn!(file_key = episode.file_key, error = %e, "transcription failed, skipping episode");
            }
        }
    }

    info!(
        transcribed = outcome.new_srt_keys.len(),
        failures = outcome.transcription_failures,
        "transcription cycle complete"
    );
    Ok(outcome)
}

async fn transcribe_one(
    store: &dyn BlobStore,
    provider: &Provider,
    engine: &CorrectionEngine,
    ffprobe: &str,
    ffmpeg: &str,
    episode: &Episode,
    target_key: &str,
) -> Result<()> {
    let audio_bytes = store
        .get(&audio_key(episode))
        .await?
        .ok_or_else(|| CoreError::not_found(format!("audio blob missing for {}", episode.file_key)))?;

    let work_dir = tempfile::tempdir().map_err(|e| CoreError::TransientIO(e.to_string()))?;
    let audio_path = work_dir.path().join("source.mp3");
    tokio::fs::write(&audio_path, &audio_bytes)
        .await
        .map_err(|e| CoreError::TransientIO(e.to_string()))?;

    let result = run_chunks(provider, ffprobe, ffmpeg, &audio_path, work_dir.path()).await;
    audio::cleanup_work_dir(work_dir.path()).await;
    let mut cues = result?;

    cues.sort_by_key(|c| c.start_ms);
    let cues = dedupe_overlap(cues);

    let mut report = CorrectionReport::default();
    let corrected: Vec<Cue> = cues
        .into_iter()
        .map(|cue| Cue { text: engine.apply(&cue.text, &mut report), ..cue })
        .collect();

    if !report.counts.is_empty() {
        info!(file_key = episode.file_key, corrections = ?report.counts, "applied spelling corrections");
    }

    let rendered = srt::render(&corrected);
    store.put(target_key, rendered.into_bytes().into()).await?;
    Ok(())
}

async fn run_chunks(
    provider: &Provider,
    ffprobe: &str,
    ffmpeg: &str,
    audio_path: &std::path::Path,
    work_dir: &std::path::Path,
) -> Result<Vec<Cue>> {
    let duration = audio::probe_duration_secs(ffprobe, audio_path).await?;
    let chunks = audio::split_into_chunks(ffmpeg, audio_path, duration, work_dir).await?;

    let mut all_cues = Vec::new();
    for chunk in &chunks {
        let cues = transcribe_chunk(provider, chunk).await?;
        all_cues.extend(cues);
    }
    Ok(all_cues)
}

async fn transcribe_chunk(provider: &Provider, chunk: &Chunk) -> Result<Vec<Cue>> {
    let bytes = tokio::fs::read(&chunk.path).await.map_err(|e| CoreError::TransientIO(e.to_string()))?;
    let raw_srt = with_retry(CHUNK_TRANSCRIBE_MAX_RETRIES, || provider.transcribe_chunk(&bytes)).await?;
    let offset_ms = (chunk.offset_secs * 1000.0).round() as i64;
    let cues = srt::parse(&raw_srt)?
        .into_iter()
        .map(|cue| Cue {
            start_ms: cue.start_ms + offset_ms,
            end_ms: cue.end_ms + offset_ms,
            text: cue.text,
        })
        .collect();
    Ok(cues)
}

/// Drop cues that fall inside the overlap window of a later chunk,
/// preferring the earlier chunk's cue for any given moment (spec §4.4
/// "prefer earlier chunk" resolution for overlap handling).
fn dedupe_overlap(cues: Vec<Cue>) -> Vec<Cue> {
    let overlap_ms = (CHUNK_OVERLAP_SECS * 1000.0) as i64;
    let mut out: Vec<Cue> = Vec::with_capacity(cues.len());
    for cue in cues {
        if let Some(last) = out.last() {
            if cue.start_ms < last.end_ms && cue.start_ms - last.start_ms < overlap_ms && cue.text == last.text {
                continue;
            }
        }
        out.push(cue);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_drops_exact_repeat_within_overlap_window() {
        let cues = vec![
            Cue { start_ms: 0, end_ms: 1000, text: "a".into() },
            Cue { start_ms: 900, end_ms: 1900, text: "a".into() },
            Cue { start_ms: 2000, end_ms: 3000, text: "b".into() },
        ];
        let deduped = dedupe_overlap(cues);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].text, "a");
        assert_eq!(deduped[1].text, "b");
    }

    #[test]
    fn dedupe_keeps_distinct_text_even_within_window() {
        let cues = vec![
            Cue { start_ms: 0, end_ms: 1000, text: "a".into() },
            Cue { start_ms: 900, end_ms: 1900, text: "different".into() },
        ];
        let deduped = dedupe_overlap(cues);
        assert_eq!(deduped.len(), 2);
    }
}
