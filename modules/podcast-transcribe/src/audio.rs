//! ffprobe/ffmpeg subprocess plumbing: duration probing and chunk
//! splitting with overlap (spec §4.4).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use podcast_common::{CoreError, EnvConfig};
use tokio::process::Command;
use tracing::{debug, warn};

/// Overlap window between adjacent chunks, used both when splitting and
/// when deduplicating cues across chunk boundaries.
pub const CHUNK_OVERLAP_SECS: f64 = 30.0;
/// Episodes shorter than this are transcribed in a single pass.
pub const CHUNK_TARGET_SECS: f64 = 600.0;
const MANAGED_RUNTIME_BIN_DIR: &str = "/opt/bin";

/// Resolve the ffmpeg/ffprobe binary name to an absolute path, preferring
/// `TRANSCODE_TOOL_PATH`, then the managed-runtime well-known directory,
/// then falling back to the bare name (resolved via `PATH`).
pub fn resolve_tool(env: &EnvConfig, name: &str) -> String {
    if let Some(configured) = &env.transcode_tool_path {
        let candidate = Path::new(configured).join(name);
        if candidate.exists() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    let managed = Path::new(MANAGED_RUNTIME_BIN_DIR).join(name);
    if managed.exists() {
        return managed.to_string_lossy().into_owned();
    }
    name.to_string()
}

/// Probe an audio file's duration in seconds via `ffprobe`.
pub async fn probe_duration_secs(ffprobe_path: &str, audio_path: &Path) -> Result<f64, CoreError> {
    let output = Command::new(ffprobe_path)
        .args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(audio_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CoreError::TransientIO(format!("failed to spawn ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(CoreError::UpstreamFailure(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|e| CoreError::UpstreamFailure(format!("unparseable ffprobe duration: {e}")))
}

/// One chunk of the source audio: its file on disk and the offset (in
/// seconds) at which it starts within the original file, used later to
/// rebase cue timestamps back to absolute time.
pub struct Chunk {
    pub path: PathBuf,
    pub offset_secs: f64,
}

/// Split `audio_path` into overlapping chunks if its duration exceeds
/// `CHUNK_TARGET_SECS`, writing each chunk into `work_dir`. Returns a
/// single chunk covering the whole file when it's short enough.
pub async fn split_into_chunks(
    ffmpeg_path: &str,
    audio_path: &Path,
    duration_secs: f64,
    work_dir: &Path,
) -> Result<Vec<Chunk>, CoreError> {
    if duration_secs <= CHUNK_TARGET_SECS {
        return Ok(vec![Chunk { path: audio_path.to_path_buf(), offset_secs: 0.0 }]);
    }

    let stride = CHUNK_TARGET_SECS - CHUNK_OVERLAP_SECS;
    let mut chunks = Vec::new();
    let mut offset = 0.0;
    let mut index = 0;

    while offset < duration_secs {
        let chunk_path = work_dir.join(format!("chunk-{index:04}.mp3"));
        let length = (CHUNK_TARGET_SECS).min(duration_secs - offset);

        let status = Command::new(ffmpeg_path)
            .args(["-y", "-v", "error", "-ss"])
            .arg(format!("{offset}"))
            .arg("-t")
            .arg(format!("{length}"))
            .arg("-i")
            .arg(audio_path)
            .args(["-acodec", "copy"])
            .arg(&chunk_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .status()
            .await
            .map_err(|e| CoreError::TransientIO(format!("failed to spawn ffmpeg: {e}")))?;

        if !status.success() {
            return Err(CoreError::UpstreamFailure(format!("ffmpeg chunk split failed at offset {offset}")));
        }

        debug!(index, offset, length, "wrote audio chunk");
        chunks.push(Chunk { path: chunk_path, offset_secs: offset });
        index += 1;
        offset += stride;
    }

    Ok(chunks)
}

/// Verify a resolved tool actually runs, for the startup toolchain check
/// (spec §4.4 "verify audio toolchain availability before any processing;
/// fail with actionable error if absent").
pub async fn check_tool_available(path: &str) -> Result<(), CoreError> {
    let status = Command::new(path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| CoreError::config(format!("audio tool '{path}' is not runnable: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(CoreError::config(format!("audio tool '{path}' exited with {status} during startup check")))
    }
}

/// Remove every file under `work_dir` on exit, regardless of the caller's
/// success or failure path.
pub async fn cleanup_work_dir(work_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(?work_dir, error = %e, "failed to clean up transcription work directory");
        }
    }
}
