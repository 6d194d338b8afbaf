//! Pipeline run log: Markdown, newest entries at top, header preserved
//! across appends (SPEC_FULL §5, spec §6).

use chrono::{DateTime, Utc};
use podcast_blobstore::BlobStore;
use podcast_common::{CoreError, Result};

const HEADER: &str = "# Ingestion Pipeline Run History";
const LOCAL_RUN_LOG_KEY: &str = "PIPELINE_RUN_LOG.md";
const REMOTE_RUN_LOG_KEY: &str = "run-log/history.md";

pub struct SiteOutcome {
    pub site_id: String,
    pub succeeded: bool,
    pub episodes_discovered: usize,
    pub episodes_downloaded: usize,
    pub episodes_transcribed: usize,
    pub files_uploaded: usize,
    pub index_rebuilt: bool,
    pub error: Option<String>,
}

pub fn run_log_key(is_remote: bool) -> &'static str {
    if is_remote {
        REMOTE_RUN_LOG_KEY
    } else {
        LOCAL_RUN_LOG_KEY
    }
}

fn render_entry(started_at: DateTime<Utc>, duration_ms: i64, outcomes: &[SiteOutcome]) -> String {
    let mut entry = format!(
        "## Run at {} ({} ms)\n\n",
        started_at.to_rfc3339(),
        duration_ms
    );
    for outcome in outcomes {
        let status = if outcome.succeeded { "OK" } else { "FAILED" };
        entry.push_str(&format!(
            "- **{}** [{status}] discovered={} downloaded={} transcribed={} uploaded={} index_rebuilt={}",
            outcome.site_id,
            outcome.episodes_discovered,
            outcome.episodes_downloaded,
            outcome.episodes_transcribed,
            outcome.files_uploaded,
            outcome.index_rebuilt,
        ));
        if let Some(err) = &outcome.error {
            entry.push_str(&format!(" error=\"{err}\""));
        }
        entry.push('\n');
    }
    entry.push('\n');
    entry
}

/// Prepend a run entry under the header, creating the log with its header
/// if it doesn't exist yet.
pub async fn append_run(
    store: &dyn BlobStore,
    is_remote: bool,
    started_at: DateTime<Utc>,
    duration_ms: i64,
    outcomes: &[SiteOutcome],
) -> Result<()> {
    let key = run_log_key(is_remote);
    let existing = match store.get(key).await? {
        Some(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|e| CoreError::InputInvariantViolation(format!("run log is not valid utf-8: {e}")))?,
        None => String::new(),
    };

    let body = existing.strip_prefix(HEADER).unwrap_or(existing.as_str()).trim_start();
    let new_entry = render_entry(started_at, duration_ms, outcomes);
    let rendered = format!("{HEADER}\n\n{new_entry}{body}");

    store.put(key, rendered.into_bytes().into()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_blobstore::LocalBlobStore;
    use tempfile::tempdir;

    fn outcome(site_id: &str) -> SiteOutcome {
        SiteOutcome {
            site_id: site_id.to_string(),
            succeeded: true,
            episodes_discovered: 1,
            episodes_downloaded: 1,
            episodes_transcribed: 1,
            files_uploaded: 2,
            index_rebuilt: true,
            error: None,
        }
    }

    #[tokio::test]
    async fn header_is_preserved_and_entries_prepend() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap(), "site-a");

        let t1 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        append_run(&store, false, t1, 100, &[outcome("a")]).await.unwrap();

        let t2 = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z").unwrap().with_timezone(&Utc);
        append_run(&store, false, t2, 200, &[outcome("a")]).await.unwrap();

        let content = String::from_utf8(store.get(LOCAL_RUN_LOG_KEY).await.unwrap().unwrap().to_vec()).unwrap();
        assert!(content.starts_with(HEADER));
        let first_run_pos = content.find("2026-01-02").unwrap();
        let second_run_pos = content.find("2026-01-01").unwrap();
        assert!(first_run_pos < second_run_pos, "newest run must appear first");
    }
}
