//! Sync-consistency checker: local-vs-blob gap report, purely descriptive
//! (spec §4.7 / C7).

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use podcast_blobstore::BlobStore;
use podcast_common::Result;

/// The artifact categories compared here. `search-index/` and any
/// search-entry files are owned exclusively by the indexer and must never
/// be compared (spec §4.7) — simply not included in this list.
const CATEGORIES: &[&str] = &["audio", "transcripts", "episode-manifest", "rss"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    BlobToLocal,
    LocalToBlob,
    Bidirectional,
}

impl SyncMode {
    fn wants_local_only(self) -> bool {
        matches!(self, SyncMode::LocalToBlob | SyncMode::Bidirectional)
    }

    fn wants_s3_only(self) -> bool {
        matches!(self, SyncMode::BlobToLocal | SyncMode::Bidirectional)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryGap {
    pub local_only: HashSet<String>,
    pub s3_only: HashSet<String>,
    pub consistent: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GapReport {
    pub by_category: BTreeMap<String, CategoryGap>,
}

/// Compare the local filesystem under `{local_root}/sites/{site_id}/` with
/// the blob store, per category, gated by `mode`.
pub async fn check(local_root: &str, site_id: &str, store: &dyn BlobStore, mode: SyncMode) -> Result<GapReport> {
    let site_root = Path::new(local_root).join("sites").join(site_id);
    let mut report = GapReport::default();

    for category in CATEGORIES {
        let prefix = format!("{category}/");
        let local_keys = list_local_keys(&site_root, category);
        let remote_keys: HashSet<String> = store.list(&prefix).await?.into_iter().collect();

        let mut gap = CategoryGap::default();
        for key in local_keys.union(&remote_keys) {
            let in_local = local_keys.contains(key);
            let in_remote = remote_keys.contains(key);
            match (in_local, in_remote) {
                (true, true) => {
                    gap.consistent.insert(key.clone());
                }
                (true, false) if mode.wants_local_only() => {
                    gap.local_only.insert(key.clone());
                }
                (false, true) if mode.wants_s3_only() => {
                    gap.s3_only.insert(key.clone());
                }
                _ => {}
            }
        }
        report.by_category.insert(category.to_string(), gap);
    }

    Ok(report)
}

/// Iterative (non-recursive) walk of `{site_root}/{category}`, skipping
/// dotfiles and `.DS_Store`, returning keys relative to `site_root` with
/// forward-slash separators.
fn list_local_keys(site_root: &Path, category: &str) -> HashSet<String> {
    let mut keys = HashSet::new();
    let base = site_root.join(category);
    let mut stack = vec![base.clone()];

    while let Some(dir) = stack.pop() {
        let Ok(read_dir) = std::fs::read_dir(&dir) else { continue };
        for entry in read_dir.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(site_root) {
                keys.insert(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_blobstore::LocalBlobStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_local_only_and_s3_only_and_consistent() {
        let local_dir = tempdir().unwrap();
        let remote_dir = tempdir().unwrap();

        let site_root = local_dir.path().join("sites").join("site-a");
        std::fs::create_dir_all(site_root.join("audio").join("feedA")).unwrap();
        std::fs::write(site_root.join("audio").join("feedA").join("shared.mp3"), b"x").unwrap();
        std::fs::write(site_root.join("audio").join("feedA").join("local-only.mp3"), b"x").unwrap();
        std::fs::write(site_root.join("audio").join("feedA").join(".DS_Store"), b"x").unwrap();

        let remote: Box<dyn BlobStore> =
            Box::new(LocalBlobStore::new(remote_dir.path().to_str().unwrap(), "site-a"));
        remote.put("audio/feedA/shared.mp3", b"x".to_vec().into()).await.unwrap();
        remote.put("audio/feedA/remote-only.mp3", b"x".to_vec().into()).await.unwrap();

        let report = check(
            local_dir.path().to_str().unwrap(),
            "site-a",
            remote.as_ref(),
            SyncMode::Bidirectional,
        )
        .await
        .unwrap();

        let audio = &report.by_category["audio"];
        assert!(audio.consistent.contains("audio/feedA/shared.mp3"));
        assert!(audio.local_only.contains("audio/feedA/local-only.mp3"));
        assert!(audio.s3_only.contains("audio/feedA/remote-only.mp3"));
        assert!(!audio.local_only.iter().any(|k| k.contains(".DS_Store")));
    }

    #[tokio::test]
    async fn mode_gating_omits_the_unrequested_direction() {
        let local_dir = tempdir().unwrap();
        let remote_dir = tempdir().unwrap();
        let site_root = local_dir.path().join("sites").join("site-a");
        std::fs::create_dir_all(site_root.join("rss")).unwrap();
        std::fs::write(site_root.join("rss").join("feedA.xml"), b"x").unwrap();

        let remote: Box<dyn BlobStore> =
            Box::new(LocalBlobStore::new(remote_dir.path().to_str().unwrap(), "site-a"));

        let report = check(local_dir.path().to_str().unwrap(), "site-a", remote.as_ref(), SyncMode::BlobToLocal)
            .await
            .unwrap();

        // BlobToLocal only cares about what's missing locally (s3Only);
        // a local-only file must be omitted entirely, not just unreported.
        assert!(report.by_category["rss"].local_only.is_empty());
    }
}
