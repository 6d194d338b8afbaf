use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use podcast_common::{CoreError, Result};
use tracing::debug;

use crate::{BlobStore, PAGINATION_LOG_THRESHOLD};

/// Filesystem-backed blob store. Keys are site-prefixed under
/// `{root}/sites/{siteId}/` because multiple sites share one filesystem
/// (spec §4.1).
pub struct LocalBlobStore {
    site_root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: &str, site_id: &str) -> Self {
        Self {
            site_root: Path::new(root).join("sites").join(site_id),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.site_root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match tokio::fs::read(self.resolve(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::TransientIO(e.to_string())),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::TransientIO(e.to_string()))?;
        }
        // Write-then-rename so a crash mid-write never leaves a partial
        // blob visible at the final key (spec §4.3/§5 atomicity).
        let tmp_path = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("bin")
        ));
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| CoreError::TransientIO(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| CoreError::TransientIO(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.resolve(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::TransientIO(e.to_string())),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let base = self.resolve(prefix);
        let mut out = Vec::new();
        let mut stack = vec![base];
        while let Some(dir) = stack.pop() {
            let mut read_dir = match tokio::fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CoreError::TransientIO(e.to_string())),
            };
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| CoreError::TransientIO(e.to_string()))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| CoreError::TransientIO(e.to_string()))?;
                if file_type.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path
                        .strip_prefix(&self.site_root)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    out.push(rel);
                }
            }
        }
        out.sort();
        if out.len() > PAGINATION_LOG_THRESHOLD {
            debug!(prefix, count = out.len(), "local listing exceeded naive page size");
        }
        Ok(out)
    }

    async fn list_dirs(&self, prefix: &str) -> Result<Vec<String>> {
        let base = self.resolve(prefix);
        let mut dirs = BTreeSet::new();
        let mut read_dir = match tokio::fs::read_dir(&base).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::TransientIO(e.to_string())),
        };
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| CoreError::TransientIO(e.to_string()))?
        {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                let rel = entry
                    .path()
                    .strip_prefix(&self.site_root)
                    .unwrap_or(&entry.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                dirs.insert(format!("{rel}/"));
            }
        }
        Ok(dirs.into_iter().collect())
    }

    async fn directory_size(&self, prefix: &str) -> Result<u64> {
        let base = self.resolve(prefix);
        let mut total = 0u64;
        let mut stack = vec![base];
        while let Some(dir) = stack.pop() {
            let mut read_dir = match tokio::fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CoreError::TransientIO(e.to_string())),
            };
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| CoreError::TransientIO(e.to_string()))?
            {
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| CoreError::TransientIO(e.to_string()))?;
                if meta.is_dir() {
                    stack.push(entry.path());
                } else {
                    total += meta.len();
                }
            }
        }
        Ok(total)
    }
}
