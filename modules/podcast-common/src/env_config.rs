use std::env;

use crate::error::{CoreError, Result};

/// Key-resolution / bucket-naming strategy (spec `FILE_STORAGE_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEnv {
    Local,
    DevRemote,
    ProdRemote,
}

impl StorageEnv {
    pub fn is_remote(self) -> bool {
        matches!(self, StorageEnv::DevRemote | StorageEnv::ProdRemote)
    }
}

impl std::str::FromStr for StorageEnv {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "dev-remote" => Ok(Self::DevRemote),
            "prod-remote" => Ok(Self::ProdRemote),
            other => Err(CoreError::config(format!(
                "FILE_STORAGE_ENV must be one of local|dev-remote|prod-remote, got {other:?}"
            ))),
        }
    }
}

/// Which transcription provider to dispatch to (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    CloudA,
    CloudB,
    Local,
}

impl std::str::FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cloud-a" => Ok(Self::CloudA),
            "cloud-b" => Ok(Self::CloudB),
            "local" => Ok(Self::Local),
            other => Err(CoreError::config(format!(
                "TRANSCRIPTION_PROVIDER must be one of cloud-a|cloud-b|local, got {other:?}"
            ))),
        }
    }
}

/// Process-wide configuration loaded from environment variables (spec §6).
/// Site metadata (feeds, titles, corrections) lives in the site registry,
/// not here — this struct is secrets and environment-selection only.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Active site scope. Required for single-site CLI invocations; the
    /// orchestrator's `--sites` flag overrides it per run.
    pub site_id: Option<String>,
    pub storage_env: StorageEnv,
    pub log_level: String,

    pub local_storage_root: String,
    pub remote_bucket_suffix: String,

    pub provider: ProviderKind,
    pub transcription_api_key: Option<String>,
    pub transcode_tool_path: Option<String>,
    pub transcode_model: Option<String>,

    /// Path to an operator-wide spelling-corrections JSON, merged under
    /// every site's own table (spec §4.4.1 "merged with a custom
    /// (operator-scoped) table"). Missing file is non-fatal, same as the
    /// per-site table.
    pub operator_corrections_path: Option<String>,
}

impl EnvConfig {
    /// Load configuration from the environment, loading a local `.env` first
    /// if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_env: StorageEnv = env::var("FILE_STORAGE_ENV")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;
        let provider: ProviderKind = env::var("TRANSCRIPTION_PROVIDER")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;

        let config = Self {
            site_id: env::var("SITE_ID").ok(),
            storage_env,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            local_storage_root: env::var("LOCAL_STORAGE_ROOT")
                .unwrap_or_else(|_| "./data".to_string()),
            remote_bucket_suffix: env::var("REMOTE_BUCKET_SUFFIX")
                .unwrap_or_else(|_| "podcast-pipeline".to_string()),
            provider,
            transcription_api_key: env::var("TRANSCRIPTION_API_KEY").ok(),
            transcode_tool_path: env::var("TRANSCODE_TOOL_PATH").ok(),
            transcode_model: env::var("TRANSCODE_MODEL").ok(),
            operator_corrections_path: env::var("OPERATOR_CORRECTIONS_PATH").ok(),
        };

        if provider != ProviderKind::Local && config.transcription_api_key.is_none() {
            return Err(CoreError::config(
                "TRANSCRIPTION_API_KEY is required when TRANSCRIPTION_PROVIDER is a cloud provider",
            ));
        }

        config.log_redacted();
        Ok(config)
    }

    /// Require a SITE_ID, for single-site operations that can't fall back
    /// to a `--sites` CLI flag.
    pub fn require_site_id(&self) -> Result<&str> {
        self.site_id
            .as_deref()
            .ok_or_else(|| CoreError::config("SITE_ID is required"))
    }

    fn log_redacted(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let n = v.len().min(4);
                    format!("{}...({} chars)", &v[..n], v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!(
            storage_env = ?self.storage_env,
            provider = ?self.provider,
            transcription_api_key = %preview_opt(&self.transcription_api_key),
            "env config loaded"
        );
    }
}
