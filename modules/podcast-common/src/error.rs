use thiserror::Error;

/// Result alias used across every stage of the pipeline.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The error-kind taxonomy every stage converts its failures into at the
/// boundary (see the propagation policy in the system design).
#[derive(Error, Debug)]
pub enum CoreError {
    /// Expected absence: empty manifest, missing optional corrections file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network/disk retry candidate, surfaced after retries are exhausted.
    #[error("transient I/O error: {0}")]
    TransientIO(String),

    /// Transcription provider returned a non-OK response after retrying.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// Unparseable date, malformed SRT, manifest/RSS mismatch.
    #[error("input invariant violated: {0}")]
    InputInvariantViolation(String),

    /// Out-of-memory or similar resource exhaustion during index build/restore.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Missing SITE_ID, missing binaries, missing credentials. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
