//! Transcription provider dispatch. A closed tagged-variant enum instead
//! of a trait object: the set of providers is fixed and known at compile
//! time (spec §9 "dynamic dispatch → tagged variants").

mod cloud_a;
mod cloud_b;
mod local;

use podcast_common::{CoreError, EnvConfig, ProviderKind};

pub use cloud_a::CloudAClient;
pub use cloud_b::CloudBClient;
pub use local::LocalClient;

/// A configured transcription backend, selected once at startup from
/// `EnvConfig` and reused across every chunk and every episode.
pub enum Provider {
    CloudA(CloudAClient),
    CloudB(CloudBClient),
    Local(LocalClient),
}

impl Provider {
    pub fn from_env(env: &EnvConfig) -> Result<Self, CoreError> {
        match env.provider {
            ProviderKind::CloudA => Ok(Provider::CloudA(CloudAClient::from_env(env)?)),
            ProviderKind::CloudB => Ok(Provider::CloudB(CloudBClient::from_env(env)?)),
            ProviderKind::Local => Ok(Provider::Local(LocalClient::from_env(env))),
        }
    }

    /// Transcribe one audio chunk, returning raw SRT text.
    pub async fn transcribe_chunk(&self, audio: &[u8]) -> Result<String, CoreError> {
        match self {
            Provider::CloudA(c) => c.transcribe_chunk(audio).await,
            Provider::CloudB(c) => c.transcribe_chunk(audio).await,
            Provider::Local(c) => c.transcribe_chunk(audio).await,
        }
    }

    /// Verify the configured backend is reachable before any processing
    /// starts (spec §4.4 startup toolchain check).
    pub async fn health_check(&self) -> Result<(), CoreError> {
        match self {
            Provider::CloudA(c) => c.health_check().await,
            Provider::CloudB(c) => c.health_check().await,
            Provider::Local(c) => c.health_check().await,
        }
    }
}
