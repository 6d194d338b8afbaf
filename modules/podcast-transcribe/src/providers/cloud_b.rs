use std::time::Duration;

use podcast_common::{CoreError, EnvConfig};
use serde::Deserialize;

const ENDPOINT: &str = "https://api.cloud-b.example.com/v2/transcribe";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Second cloud transcription backend. Unlike cloud-a, it answers with a
/// JSON envelope carrying pre-rendered SRT text rather than raw SRT.
#[derive(Clone)]
pub struct CloudBClient {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CloudBResponse {
    srt: String,
}

impl CloudBClient {
    pub fn from_env(env: &EnvConfig) -> Result<Self, CoreError> {
        let api_key = env
            .transcription_api_key
            .clone()
            .ok_or_else(|| CoreError::config("TRANSCRIPTION_API_KEY not set for cloud-b provider"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoreError::config(format!("failed to build cloud-b http client: {e}")))?;
        Ok(Self { api_key, client })
    }

    pub async fn transcribe_chunk(&self, audio: &[u8]) -> Result<String, CoreError> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("chunk.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| CoreError::Other(e.into()))?;
        let form = reqwest::multipart::Form::new()
            .text("format", "srt")
            .part("audio", part);

        let response = self
            .client
            .post(ENDPOINT)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-b request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-b returned an error: {e}")))?;

        let parsed: CloudBResponse = response
            .json()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-b response decode failed: {e}")))?;

        Ok(parsed.srt)
    }

    /// A cheap authenticated request to confirm the endpoint is reachable
    /// and the API key is accepted, without transcribing anything.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        self.client
            .head(ENDPOINT)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-b health check failed: {e}")))?;
        Ok(())
    }
}
