use std::time::Duration;

use podcast_common::{CoreError, EnvConfig};

const ENDPOINT: &str = "https://api.cloud-a.example.com/v1/audio/transcriptions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// First cloud transcription backend. Sends the raw audio bytes as a
/// multipart upload and expects SRT text back.
#[derive(Clone)]
pub struct CloudAClient {
    api_key: String,
    client: reqwest::Client,
}

impl CloudAClient {
    pub fn from_env(env: &EnvConfig) -> Result<Self, CoreError> {
        let api_key = env
            .transcription_api_key
            .clone()
            .ok_or_else(|| CoreError::config("TRANSCRIPTION_API_KEY not set for cloud-a provider"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoreError::config(format!("failed to build cloud-a http client: {e}")))?;
        Ok(Self { api_key, client })
    }

    pub async fn transcribe_chunk(&self, audio: &[u8]) -> Result<String, CoreError> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("chunk.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| CoreError::Other(e.into()))?;
        let form = reqwest::multipart::Form::new()
            .text("response_format", "srt")
            .part("file", part);

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-a request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-a returned an error: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-a response body read failed: {e}")))
    }

    /// A cheap authenticated request to confirm the endpoint is reachable
    /// and the API key is accepted, without transcribing anything.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        self.client
            .head(ENDPOINT)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("cloud-a health check failed: {e}")))?;
        Ok(())
    }
}
