use std::io::Write;
use std::process::Stdio;

use podcast_common::{CoreError, EnvConfig};
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Shells out to a locally installed transcription binary, resolved from
/// `TRANSCODE_TOOL_PATH` (falling back to `PATH`), passing `TRANSCODE_MODEL`
/// through if configured.
#[derive(Clone)]
pub struct LocalClient {
    tool_path: String,
    model: Option<String>,
}

impl LocalClient {
    pub fn from_env(env: &EnvConfig) -> Self {
        let tool_path = env
            .transcode_tool_path
            .clone()
            .map(|dir| format!("{dir}/transcribe"))
            .unwrap_or_else(|| "transcribe".to_string());
        Self { tool_path, model: env.transcode_model.clone() }
    }

    pub async fn transcribe_chunk(&self, audio: &[u8]) -> Result<String, CoreError> {
        let mut input = NamedTempFile::new()
            .map_err(|e| CoreError::TransientIO(format!("failed to create temp input file: {e}")))?;
        input
            .as_file_mut()
            .write_all(audio)
            .and_then(|_| input.as_file_mut().sync_all())
            .map_err(|e| CoreError::TransientIO(format!("failed to write temp audio chunk: {e}")))?;

        let mut command = Command::new(&self.tool_path);
        command.arg("--input").arg(input.path()).args(["--format", "srt"]);
        if let Some(model) = &self.model {
            command.arg("--model").arg(model);
        }

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CoreError::TransientIO(format!("failed to spawn local transcription tool: {e}")))?;

        if !output.status.success() {
            return Err(CoreError::UpstreamFailure(format!(
                "local transcription tool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| CoreError::UpstreamFailure(format!("local transcription tool emitted invalid utf-8: {e}")))
    }

    /// Confirm the configured transcription binary exists and runs before
    /// any episode processing starts.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        let status = Command::new(&self.tool_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| CoreError::config(format!("local transcription tool '{}' not runnable: {e}", self.tool_path)))?;

        if status.success() {
            Ok(())
        } else {
            Err(CoreError::config(format!(
                "local transcription tool '{}' exited with {status} during health check",
                self.tool_path
            )))
        }
    }
}
