use std::future::Future;
use std::time::Duration;

use exponential_backoff::Backoff;
use podcast_common::CoreError;

/// Bounded retry with exponential backoff for a single chunk's transcription
/// call (spec §4.4 "per-chunk retry, then per-episode skip").
pub async fn with_retry<T, E, F, Fut>(max_retries: u32, mut op: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let backoff = Backoff::new(max_retries, Duration::from_millis(200), Duration::from_secs(10));
    let mut delays = backoff.into_iter();
    let mut last_err_msg = String::new();

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_err_msg = e.to_string();
                match delays.next() {
                    Some(Some(delay)) => tokio::time::sleep(delay).await,
                    _ => {
                        return Err(CoreError::UpstreamFailure(format!(
                            "exhausted retries: {last_err_msg}"
                        )))
                    }
                }
            }
        }
    }
}
