use std::time::Duration;

use chrono::{DateTime, Utc};
use podcast_common::CoreError;
use tracing::info;

use crate::retry::with_retry;

const FETCH_MAX_RETRIES: u32 = 3;
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// One item parsed out of a feed, before `fileKey` assignment.
pub struct ParsedItem {
    pub title: String,
    pub audio_url: String,
    pub published_at: DateTime<Utc>,
    pub published_at_raw: String,
}

pub(crate) struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    pub(crate) fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("failed to build RSS HTTP client");
        Self { client }
    }

    /// Fetch and parse an RSS/Atom feed, returning every item that carries
    /// an audio enclosure and a publish date.
    pub(crate) async fn fetch(&self, feed_url: &str) -> Result<Vec<ParsedItem>, CoreError> {
        let client = &self.client;
        let bytes = with_retry(FETCH_MAX_RETRIES, || async {
            client
                .get(feed_url)
                .header("User-Agent", "podcast-pipeline/0.1")
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await
        })
        .await?;

        let feed = feed_rs::parser::parse(&bytes[..])
            .map_err(|e| CoreError::InputInvariantViolation(format!("malformed feed: {e}")))?;

        let mut items = Vec::with_capacity(feed.entries.len());
        for entry in feed.entries {
            let audio_url = entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .find_map(|c| c.url.as_ref())
                .map(|u| u.to_string())
                .or_else(|| entry.links.first().map(|l| l.href.clone()));

            let (Some(audio_url), Some(published)) = (audio_url, entry.published.or(entry.updated))
            else {
                continue;
            };

            items.push(ParsedItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                audio_url,
                published_at: published.with_timezone(&Utc),
                published_at_raw: published.to_rfc2822(),
            });
        }

        info!(feed_url, items = items.len(), "feed fetched and parsed");
        Ok(items)
    }
}
