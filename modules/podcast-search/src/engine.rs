//! Query execution over a restored `SearchIndex` (spec §4.6).

use std::collections::HashSet;

use podcast_index::{SearchEntry, SearchIndex};
use serde::Serialize;

use crate::request::{SearchRequest, SortBy, SortOrder};

#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub entry: SearchEntry,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,
    pub total: usize,
    pub processing_time_ms: u64,
}

/// Case-insensitive whole-word term overlap, counted once per occurrence.
/// Not a full-text ranking model — good enough for relevance ordering over
/// cue-length text, and the only scoring approach the corpus grounds
/// without a dedicated search-engine crate.
fn score(text: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    terms.iter().map(|t| haystack.matches(t.as_str()).count() as f64).sum()
}

pub fn execute(index: &SearchIndex, request: &SearchRequest) -> SearchResponse {
    let terms: Vec<String> =
        request.query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect();

    let episode_filter: Option<HashSet<&str>> =
        request.episode_ids.as_ref().map(|ids| ids.iter().map(|s| s.as_str()).collect());

    // episodeIds is a pre-search equality filter (spec §4.6 "materially
    // faster than post-filtering"): it narrows the candidate set before
    // scoring runs at all.
    let mut candidates: Vec<(&SearchEntry, f64)> = index
        .entries
        .iter()
        .filter(|e| {
            episode_filter
                .as_ref()
                .map(|ids| ids.contains(e.sequential_episode_id_as_string.as_str()))
                .unwrap_or(true)
        })
        .filter_map(|e| {
            if terms.is_empty() {
                Some((e, 0.0))
            } else {
                let s = score(&e.text, &terms);
                (s > 0.0).then_some((e, s))
            }
        })
        .collect();

    let total = candidates.len();

    match request.effective_sort_by() {
        SortBy::Relevance => candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.id.cmp(&b.0.id))
        }),
        SortBy::EpisodePublishedUnixTimestamp => {
            let desc = request.effective_sort_order() == SortOrder::Desc;
            candidates.sort_by(|a, b| {
                let primary = a.0.episode_published_unix_timestamp.cmp(&b.0.episode_published_unix_timestamp);
                let primary = if desc { primary.reverse() } else { primary };
                // id tie-break is always ascending, regardless of sort
                // direction (spec §8 testable property).
                primary.then_with(|| a.0.id.cmp(&b.0.id))
            });
        }
    }

    let hits = candidates
        .into_iter()
        .skip(request.bounded_offset())
        .take(request.bounded_limit())
        .map(|(entry, score)| Hit { entry: entry.clone(), score })
        .collect();

    SearchResponse { hits, total, processing_time_ms: 0 }
}
