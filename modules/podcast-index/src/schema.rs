//! The persisted search index schema (spec §3/§4.5).

use serde::{Deserialize, Serialize};

/// One cue, carried through from transcript to search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEntry {
    pub id: String,
    pub text: String,
    pub sequential_episode_id_as_string: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub episode_published_unix_timestamp: i64,
}

/// The whole in-memory search structure. Wrapped in its own type (rather
/// than a bare `Vec<SearchEntry>`) so the on-disk schema can evolve a
/// version tag without breaking every call site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchIndex {
    pub entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
