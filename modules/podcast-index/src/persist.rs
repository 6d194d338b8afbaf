//! Streaming, gzip-compressed MessagePack persistence (spec §4.5 step 5).
//!
//! Serialization writes directly into a `GzEncoder` wrapping the output
//! buffer; the index is never materialized as a single string, only as
//! msgpack bytes.

use std::io::Read;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use podcast_common::CoreError;

use crate::schema::SearchIndex;

/// Raised well past rmp-serde's default 1000-level nesting ceiling; our
/// schema nests at most two levels deep, but large sites can still trip
/// the default on pathological cue text containing nested JSON-like
/// structures serialized as plain strings, so this is generous headroom.
const MAX_DESERIALIZE_DEPTH: usize = 8192;

pub fn serialize_compressed(index: &SearchIndex) -> Result<Vec<u8>, CoreError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    {
        let mut serializer = rmp_serde::Serializer::new(&mut encoder);
        serde::Serialize::serialize(index, &mut serializer)
            .map_err(|e| CoreError::ResourceExhausted(format!("index serialization failed: {e}")))?;
    }
    encoder
        .finish()
        .map_err(|e| CoreError::ResourceExhausted(format!("gzip stream finalize failed: {e}")))
}

pub fn deserialize_compressed(bytes: &[u8]) -> Result<SearchIndex, CoreError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CoreError::ResourceExhausted(format!("gzip decompress failed: {e}")))?;

    let cursor = std::io::Cursor::new(raw);
    let mut deserializer = rmp_serde::Deserializer::new(cursor);
    deserializer.set_max_depth(MAX_DESERIALIZE_DEPTH);
    serde::Deserialize::deserialize(&mut deserializer)
        .map_err(|e| CoreError::InputInvariantViolation(format!("corrupt search index: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SearchEntry;

    #[test]
    fn round_trips_through_gzip_and_msgpack() {
        let index = SearchIndex {
            entries: vec![SearchEntry {
                id: "1:0".to_string(),
                text: "hello world".to_string(),
                sequential_episode_id_as_string: "1".to_string(),
                start_time_ms: 0,
                end_time_ms: 1000,
                episode_published_unix_timestamp: 1_600_000_000,
            }],
        };

        let bytes = serialize_compressed(&index).unwrap();
        let restored = deserialize_compressed(&bytes).unwrap();
        assert_eq!(restored.entries, index.entries);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = deserialize_compressed(b"not a gzip stream").unwrap_err();
        assert!(matches!(
            err,
            CoreError::ResourceExhausted(_) | CoreError::InputInvariantViolation(_)
        ));
    }
}
