use sha2::{Digest, Sha256};

/// Stable content hash, used to detect whether a cached artifact (feed body,
/// corrections table) actually changed between runs.
pub fn content_hash(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
    }

    #[test]
    fn different_input_different_hash() {
        assert_ne!(content_hash("hello"), content_hash("world"));
    }
}
