//! Stable content hashing

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `content`, used as a compact deduplication key.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::content_hash;

    #[test]
    fn identical_bodies_share_a_key() {
        assert_eq!(content_hash("def test_a(): pass"), content_hash("def test_a(): pass"));
        assert_ne!(content_hash("def test_a(): pass"), content_hash("def test_b(): pass"));
        assert_eq!(content_hash("").len(), 64);
    }
}
