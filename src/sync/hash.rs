//! Content hashing for sync operations.
//!
//! SHA256 fingerprints decide whether a theme file needs rewriting and give
//! colliding media basenames a stable disambiguating prefix.

use sha2::{Digest, Sha256};

/// Compute the hex SHA256 of some bytes.
#[must_use]
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    format!("{:x}", hasher.finalize())
}

/// First `len` hex characters of the content hash.
#[must_use]
pub fn short_hash(bytes: impl AsRef<[u8]>, len: usize) -> String {
    let mut hash = content_hash(bytes);
    hash.truncate(len);
    hash
}

/// Check whether new content differs from what is stored.
///
/// Returns `true` if there is no stored hash (file absent) or the hashes
/// differ.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash("<!-- wp:paragraph -->");
        let hash2 = content_hash("<!-- wp:paragraph -->");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn test_short_hash() {
        let short = short_hash("https://example.com/a.jpg", 8);
        assert_eq!(short.len(), 8);
        assert!(content_hash("https://example.com/a.jpg").starts_with(&short));
    }

    #[test]
    fn test_has_changed_no_stored_hash() {
        assert!(has_changed("abc123", None));
    }

    #[test]
    fn test_has_changed_different_hash() {
        assert!(has_changed("abc123", Some("xyz789")));
    }

    #[test]
    fn test_has_changed_same_hash() {
        assert!(!has_changed("abc123", Some("abc123")));
    }
}
