//! SHA-256 checksum utilities
//!
//! Checksums are lower-case hex digests with no prefix. The same format is
//! used for content addresses embedded in published file names and for the
//! revision tokens guarding conditional writes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of raw content.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_checksum_is_bare_hex() {
        let checksum = compute_content_checksum(b"hello world");
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_checksum_is_deterministic() {
        let a = compute_content_checksum(b"test");
        let b = compute_content_checksum(b"test");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_different_checksum() {
        let a = compute_content_checksum(b"aaa");
        let b = compute_content_checksum(b"bbb");
        assert_ne!(a, b);
    }

    #[test]
    fn content_checksum_known_value() {
        let checksum = compute_content_checksum(b"hello world");
        assert_eq!(
            checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
