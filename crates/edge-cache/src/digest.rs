//! Content hashing for body-addressed cache keys.

use std::fmt;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a byte payload (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Hash a byte payload.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a byte payload to a lowercase hex string.
pub fn digest(bytes: &[u8]) -> String {
    ContentDigest::of(bytes).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_value() {
        assert_eq!(
            digest(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_digest_empty_input() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(ContentDigest::of(b"payload"), ContentDigest::of(b"payload"));
    }

    #[test]
    fn test_digest_shape() {
        let d = digest(b"any bytes at all");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_different_inputs_differ() {
        assert_ne!(digest(b"hello"), digest(b"hello!"));
    }
}
