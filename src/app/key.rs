//! Content-key derivation for cache entries
//!
//! A content key is the SHA-256 digest of a canonical identifier, hex-encoded
//! and used as the on-disk filename. Hashing keeps the cache directory flat
//! and filesystem-safe regardless of the original path depth or special
//! characters. Keys address the *identifier*, not the bytes: remote content
//! silently replaced under an unchanged name is not detected here (the
//! optional revalidation path covers that).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::files;

/// Fixed-length cache key derived from a canonical identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Derive the key for a canonical identifier
    ///
    /// Pure function: identical identifiers always map to identical keys.
    pub fn from_identifier(identifier: &str) -> Self {
        let digest = Sha256::digest(identifier.as_bytes());
        Self(digest.into())
    }

    /// Hex encoding of the digest (64 lowercase characters)
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in &self.0 {
            use fmt::Write;
            write!(out, "{:02x}", byte).expect("writing to String cannot fail");
        }
        out
    }

    /// Filename of the content file for this key
    pub fn content_file_name(&self) -> String {
        format!("{}{}", self.to_hex(), files::CONTENT_FILE_SUFFIX)
    }

    /// Filename of the metadata sidecar for this key
    pub fn meta_file_name(&self) -> String {
        format!("{}{}", self.to_hex(), files::META_FILE_SUFFIX)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = ContentKey::from_identifier("Nature/sunset.jpg");
        let b = ContentKey::from_identifier("Nature/sunset.jpg");
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn test_key_hex_is_fixed_length() {
        let key = ContentKey::from_identifier("x");
        assert_eq!(key.to_hex().len(), 64);
        assert!(key.to_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_identifiers_distinct_keys() {
        let a = ContentKey::from_identifier("sunset.jpg");
        let b = ContentKey::from_identifier("Nature/sunset.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_names_share_stem() {
        let key = ContentKey::from_identifier("strand.png");
        assert!(key.content_file_name().ends_with(".png"));
        assert!(key.meta_file_name().ends_with(".meta.json"));
        assert_eq!(key.content_file_name()[..64], key.meta_file_name()[..64]);
    }

    #[test]
    fn test_known_sha256_vector() {
        // sha256("FotoStrand.jpg") computed independently
        let key = ContentKey::from_identifier("FotoStrand.jpg");
        assert_eq!(
            key.to_hex(),
            "f5495efa19b76a1b25f10238f0f6ba2fe6131ddbee4fc7350699406a24dbe353"
        );
    }
}
