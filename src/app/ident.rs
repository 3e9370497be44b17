//! Identifier normalization
//!
//! Maps raw remote paths and names into canonical, stable identifiers. The
//! identifier is the sole join key between listing, cache, and presentation
//! layer, so normalization must be deterministic: same raw input, same
//! output, across listing mechanisms (percent-encoding differences, absolute
//! vs relative hrefs, special characters).
//!
//! The unsafe-character policy is removal, not escaping. Every URL-building
//! step (preview URL, full URL, key derivation) consumes the same stripped
//! identifier; diverging here would leave cache keys pointing at URLs that
//! are never requested.

use percent_encoding::percent_decode_str;

/// Configuration for identifier normalization
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Absolute-path prefix returned by the listing protocol, stripped if
    /// present (e.g. "/public.php/webdav")
    pub base_prefix: Option<String>,
    /// Characters removed from decoded identifiers
    pub unsafe_chars: Vec<char>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            base_prefix: None,
            unsafe_chars: crate::constants::ident::DEFAULT_UNSAFE_CHARS
                .chars()
                .collect(),
        }
    }
}

/// Normalize a raw remote path into a canonical identifier
///
/// Applied in order: percent-decode once, strip the configured base prefix,
/// strip a single leading separator, remove unsafe characters. Returns
/// `None` when the result is empty or denotes a directory marker; such
/// entries are filtered, not errors.
pub fn normalize(raw: &str, config: &NormalizerConfig) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let mut path: &str = &decoded;

    if path.ends_with('/') {
        return None; // directory marker
    }

    if let Some(prefix) = &config.base_prefix {
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            path = rest;
        }
    }
    path = path.strip_prefix('/').unwrap_or(path);

    let identifier: String = path
        .chars()
        .filter(|c| !config.unsafe_chars.contains(c))
        .collect();

    if identifier.is_empty() {
        None
    } else {
        Some(identifier)
    }
}

/// Check whether an identifier carries a supported image extension
///
/// Case-insensitive against a closed list; entries without one are dropped
/// by the lister.
pub fn has_supported_extension(identifier: &str, extensions: &[String]) -> bool {
    let lower = identifier.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext.to_ascii_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NormalizerConfig {
        NormalizerConfig::default()
    }

    fn exts() -> Vec<String> {
        crate::constants::files::SUPPORTED_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_percent_decoding_is_applied_once() {
        let id = normalize("Nature/Berg%20See.jpg", &config()).unwrap();
        assert_eq!(id, "Nature/Berg See.jpg");

        // A doubly-encoded input decodes exactly one level
        let id = normalize("Berg%2520See.jpg", &config()).unwrap();
        assert_eq!(id, "Berg%20See.jpg");
    }

    #[test]
    fn test_base_prefix_and_leading_separator_stripped() {
        let cfg = NormalizerConfig {
            base_prefix: Some("/public.php/webdav".to_string()),
            ..config()
        };
        let id = normalize("/public.php/webdav/Nature/sunset.jpg", &cfg).unwrap();
        assert_eq!(id, "Nature/sunset.jpg");
    }

    #[test]
    fn test_unsafe_characters_are_removed_not_escaped() {
        let id = normalize("Foto@Strand.jpg", &config()).unwrap();
        assert_eq!(id, "FotoStrand.jpg");
    }

    #[test]
    fn test_directory_markers_are_filtered() {
        assert!(normalize("Nature/", &config()).is_none());
        assert!(normalize("/", &config()).is_none());
        assert!(normalize("", &config()).is_none());
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let a = normalize("Foto%40Strand.jpg", &config());
        let b = normalize("Foto%40Strand.jpg", &config());
        assert_eq!(a, b);
        assert_eq!(a.unwrap(), "FotoStrand.jpg");
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        assert!(has_supported_extension("a.JPG", &exts()));
        assert!(has_supported_extension("b.WebP", &exts()));
        assert!(!has_supported_extension("c.gif", &exts()));
        assert!(!has_supported_extension("noext", &exts()));
    }
}
