//! Application constants for wallsync
//!
//! Centralizes all constants used throughout the application, organized by
//! functional domain.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "wallsync/0.1.0 (wallpaper sync tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Timeout for full-resolution asset downloads
    pub const FULL_ASSET_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for share requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
}

/// Public share endpoints and URL templates
pub mod share {
    /// Default public WebDAV endpoint of the wallpaper share
    pub const DEFAULT_WEBDAV_URL: &str = "https://cloud.guideos.de/public.php/webdav/";

    /// Default share token used as the basic-auth username
    pub const DEFAULT_SHARE_TOKEN: &str = "Z663zsACWL2XiSP";

    /// Default preview API base (token and file query are appended)
    pub const DEFAULT_PREVIEW_BASE: &str =
        "https://cloud.guideos.de/index.php/apps/files_sharing/publicpreview";

    /// Default wallpaper page for the scrape listing mode
    pub const DEFAULT_PAGE_URL: &str = "https://guideos.de/wallpapers/";

    /// Thumbnail rendition size requested from the preview API
    pub const THUMB_WIDTH: u32 = 150;
    pub const THUMB_HEIGHT: u32 = 150;

    /// Large preview rendition size
    pub const PREVIEW_WIDTH: u32 = 1600;
    pub const PREVIEW_HEIGHT: u32 = 900;
}

/// Identifier normalization defaults
pub mod ident {
    /// Characters removed from identifiers before key derivation and URL
    /// construction. Removal, not escaping: every URL-building step sees the
    /// same stripped identifier.
    pub const DEFAULT_UNSAFE_CHARS: &str = "@";

    /// Bucket name for assets without a path prefix
    pub const UNCATEGORIZED: &str = "uncategorized";

    /// Bucket that always contains every identifier
    pub const ALL_BUCKET: &str = "all";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Metadata sidecar suffix (validators + source URL per entry)
    pub const META_FILE_SUFFIX: &str = ".meta.json";

    /// Content file suffix for cached thumbnails
    pub const CONTENT_FILE_SUFFIX: &str = ".png";

    /// Supported image extensions (lowercase, closed list)
    pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of concurrent thumbnail fetch workers
    pub const DEFAULT_THUMB_WORKERS: usize = 8;

    /// Default number of concurrent full-asset fetch workers
    pub const DEFAULT_FULL_WORKERS: usize = 2;

    /// Channel buffer size for sync event reporting
    pub const CHANNEL_BUFFER_SIZE: usize = 100;
}

/// CSS selectors for the page-scrape listing mode
pub mod selectors {
    /// Elements walked in document order; headings open a category, images
    /// become assets
    pub const DOCUMENT_WALK_SELECTOR: &str = "h1, h2, h3, h4, img";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use files::{SUPPORTED_EXTENSIONS, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use share::{DEFAULT_SHARE_TOKEN, DEFAULT_WEBDAV_URL};
pub use workers::{DEFAULT_FULL_WORKERS, DEFAULT_THUMB_WORKERS};
