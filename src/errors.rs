//! Error types for wallsync
//!
//! This module defines the error taxonomy for all components of the
//! application. Listing and per-asset download failures are downgraded to
//! per-asset outcomes at the sync-engine boundary; only cache-directory and
//! configuration problems abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Remote listing errors (WebDAV multistatus or page scrape)
#[derive(Error, Debug)]
pub enum ListingError {
    /// HTTP transport failure while fetching the listing
    #[error("listing request failed")]
    Http(#[from] reqwest::Error),

    /// Listing endpoint returned a non-success status
    #[error("listing endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// Multistatus document could not be interpreted
    #[error("malformed multistatus response: {reason}")]
    Multistatus { reason: String },

    /// Scraped page could not be interpreted
    #[error("malformed wallpaper page: {reason}")]
    Page { reason: String },

    /// Invalid listing URL in configuration
    #[error("invalid listing URL: {url}")]
    InvalidUrl { url: String },
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP transport failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success, non-304 status
    #[error("server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Download timed out
    #[error("download timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invalid URL constructed for a request
    #[error("invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// I/O error while persisting a downloaded asset
    #[error("file I/O error")]
    Io(#[from] std::io::Error),

    /// Maximum retries exceeded at the HTTP layer
    #[error("maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },
}

/// Cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory could not be created or accessed
    #[error("cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// No entry exists for the requested content key
    #[error("cache entry not found: {key}")]
    NotFound { key: String },

    /// Filesystem failure reading or writing an entry
    #[error("cache I/O error")]
    Io(#[from] std::io::Error),

    /// Atomic replace of an entry failed mid-rename
    #[error("atomic cache write failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Metadata sidecar could not be serialized or parsed
    #[error("cache metadata error")]
    Metadata(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading configuration
    #[error("I/O error reading configuration")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote listing error
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Listing(ListingError::Http(_))
            | AppError::Download(DownloadError::Http(_))
            | AppError::Download(DownloadError::Timeout { .. })
            | AppError::Download(DownloadError::ServerError { status: 429 })
            | AppError::Download(DownloadError::ServerError { status: 503 }) => true,

            _ => false,
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Listing(_) => "listing",
            AppError::Download(_) => "download",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Listing result type alias
pub type ListingResult<T> = std::result::Result<T, ListingError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// Cache write failures during a fetch count as a fetch failure for that one
// asset; they must not propagate beyond the entry.
impl From<CacheError> for DownloadError {
    fn from(cache_error: CacheError) -> Self {
        match cache_error {
            CacheError::Io(e) => DownloadError::Io(e),
            other => DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                other.to_string(),
            )),
        }
    }
}
