//! Configuration management for wallsync
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. The TOML-facing structs mirror the
//! runtime configuration structs in `app`, converted through
//! `to_runtime_config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{
    CacheConfig, ClientConfig, ListerConfig, ListingSource, NormalizerConfig, ShareEndpoints,
    SyncConfig,
};
use crate::constants::{ident, limits, logging, share, workers};
use crate::errors::{ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Public share endpoints
    pub share: ShareConfigToml,
    /// Cache directory settings
    pub cache: CacheConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Sync engine settings
    pub sync: SyncConfigToml,
    /// Listing and identifier settings
    pub listing: ListingConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly share endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfigToml {
    /// WebDAV endpoint of the public share
    pub webdav_url: String,
    /// Share token (basic-auth username, empty password)
    pub token: String,
    /// Preview API base URL
    pub preview_base: String,
    /// Wallpaper page URL for the scrape listing mode
    pub page_url: String,
}

impl Default for ShareConfigToml {
    fn default() -> Self {
        Self {
            webdav_url: share::DEFAULT_WEBDAV_URL.to_string(),
            token: share::DEFAULT_SHARE_TOKEN.to_string(),
            preview_base: share::DEFAULT_PREVIEW_BASE.to_string(),
            page_url: share::DEFAULT_PAGE_URL.to_string(),
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (OS cache directory if unset)
    pub cache_root: Option<PathBuf>,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Full-asset download timeout in seconds
    pub full_asset_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum retry attempts per request
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub retry_base_delay_ms: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        let runtime = ClientConfig::default();
        Self {
            request_timeout_secs: runtime.request_timeout.as_secs(),
            full_asset_timeout_secs: runtime.full_asset_timeout.as_secs(),
            connect_timeout_secs: runtime.connect_timeout.as_secs(),
            max_retries: limits::MAX_RETRIES,
            retry_base_delay_ms: limits::RETRY_BASE_DELAY_MS,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfigToml {
    /// Maximum concurrent thumbnail fetches
    pub thumb_workers: usize,
    /// Maximum concurrent full-asset downloads
    pub full_workers: usize,
    /// Issue conditional fetches for cached entries
    pub revalidate: bool,
}

impl Default for SyncConfigToml {
    fn default() -> Self {
        Self {
            thumb_workers: workers::DEFAULT_THUMB_WORKERS,
            full_workers: workers::DEFAULT_FULL_WORKERS,
            revalidate: false,
        }
    }
}

/// TOML-friendly listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfigToml {
    /// Listing source: "webdav" or "page"
    pub source: String,
    /// Characters removed from identifiers
    pub unsafe_chars: String,
    /// Supported image extensions (lowercase)
    pub extensions: Vec<String>,
    /// Thumbnail rendition width
    pub thumb_width: u32,
    /// Thumbnail rendition height
    pub thumb_height: u32,
}

impl Default for ListingConfigToml {
    fn default() -> Self {
        Self {
            source: "webdav".to_string(),
            unsafe_chars: ident::DEFAULT_UNSAFE_CHARS.to_string(),
            extensions: crate::constants::files::SUPPORTED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thumb_width: share::THUMB_WIDTH,
            thumb_height: share::THUMB_HEIGHT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            colored_output: true,
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(
        &self,
    ) -> Result<(
        ShareEndpoints,
        CacheConfig,
        ClientConfig,
        SyncConfig,
        ListerConfig,
    )> {
        Ok((
            self.share.to_runtime_config(),
            self.cache.to_runtime_config(),
            self.client.to_runtime_config(),
            self.sync.to_runtime_config()?,
            self.listing.to_runtime_config(&self.share)?,
        ))
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. CLI argument overrides (applied by the command layer)
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::default_config_path().filter(|p| p.exists()),
        };

        match config_path {
            Some(path) => {
                debug!("loading config from {}", path.display());
                Self::load_from_file(&path).await
            }
            None => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    async fn load_from_file(path: &PathBuf) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(ConfigError::Io)?;
        let config: Self = toml::from_str(&raw).map_err(ConfigError::InvalidFormat)?;
        Ok(config)
    }

    /// Default config file location under the OS config directory
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wallsync").join("config.toml"))
    }
}

impl ShareConfigToml {
    pub fn to_runtime_config(&self) -> ShareEndpoints {
        ShareEndpoints {
            webdav_url: self.webdav_url.clone(),
            token: self.token.clone(),
            preview_base: self.preview_base.clone(),
        }
    }
}

impl CacheConfigToml {
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
        }
    }
}

impl ClientConfigToml {
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            full_asset_timeout: Duration::from_secs(self.full_asset_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

impl SyncConfigToml {
    pub fn to_runtime_config(&self) -> Result<SyncConfig> {
        for (field, value) in [
            ("sync.thumb_workers", self.thumb_workers),
            ("sync.full_workers", self.full_workers),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "must be non-zero".to_string(),
                }
                .into());
            }
        }
        Ok(SyncConfig {
            thumb_workers: self.thumb_workers,
            full_workers: self.full_workers,
            revalidate: self.revalidate,
        })
    }
}

impl ListingConfigToml {
    pub fn to_runtime_config(&self, share: &ShareConfigToml) -> Result<ListerConfig> {
        let source = match self.source.as_str() {
            "webdav" => ListingSource::WebDav,
            "page" => ListingSource::Page {
                url: share.page_url.clone(),
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "listing.source".to_string(),
                    value: other.to_string(),
                    reason: "expected \"webdav\" or \"page\"".to_string(),
                }
                .into())
            }
        };

        // The WebDAV listing reports hrefs prefixed with the endpoint path
        let base_prefix = url::Url::parse(&share.webdav_url)
            .ok()
            .map(|u| u.path().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(ListerConfig {
            source,
            normalizer: NormalizerConfig {
                base_prefix,
                unsafe_chars: self.unsafe_chars.chars().collect(),
            },
            extensions: self.extensions.clone(),
            thumb_width: self.thumb_width,
            thumb_height: self.thumb_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_converts() {
        let config = AppConfig::default();
        let (endpoints, _cache, client, sync, lister) = config.to_runtime_config().unwrap();

        assert_eq!(endpoints.token, share::DEFAULT_SHARE_TOKEN);
        assert_eq!(client.max_retries, limits::MAX_RETRIES);
        assert_eq!(sync.thumb_workers, workers::DEFAULT_THUMB_WORKERS);
        assert_eq!(sync.full_workers, workers::DEFAULT_FULL_WORKERS);
        assert!(matches!(lister.source, ListingSource::WebDav));
        assert_eq!(
            lister.normalizer.base_prefix.as_deref(),
            Some("/public.php/webdav")
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = AppConfig {
            sync: SyncConfigToml {
                thumb_workers: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.to_runtime_config().is_err());

        let config = AppConfig {
            sync: SyncConfigToml {
                full_workers: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.to_runtime_config().is_err());
    }

    #[test]
    fn test_unknown_listing_source_rejected() {
        let mut config = AppConfig::default();
        config.listing.source = "ftp".to_string();
        assert!(config.to_runtime_config().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.share.webdav_url, config.share.webdav_url);
        assert_eq!(back.sync.thumb_workers, config.sync.thumb_workers);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            [sync]
            thumb_workers = 4
            revalidate = true
        "#;
        // Sections not present fall back to their defaults
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.sync.thumb_workers, 4);
        assert!(config.sync.revalidate);
        assert_eq!(config.share.token, share::DEFAULT_SHARE_TOKEN);
    }
}
