//! HTTP client for the public wallpaper share
//!
//! Wraps `reqwest` with rate limiting, retry with exponential backoff, and
//! the share's three request shapes: a PROPFIND directory listing, preview
//! (thumbnail) fetches with conditional-request support, and full-asset
//! downloads. URL construction lives here too, because the preview API and
//! the WebDAV endpoint disagree about escaping: previews take the identifier
//! un-escaped as a query value, WebDAV takes it percent-encoded per segment.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, warn};

use crate::app::models::{Asset, Validators};
use crate::app::sync::{FetchOutcome, ThumbFetcher};
use crate::constants::{http, limits, share};
use crate::errors::{DownloadError, DownloadResult, ListingError, ListingResult};

/// Configuration for HTTP client behaviour
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout for listing and thumbnail fetches
    pub request_timeout: Duration,
    /// Request timeout for full-resolution downloads
    pub full_asset_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Maximum retry attempts per request
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            full_asset_timeout: http::FULL_ASSET_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            max_retries: limits::MAX_RETRIES,
            retry_base_delay: Duration::from_millis(limits::RETRY_BASE_DELAY_MS),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// Where the share lives and how its URLs are built
#[derive(Debug, Clone)]
pub struct ShareEndpoints {
    /// WebDAV endpoint of the public share (trailing slash expected)
    pub webdav_url: String,
    /// Share token, used as the basic-auth username and in preview URLs
    pub token: String,
    /// Preview API base URL (no trailing slash)
    pub preview_base: String,
}

impl Default for ShareEndpoints {
    fn default() -> Self {
        Self {
            webdav_url: share::DEFAULT_WEBDAV_URL.to_string(),
            token: share::DEFAULT_SHARE_TOKEN.to_string(),
            preview_base: share::DEFAULT_PREVIEW_BASE.to_string(),
        }
    }
}

impl ShareEndpoints {
    /// Preview URL for an identifier at a given rendition size
    ///
    /// The preview API expects the identifier un-escaped; the normalizer has
    /// already removed characters that would break the query string.
    pub fn preview_url(&self, identifier: &str, width: u32, height: u32) -> String {
        format!(
            "{}/{}?file=/{}&x={}&y={}&a=1",
            self.preview_base, self.token, identifier, width, height
        )
    }

    /// Full-resolution WebDAV URL for an identifier
    ///
    /// WebDAV accepts encoded paths, so each path segment is
    /// percent-encoded here.
    pub fn full_url(&self, identifier: &str) -> DownloadResult<String> {
        let mut url =
            url::Url::parse(&self.webdav_url).map_err(|e| DownloadError::InvalidUrl {
                url: self.webdav_url.clone(),
                error: e.to_string(),
            })?;
        url.path_segments_mut()
            .map_err(|_| DownloadError::InvalidUrl {
                url: self.webdav_url.clone(),
                error: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(identifier.split('/'));
        Ok(url.to_string())
    }
}

/// HTTP client for the wallpaper share
#[derive(Debug)]
pub struct ShareClient {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    endpoints: ShareEndpoints,
    config: ClientConfig,
}

impl ShareClient {
    /// Create a client for the given share endpoints
    pub fn new(endpoints: ShareEndpoints, config: ClientConfig) -> DownloadResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(true)
            .pool_idle_timeout(Some(http::POOL_IDLE_TIMEOUT))
            .pool_max_idle_per_host(http::POOL_MAX_PER_HOST)
            .build()
            .map_err(DownloadError::Http)?;

        let rps = NonZeroU32::new(config.rate_limit_rps.max(1)).expect("clamped to >= 1");
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Ok(Self {
            client,
            rate_limiter,
            endpoints,
            config,
        })
    }

    /// The configured share endpoints
    pub fn endpoints(&self) -> &ShareEndpoints {
        &self.endpoints
    }

    /// Execute a request with rate limiting and retry on transient failures
    ///
    /// Retries transport errors, 429 and 503 with exponential backoff; all
    /// other responses are returned to the caller for status handling.
    async fn execute_with_retry<F>(&self, build: F) -> DownloadResult<Response>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut retries = 0;
        loop {
            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();
                    if (status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE)
                        && retries < self.config.max_retries
                    {
                        retries += 1;
                        let delay = self.config.retry_base_delay * 2_u32.pow(retries);
                        warn!(
                            "server busy ({}), backing off for {}ms",
                            status,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = self.config.retry_base_delay * 2_u32.pow(retries);
                    warn!(
                        "request failed (attempt {}/{}): {}. retrying in {}ms",
                        retries,
                        self.config.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!("request failed after {} retries: {}", retries, e);
                    return Err(DownloadError::MaxRetriesExceeded {
                        max_retries: self.config.max_retries,
                    });
                }
            }
        }
    }

    /// Issue a PROPFIND against the share's WebDAV endpoint
    ///
    /// Returns the raw multistatus body; 207 and 200 both count as success.
    pub async fn propfind_listing(&self) -> ListingResult<String> {
        let url = self.endpoints.webdav_url.clone();
        let token = self.endpoints.token.clone();
        let method = Method::from_bytes(b"PROPFIND").expect("PROPFIND is a valid method");

        let response = self
            .execute_with_retry(|client| {
                client
                    .request(method.clone(), &url)
                    .basic_auth(&token, Some(""))
                    .header("Depth", "1")
            })
            .await
            .map_err(|e| match e {
                DownloadError::Http(http) => ListingError::Http(http),
                other => ListingError::Multistatus {
                    reason: other.to_string(),
                },
            })?;

        let status = response.status();
        if status != StatusCode::MULTI_STATUS && status != StatusCode::OK {
            return Err(ListingError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(ListingError::Http)?;
        debug!("fetched multistatus listing ({} bytes)", body.len());
        Ok(body)
    }

    /// Fetch the HTML of the wallpaper page for the scrape listing mode
    pub async fn get_page(&self, url: &str) -> ListingResult<String> {
        let owned = url.to_string();
        let response = self
            .execute_with_retry(|client| client.get(&owned))
            .await
            .map_err(|e| match e {
                DownloadError::Http(http) => ListingError::Http(http),
                other => ListingError::Page {
                    reason: other.to_string(),
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ListingError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(ListingError::Http)?;
        debug!("fetched wallpaper page ({} bytes)", body.len());
        Ok(body)
    }

    /// Download a large preview rendition for an identifier
    ///
    /// Uses the public preview API, which needs no auth; sized per the
    /// configured rendition.
    pub async fn fetch_preview(
        &self,
        identifier: &str,
        width: u32,
        height: u32,
    ) -> DownloadResult<Vec<u8>> {
        let url = self.endpoints.preview_url(identifier, width, height);
        let response = self.execute_with_retry(|client| client.get(&url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(DownloadError::Http)?;
        debug!("downloaded preview {} ({} bytes)", identifier, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Download the full-resolution asset for an identifier
    ///
    /// Single request with the shared retry policy, no caching. Invoked only
    /// on explicit user action, never during bulk sync.
    pub async fn fetch_full(&self, identifier: &str) -> DownloadResult<Vec<u8>> {
        let url = self.endpoints.full_url(identifier)?;
        let token = self.endpoints.token.clone();
        let timeout = self.config.full_asset_timeout;

        let response = self
            .execute_with_retry(|client| {
                client.get(&url).basic_auth(&token, Some("")).timeout(timeout)
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(DownloadError::Http)?;
        debug!("downloaded full asset {} ({} bytes)", identifier, bytes.len());
        Ok(bytes.to_vec())
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .map(|s| s.to_string())
}

impl ThumbFetcher for ShareClient {
    /// Fetch an asset's preview rendition, conditionally when validators are
    /// available
    async fn fetch_thumb(
        &self,
        asset: &Asset,
        validators: Option<&Validators>,
    ) -> DownloadResult<FetchOutcome> {
        let url = asset.preview_url.clone();

        let response = self
            .execute_with_retry(|client| {
                let mut request = client.get(&url);
                if let Some(v) = validators {
                    if let Some(etag) = &v.etag {
                        request = request.header(IF_NONE_MATCH, etag);
                    }
                    if let Some(lm) = &v.last_modified {
                        request = request.header(IF_MODIFIED_SINCE, lm);
                    }
                }
                request
            })
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            debug!("not modified: {}", asset.identifier);
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        let fresh = Validators {
            etag: header_string(&response, ETAG),
            last_modified: header_string(&response, LAST_MODIFIED),
        };
        let bytes = response.bytes().await.map_err(DownloadError::Http)?;
        Ok(FetchOutcome::Fetched {
            bytes: bytes.to_vec(),
            validators: fresh,
        })
    }
}
