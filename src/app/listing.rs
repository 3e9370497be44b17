//! Remote listing of wallpaper assets
//!
//! Produces a deduplicated, extension-filtered sequence of [`Asset`]s from
//! one of two sources: the share's WebDAV directory listing (a PROPFIND
//! multistatus document) or a scraped wallpaper page (headings establish the
//! active category for the images that follow them, in document order).
//!
//! Listing failures surface as `ListingError`; the sync engine downgrades
//! them to an empty pass with a reported error. Nothing here panics on
//! remote garbage.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::app::categorize::category_for_identifier;
use crate::app::client::{ShareClient, ShareEndpoints};
use crate::app::ident::{has_supported_extension, normalize, NormalizerConfig};
use crate::app::models::Asset;
use crate::constants::{ident, selectors, share};
use crate::errors::{ListingError, ListingResult};

/// Which remote source a listing pass queries
#[derive(Debug, Clone)]
pub enum ListingSource {
    /// PROPFIND against the share's WebDAV endpoint
    WebDav,
    /// Scrape of a wallpaper web page
    Page { url: String },
}

/// Configuration for the remote lister
#[derive(Debug, Clone)]
pub struct ListerConfig {
    /// Source to query
    pub source: ListingSource,
    /// Identifier normalization settings
    pub normalizer: NormalizerConfig,
    /// Supported extensions (lowercase)
    pub extensions: Vec<String>,
    /// Preview rendition size requested for each asset
    pub thumb_width: u32,
    pub thumb_height: u32,
}

impl Default for ListerConfig {
    fn default() -> Self {
        Self {
            source: ListingSource::WebDav,
            normalizer: NormalizerConfig::default(),
            extensions: crate::constants::files::SUPPORTED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thumb_width: share::THUMB_WIDTH,
            thumb_height: share::THUMB_HEIGHT,
        }
    }
}

/// Remote lister over a share client
#[derive(Debug)]
pub struct RemoteLister<'a> {
    client: &'a ShareClient,
    config: ListerConfig,
}

impl<'a> RemoteLister<'a> {
    pub fn new(client: &'a ShareClient, config: ListerConfig) -> Self {
        Self { client, config }
    }

    /// Query the configured source and produce the assets for this pass
    pub async fn list(&self) -> ListingResult<Vec<Asset>> {
        match &self.config.source {
            ListingSource::WebDav => {
                let body = self.client.propfind_listing().await?;
                parse_multistatus(
                    &body,
                    self.client.endpoints(),
                    &self.config,
                )
            }
            ListingSource::Page { url } => {
                let html = self.client.get_page(url).await?;
                parse_wallpaper_page(&html, url, &self.config)
            }
        }
    }
}

/// Parse a WebDAV multistatus document into assets
///
/// The document is walked namespace-agnostically: any element whose local
/// name is `href` contributes a path, whatever prefix the server chose.
/// Directory entries (trailing separator) are skipped, identifiers are
/// normalized and extension-filtered, duplicates keep the first occurrence.
pub fn parse_multistatus(
    body: &str,
    endpoints: &ShareEndpoints,
    config: &ListerConfig,
) -> ListingResult<Vec<Asset>> {
    let document = Html::parse_document(body);

    let mut hrefs = Vec::new();
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let name = element.value().name();
        if name == "href" || name.ends_with(":href") {
            let text: String = element.text().collect();
            let text = text.trim();
            if !text.is_empty() {
                hrefs.push(text.to_string());
            }
        }
    }

    if hrefs.is_empty() {
        return Err(ListingError::Multistatus {
            reason: "no href entries in response".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for href in hrefs {
        if href.ends_with('/') {
            continue; // directory marker
        }
        let Some(identifier) = normalize(&href, &config.normalizer) else {
            continue;
        };
        if !has_supported_extension(&identifier, &config.extensions) {
            continue;
        }
        if !seen.insert(identifier.clone()) {
            continue;
        }

        let full_url = match endpoints.full_url(&identifier) {
            Ok(url) => url,
            Err(e) => {
                warn!("skipping {}: {}", identifier, e);
                continue;
            }
        };
        assets.push(Asset {
            preview_url: endpoints.preview_url(
                &identifier,
                config.thumb_width,
                config.thumb_height,
            ),
            full_url,
            category: category_for_identifier(&identifier),
            identifier,
        });
    }

    debug!("multistatus listing yielded {} assets", assets.len());
    Ok(assets)
}

/// Parse a scraped wallpaper page into assets
///
/// Headings (h1–h4) encountered in document order set the active category
/// for subsequent images. An image's enclosing link, when present, supplies
/// the full-resolution URL; otherwise the image source serves as both
/// preview and full URL.
pub fn parse_wallpaper_page(
    html: &str,
    page_url: &str,
    config: &ListerConfig,
) -> ListingResult<Vec<Asset>> {
    let base = url::Url::parse(page_url).map_err(|_| ListingError::InvalidUrl {
        url: page_url.to_string(),
    })?;
    let document = Html::parse_document(html);
    let walk = Selector::parse(selectors::DOCUMENT_WALK_SELECTOR)
        .expect("document walk selector is valid");

    let mut category = ident::UNCATEGORIZED.to_string();
    let mut seen = HashSet::new();
    let mut assets = Vec::new();

    for element in document.select(&walk) {
        let name = element.value().name();
        if name.starts_with('h') {
            let heading: String = element.text().collect();
            let heading = heading.trim();
            if !heading.is_empty() {
                category = heading.to_string();
            }
            continue;
        }

        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let Ok(preview) = base.join(src) else {
            debug!("unresolvable image source: {}", src);
            continue;
        };

        let raw_name = preview
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default();
        let Some(identifier) = normalize(raw_name, &config.normalizer) else {
            continue;
        };
        if !has_supported_extension(&identifier, &config.extensions) {
            continue;
        }
        if !seen.insert(identifier.clone()) {
            continue;
        }

        let full = enclosing_link(element)
            .and_then(|href| base.join(href).ok())
            .unwrap_or_else(|| preview.clone());

        assets.push(Asset {
            identifier,
            preview_url: preview.to_string(),
            full_url: full.to_string(),
            category: category.clone(),
        });
    }

    debug!("page listing yielded {} assets", assets.len());
    Ok(assets)
}

/// Href of the nearest enclosing anchor, if any
fn enclosing_link(element: ElementRef<'_>) -> Option<&str> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}
