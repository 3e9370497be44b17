//! Data models for wallsync
//!
//! Core data structures shared between the lister, sync engine, cache, and
//! presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::key::ContentKey;

/// One remote image asset from a listing pass
///
/// The identifier is the canonical, normalized remote path and the sole join
/// key between listing, cache, and UI. Immutable once constructed for a
/// given sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Canonical identifier, stable across listing-protocol quirks
    pub identifier: String,
    /// URL of the small preview rendition
    pub preview_url: String,
    /// URL of the full-resolution asset
    pub full_url: String,
    /// Category bucket derived from path structure
    pub category: String,
}

impl Asset {
    /// Content key addressing this asset's cache entry
    pub fn content_key(&self) -> ContentKey {
        ContentKey::from_identifier(&self.identifier)
    }
}

/// HTTP conditional-request tokens stored alongside a cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validators {
    /// Entity tag from the last successful fetch
    pub etag: Option<String>,
    /// Last-Modified header from the last successful fetch
    pub last_modified: Option<String>,
}

impl Validators {
    /// True when no conditional request can be built from these validators
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Metadata sidecar persisted next to each content file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Validators captured from the fetch response
    #[serde(flatten)]
    pub validators: Validators,
    /// URL the entry was fetched from
    pub source_url: String,
    /// When the entry was written
    pub fetched_at: DateTime<Utc>,
}

/// Terminal disposition of one asset within a sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Served from the cache without a network fetch (or revalidated 304)
    CacheHit,
    /// Fetched from the remote and written to the cache
    Fetched,
    /// Fetch or cache write failed; retried from scratch next pass
    Failed { reason: String },
}

/// Resolution of one asset within a sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    /// Canonical identifier of the asset
    pub identifier: String,
    /// How the asset resolved
    pub disposition: Disposition,
}

impl AssetOutcome {
    /// True unless the asset failed
    pub fn is_success(&self) -> bool {
        !matches!(self.disposition, Disposition::Failed { .. })
    }
}

/// Aggregate result of one completed sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Assets listed this pass
    pub total: usize,
    /// Assets that resolved as cache hits or fetches
    pub succeeded: usize,
    /// Assets that failed
    pub failed: usize,
    /// Failed identifiers with reasons, in resolution order
    pub failed_ids: Vec<(String, String)>,
    /// Listing failure that degraded this pass to an empty one
    pub listing_error: Option<String>,
}

impl PassSummary {
    /// Record one resolved asset
    pub fn record(&mut self, outcome: &AssetOutcome) {
        if let Disposition::Failed { reason } = &outcome.disposition {
            self.failed += 1;
            self.failed_ids
                .push((outcome.identifier.clone(), reason.clone()));
        } else {
            self.succeeded += 1;
        }
    }
}
