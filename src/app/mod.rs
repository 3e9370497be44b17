//! Core application logic for wallsync
//!
//! This module contains the main application components: identifier
//! normalization, content-key derivation, the share HTTP client, remote
//! listing, the thumbnail cache store, the sync engine, and categorization.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wallsync::app::{
//!     CacheConfig, CacheStore, ClientConfig, ListerConfig, RemoteLister, ShareClient,
//!     ShareEndpoints, SyncConfig, SyncEngine,
//! };
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ShareClient::new(
//!     ShareEndpoints::default(),
//!     ClientConfig::default(),
//! )?);
//! let cache = Arc::new(CacheStore::new(CacheConfig::default()).await?);
//!
//! let lister = RemoteLister::new(&client, ListerConfig::default());
//! let listing = lister.list().await;
//!
//! let engine = SyncEngine::new(client.clone(), cache, SyncConfig::default());
//! let (tx, mut rx) = mpsc::channel(100);
//! let summary = engine.run_listed(listing, tx).await;
//! println!("{}/{} synced", summary.succeeded, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod categorize;
pub mod client;
pub mod ident;
pub mod key;
pub mod listing;
pub mod models;
pub mod sync;

// Re-export main public API
pub use cache::{CacheConfig, CacheStats, CacheStore};
pub use categorize::{categorize, category_for_identifier};
pub use client::{ClientConfig, ShareClient, ShareEndpoints};
pub use ident::{has_supported_extension, normalize, NormalizerConfig};
pub use key::ContentKey;
pub use listing::{ListerConfig, ListingSource, RemoteLister};
pub use models::{Asset, AssetOutcome, Disposition, EntryMeta, PassSummary, Validators};
pub use sync::{FetchOutcome, SyncConfig, SyncEngine, SyncEvent, ThumbFetcher};
