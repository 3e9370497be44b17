//! Sync engine: reconcile the remote listing against the thumbnail cache
//!
//! One sync pass drives every listed asset to a terminal state:
//!
//! - `CacheHit` — an entry exists and no revalidation is configured (zero
//!   network traffic), or the server answered a conditional fetch with 304
//! - `Fetched` — the preview was downloaded and written to the cache
//! - `Failed` — the fetch or cache write failed; the asset is omitted from
//!   this pass and retried from scratch next pass
//!
//! Fetches run on a bounded worker pool; the bound is configuration, not a
//! constant, and is never exceeded. Each resolution emits a monotonically
//! increasing `(resolved, total)` progress event, and a single pass-complete
//! event follows strictly after all of them.
//!
//! A pass may be abandoned by starting a newer one: in-flight fetches of the
//! stale pass are allowed to finish and write into the cache (writes are
//! idempotent per key), but their emissions are suppressed so stale results
//! never overwrite a newer pass's view.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::app::cache::CacheStore;
use crate::app::models::{Asset, AssetOutcome, Disposition, PassSummary, Validators};
use crate::constants::workers;
use crate::errors::{DownloadResult, ListingResult};

/// Result of one preview fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Conditional request answered 304; cached bytes remain valid
    NotModified,
    /// Fresh body with the validators the server attached to it
    Fetched {
        bytes: Vec<u8>,
        validators: Validators,
    },
}

/// Seam between the sync engine and the network
///
/// `ShareClient` is the production implementation; tests inject mocks to
/// exercise the state machine without a network.
pub trait ThumbFetcher: Send + Sync {
    /// Fetch an asset's preview, conditionally when validators are given
    fn fetch_thumb(
        &self,
        asset: &Asset,
        validators: Option<&Validators>,
    ) -> impl Future<Output = DownloadResult<FetchOutcome>> + Send;
}

/// Configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum concurrent thumbnail fetches (the worker-pool bound)
    pub thumb_workers: usize,
    /// Maximum concurrent full-asset downloads for callers that batch them
    /// (the CLI fetch path downloads one asset per invocation)
    pub full_workers: usize,
    /// Issue conditional fetches for assets already cached
    pub revalidate: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            thumb_workers: workers::DEFAULT_THUMB_WORKERS,
            full_workers: workers::DEFAULT_FULL_WORKERS,
            revalidate: false,
        }
    }
}

/// Progress and completion events emitted during a pass
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// One asset reached a terminal state
    Resolved {
        /// Pass generation the event belongs to
        pass: u64,
        outcome: AssetOutcome,
        /// Assets resolved so far, monotonically increasing
        resolved: usize,
        /// Assets listed this pass
        total: usize,
    },
    /// Every asset of the pass has resolved
    PassComplete { pass: u64, summary: PassSummary },
}

/// Reconciles listings against the cache store
///
/// The cache store is an explicit dependency passed in at construction; no
/// process-wide state.
#[derive(Debug)]
pub struct SyncEngine<F> {
    fetcher: Arc<F>,
    cache: Arc<CacheStore>,
    config: SyncConfig,
    /// Current pass generation; bumping it abandons older passes
    generation: Arc<AtomicU64>,
}

impl<F> SyncEngine<F>
where
    F: ThumbFetcher + 'static,
{
    pub fn new(fetcher: Arc<F>, cache: Arc<CacheStore>, config: SyncConfig) -> Self {
        Self {
            fetcher,
            cache,
            config,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The cache store this engine reconciles against
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Run a pass over a listing result, downgrading listing failure
    ///
    /// A failed listing is a valid, terminal-for-this-pass state: the pass
    /// runs over zero assets and the error is reported in the summary, never
    /// raised.
    pub async fn run_listed(
        &self,
        listing: ListingResult<Vec<Asset>>,
        events: mpsc::Sender<SyncEvent>,
    ) -> PassSummary {
        match listing {
            Ok(assets) => self.run_pass(assets, events).await,
            Err(e) => {
                error!("listing failed, syncing nothing this pass: {}", e);
                let mut summary = self.run_pass(Vec::new(), events).await;
                summary.listing_error = Some(e.to_string());
                summary
            }
        }
    }

    /// Run one sync pass over the given assets
    ///
    /// Returns the pass summary. Events carry the pass generation; when a
    /// newer pass supersedes this one mid-flight, remaining emissions are
    /// suppressed and no completion event is sent for the stale pass.
    pub async fn run_pass(
        &self,
        assets: Vec<Asset>,
        events: mpsc::Sender<SyncEvent>,
    ) -> PassSummary {
        let pass = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let total = assets.len();
        info!("sync pass {} over {} assets", pass, total);

        let queue = Arc::new(Mutex::new(VecDeque::from(assets)));
        let progress = Arc::new(Mutex::new(PassProgress {
            resolved: 0,
            summary: PassSummary {
                total,
                ..Default::default()
            },
        }));

        let worker_count = self.config.thumb_workers.max(1).min(total.max(1));
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let fetcher = self.fetcher.clone();
            let cache = self.cache.clone();
            let config = self.config.clone();
            let generation = self.generation.clone();
            let queue = queue.clone();
            let progress = progress.clone();
            let events = events.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if generation.load(Ordering::SeqCst) != pass {
                        debug!("pass {} superseded, worker stopping", pass);
                        break;
                    }
                    let Some(asset) = queue.lock().await.pop_front() else {
                        break;
                    };

                    let outcome = resolve_asset(&*fetcher, &cache, &config, &asset).await;

                    // Stale passes finish their writes but stay silent
                    if generation.load(Ordering::SeqCst) != pass {
                        debug!(
                            "discarding stale emission for {} (pass {})",
                            outcome.identifier, pass
                        );
                        continue;
                    }

                    // The lock is held across the send: releasing it first
                    // would let two workers deliver their increments out of
                    // order on a multi-thread runtime
                    let mut guard = progress.lock().await;
                    guard.resolved += 1;
                    guard.summary.record(&outcome);
                    let event = SyncEvent::Resolved {
                        pass,
                        outcome,
                        resolved: guard.resolved,
                        total,
                    };
                    if events.send(event).await.is_err() {
                        debug!("event receiver dropped, continuing pass {}", pass);
                    }
                    drop(guard);
                }
            }));
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                warn!("sync worker panicked: {}", e);
            }
        }

        let summary = progress.lock().await.summary.clone();
        if self.generation.load(Ordering::SeqCst) == pass {
            let _ = events
                .send(SyncEvent::PassComplete {
                    pass,
                    summary: summary.clone(),
                })
                .await;
            info!(
                "pass {} complete: {}/{} succeeded, {} failed",
                pass, summary.succeeded, summary.total, summary.failed
            );
        } else {
            info!("pass {} abandoned before completion", pass);
        }
        summary
    }
}

struct PassProgress {
    resolved: usize,
    summary: PassSummary,
}

/// Drive one asset through the per-asset state machine
async fn resolve_asset<F: ThumbFetcher>(
    fetcher: &F,
    cache: &CacheStore,
    config: &SyncConfig,
    asset: &Asset,
) -> AssetOutcome {
    let key = asset.content_key();

    let disposition = if cache.exists(&key) {
        if !config.revalidate {
            // Cache-hit short circuit: no network call at all
            Disposition::CacheHit
        } else {
            let validators = cache.validators_for(&key).await;
            match fetcher.fetch_thumb(asset, Some(&validators)).await {
                Ok(FetchOutcome::NotModified) => Disposition::CacheHit,
                Ok(FetchOutcome::Fetched { bytes, validators }) => {
                    match cache
                        .write(&key, &bytes, &validators, &asset.preview_url)
                        .await
                    {
                        Ok(()) => Disposition::Fetched,
                        Err(e) => Disposition::Failed {
                            reason: e.to_string(),
                        },
                    }
                }
                Err(e) => Disposition::Failed {
                    reason: e.to_string(),
                },
            }
        }
    } else {
        match fetcher.fetch_thumb(asset, None).await {
            Ok(FetchOutcome::Fetched { bytes, validators }) => {
                match cache
                    .write(&key, &bytes, &validators, &asset.preview_url)
                    .await
                {
                    Ok(()) => Disposition::Fetched,
                    Err(e) => Disposition::Failed {
                        reason: e.to_string(),
                    },
                }
            }
            Ok(FetchOutcome::NotModified) => Disposition::Failed {
                reason: "server answered 304 for an unconditional fetch".to_string(),
            },
            Err(e) => Disposition::Failed {
                reason: e.to_string(),
            },
        }
    };

    if let Disposition::Failed { reason } = &disposition {
        warn!("{}: {}", asset.identifier, reason);
    }

    AssetOutcome {
        identifier: asset.identifier.clone(),
        disposition,
    }
}
