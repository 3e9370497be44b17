//! Integration tests for the sync engine
//!
//! These tests verify the end-to-end behaviour of a sync pass against a real
//! cache store in a temporary directory, with the network replaced by mock
//! fetchers. They cover the cache-hit short circuit, revalidation, the
//! worker-pool bound, and partial-failure reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use wallsync::app::{
    Asset, CacheConfig, CacheStore, FetchOutcome, SyncConfig, SyncEngine, ThumbFetcher, Validators,
};
use wallsync::errors::{DownloadError, DownloadResult};

/// Mock fetcher that counts requests and tracks concurrent in-flight peaks
struct CountingFetcher {
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    /// Identifiers that fail with HTTP 404
    missing: Vec<String>,
    /// Answer conditional requests with 304
    honor_validators: bool,
    /// Simulated transfer time
    delay: Duration,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            missing: Vec::new(),
            honor_validators: false,
            delay: Duration::ZERO,
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ThumbFetcher for CountingFetcher {
    async fn fetch_thumb(
        &self,
        asset: &Asset,
        validators: Option<&Validators>,
    ) -> DownloadResult<FetchOutcome> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.missing.contains(&asset.identifier) {
            return Err(DownloadError::ServerError { status: 404 });
        }
        if self.honor_validators && validators.is_some_and(|v| !v.is_empty()) {
            return Ok(FetchOutcome::NotModified);
        }
        Ok(FetchOutcome::Fetched {
            bytes: format!("thumb:{}", asset.identifier).into_bytes(),
            validators: Validators {
                etag: Some(format!("\"{}\"", asset.identifier)),
                last_modified: None,
            },
        })
    }
}

fn asset(identifier: &str) -> Asset {
    Asset {
        identifier: identifier.to_string(),
        preview_url: format!("https://example.test/preview/{identifier}"),
        full_url: format!("https://example.test/full/{identifier}"),
        category: "test".to_string(),
    }
}

fn assets(count: usize) -> Vec<Asset> {
    (0..count).map(|i| asset(&format!("img{i}.jpg"))).collect()
}

async fn cache_in(dir: &TempDir) -> Arc<CacheStore> {
    Arc::new(
        CacheStore::new(CacheConfig {
            cache_root: Some(dir.path().to_path_buf()),
        })
        .await
        .unwrap(),
    )
}

fn engine_with(
    fetcher: Arc<CountingFetcher>,
    cache: Arc<CacheStore>,
    config: SyncConfig,
) -> SyncEngine<CountingFetcher> {
    SyncEngine::new(fetcher, cache, config)
}

fn sink() -> mpsc::Sender<wallsync::app::SyncEvent> {
    let (tx, mut rx) = mpsc::channel(1024);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    tx
}

/// A fully cached collection syncs without any network traffic
#[tokio::test]
async fn test_cached_assets_cause_zero_fetches() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;
    let listed = assets(5);

    for a in &listed {
        cache
            .write(&a.content_key(), b"seeded", &Validators::default(), &a.preview_url)
            .await?;
    }

    let fetcher = Arc::new(CountingFetcher::new());
    let engine = engine_with(fetcher.clone(), cache, SyncConfig::default());
    let summary = engine.run_pass(listed, sink()).await;

    assert_eq!(summary.succeeded, 5);
    assert_eq!(fetcher.fetch_count(), 0);
    Ok(())
}

/// A second pass over an unchanged collection is a no-op
#[tokio::test]
async fn test_double_pass_is_idempotent() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;
    let fetcher = Arc::new(CountingFetcher::new());
    let engine = engine_with(fetcher.clone(), cache.clone(), SyncConfig::default());

    let summary = engine.run_pass(assets(8), sink()).await;
    assert_eq!(summary.succeeded, 8);
    assert_eq!(fetcher.fetch_count(), 8);

    let summary = engine.run_pass(assets(8), sink()).await;
    assert_eq!(summary.succeeded, 8);
    // Everything resolved from the cache this time
    assert_eq!(fetcher.fetch_count(), 8);

    let (bytes, _) = cache.read(&asset("img0.jpg").content_key()).await?;
    assert_eq!(bytes, b"thumb:img0.jpg");
    Ok(())
}

/// Revalidation answers 304 and leaves the cached entry untouched
#[tokio::test]
async fn test_revalidation_304_keeps_entry() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;
    let listed = assets(3);

    let seeded = Validators {
        etag: Some("\"seed\"".to_string()),
        last_modified: None,
    };
    for a in &listed {
        cache
            .write(&a.content_key(), b"seeded", &seeded, &a.preview_url)
            .await?;
    }

    let mut fetcher = CountingFetcher::new();
    fetcher.honor_validators = true;
    let fetcher = Arc::new(fetcher);
    let config = SyncConfig {
        revalidate: true,
        ..SyncConfig::default()
    };
    let engine = engine_with(fetcher.clone(), cache.clone(), config);
    let summary = engine.run_pass(listed.clone(), sink()).await;

    assert_eq!(summary.succeeded, 3);
    // One conditional request per asset, no rewrites
    assert_eq!(fetcher.fetch_count(), 3);
    let (bytes, validators) = cache.read(&listed[0].content_key()).await?;
    assert_eq!(bytes, b"seeded");
    assert_eq!(validators, seeded);
    Ok(())
}

/// The worker-pool bound holds under a burst three times its size
#[tokio::test]
async fn test_concurrency_never_exceeds_worker_bound() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;

    let mut fetcher = CountingFetcher::new();
    fetcher.delay = Duration::from_millis(20);
    let fetcher = Arc::new(fetcher);
    let config = SyncConfig {
        thumb_workers: 4,
        ..SyncConfig::default()
    };
    let engine = engine_with(fetcher.clone(), cache, config);
    let summary = engine.run_pass(assets(24), sink()).await;

    assert_eq!(summary.succeeded, 24);
    assert!(
        fetcher.high_water.load(Ordering::SeqCst) <= 4,
        "worker bound exceeded: {}",
        fetcher.high_water.load(Ordering::SeqCst)
    );
    Ok(())
}

/// One failing asset is reported without failing the others
#[tokio::test]
async fn test_partial_failure_is_isolated_and_attributed() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;

    let mut fetcher = CountingFetcher::new();
    fetcher.missing = vec!["img1.jpg".to_string()];
    let fetcher = Arc::new(fetcher);
    let engine = engine_with(fetcher, cache.clone(), SyncConfig::default());
    let summary = engine.run_pass(assets(3), sink()).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_ids.len(), 1);
    assert_eq!(summary.failed_ids[0].0, "img1.jpg");
    assert!(summary.failed_ids[0].1.contains("404"));

    // The failed asset left no cache entry; the others did
    assert!(!cache.exists(&asset("img1.jpg").content_key()));
    assert!(cache.exists(&asset("img0.jpg").content_key()));
    assert!(cache.exists(&asset("img2.jpg").content_key()));
    Ok(())
}

/// Progress counts arrive in strictly increasing order even when workers
/// race on a multi-thread runtime
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_progress_delivery_is_monotonic_across_threads() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;
    let fetcher = Arc::new(CountingFetcher::new());
    let config = SyncConfig {
        thumb_workers: 8,
        ..SyncConfig::default()
    };
    let engine = engine_with(fetcher, cache, config);

    for _ in 0..50 {
        let (tx, mut rx) = mpsc::channel(256);
        let collector = tokio::spawn(async move {
            let mut order = Vec::new();
            while let Some(event) = rx.recv().await {
                if let wallsync::app::SyncEvent::Resolved { resolved, .. } = event {
                    order.push(resolved);
                }
            }
            order
        });

        engine.run_pass(assets(64), tx).await;

        let order = collector.await?;
        assert_eq!(order.len(), 64);
        for pair in order.windows(2) {
            assert!(
                pair[1] > pair[0],
                "resolved {} delivered after {}",
                pair[1],
                pair[0]
            );
        }
    }
    Ok(())
}

/// A superseded pass goes silent: no completion event, remaining work dropped
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_superseded_pass_emits_no_completion() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;

    let mut fetcher = CountingFetcher::new();
    fetcher.delay = Duration::from_millis(30);
    let fetcher = Arc::new(fetcher);
    let config = SyncConfig {
        thumb_workers: 2,
        ..SyncConfig::default()
    };
    let engine = Arc::new(engine_with(fetcher, cache, config));

    let (tx, mut rx) = mpsc::channel(256);
    let slow = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_pass(assets(16), tx).await })
    };

    // Let the first pass make some progress, then supersede it
    let first = rx.recv().await.expect("first pass emits before completion");
    assert!(matches!(first, wallsync::app::SyncEvent::Resolved { .. }));
    let newer = engine.run_pass(assets(4), sink()).await;
    assert_eq!(newer.succeeded, 4);

    let stale = slow.await?;
    // The stale pass abandoned its queue and never completed
    assert!(stale.succeeded < stale.total);
    while let Some(event) = rx.recv().await {
        assert!(
            !matches!(event, wallsync::app::SyncEvent::PassComplete { .. }),
            "stale pass must not emit a completion event"
        );
    }
    Ok(())
}

/// Validators from the fetch response are persisted for the next pass
#[tokio::test]
async fn test_fetched_validators_are_persisted() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cache = cache_in(&dir).await;
    let fetcher = Arc::new(CountingFetcher::new());
    let engine = engine_with(fetcher, cache.clone(), SyncConfig::default());

    engine.run_pass(vec![asset("img0.jpg")], sink()).await;

    let stored = cache.validators_for(&asset("img0.jpg").content_key()).await;
    assert_eq!(stored.etag.as_deref(), Some("\"img0.jpg\""));
    Ok(())
}
