//! Command handlers for the wallsync CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the core application: thumbnail sync, listing, category
//! display, full-asset download, and cache inspection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::{
    categorize, CacheStore, ListerConfig, ListingSource, RemoteLister, ShareClient, SyncEngine,
};
use crate::cli::{
    CacheAction, CacheArgs, CategoriesArgs, FetchArgs, GlobalArgs, ListArgs, ProgressConfig,
    ProgressDisplay, SyncArgs,
};
use crate::config::AppConfig;
use crate::constants::workers;
use crate::errors::{AppError, Result};

/// Runtime components shared by the command handlers
struct Runtime {
    client: Arc<ShareClient>,
    cache: Arc<CacheStore>,
    sync: crate::app::SyncConfig,
    lister: ListerConfig,
    page_url: String,
}

/// Load configuration and construct the shared runtime
async fn build_runtime(global: &GlobalArgs) -> Result<Runtime> {
    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(dir) = &global.cache_dir {
        config.cache.cache_root = Some(dir.clone());
    }
    let page_url = config.share.page_url.clone();
    let (endpoints, cache_config, client_config, sync, lister) = config.to_runtime_config()?;

    let client = Arc::new(ShareClient::new(endpoints, client_config).map_err(AppError::Download)?);
    let cache = Arc::new(CacheStore::new(cache_config).await.map_err(AppError::Cache)?);

    Ok(Runtime {
        client,
        cache,
        sync,
        lister,
        page_url,
    })
}

fn apply_source_override(lister: &mut ListerConfig, from_page: bool, page_url: &str) {
    if from_page {
        lister.source = ListingSource::Page {
            url: page_url.to_string(),
        };
    }
}

/// Handle the sync command
///
/// Lists the remote, reconciles every asset against the cache on a bounded
/// worker pool, and reports the pass summary.
pub async fn handle_sync(args: SyncArgs, global: &GlobalArgs) -> Result<()> {
    let start = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let mut runtime = build_runtime(global).await?;
    if let Some(workers) = args.workers {
        runtime.sync.thumb_workers = workers;
    }
    if args.revalidate {
        runtime.sync.revalidate = true;
    }
    apply_source_override(&mut runtime.lister, args.from_page, &runtime.page_url);

    info!(
        "starting sync with {} workers (revalidate: {})",
        runtime.sync.thumb_workers, runtime.sync.revalidate
    );

    let listing = RemoteLister::new(&runtime.client, runtime.lister.clone())
        .list()
        .await;

    let engine = SyncEngine::new(
        runtime.client.clone(),
        runtime.cache.clone(),
        runtime.sync.clone(),
    );
    let (tx, rx) = mpsc::channel(workers::CHANNEL_BUFFER_SIZE);
    let mut display = ProgressDisplay::new(ProgressConfig {
        enable_progress_bar: !args.no_progress && !global.quiet,
        ..ProgressConfig::default()
    });

    let (summary, _) = tokio::join!(engine.run_listed(listing, tx), display.run(rx));

    if let Some(reason) = &summary.listing_error {
        warn!("listing failed: {}", reason);
        println!("Listing failed, nothing synced: {reason}");
    }
    println!(
        "Synced {}/{} assets in {:.1?} ({} failed)",
        summary.succeeded,
        summary.total,
        start.elapsed(),
        summary.failed
    );
    for (identifier, reason) in &summary.failed_ids {
        println!("  failed: {identifier}: {reason}");
    }
    Ok(())
}

/// Handle the list command
pub async fn handle_list(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let mut runtime = build_runtime(global).await?;
    apply_source_override(&mut runtime.lister, args.from_page, &runtime.page_url);

    let assets = RemoteLister::new(&runtime.client, runtime.lister.clone())
        .list()
        .await
        .map_err(AppError::Listing)?;

    for asset in &assets {
        if args.urls {
            println!("{}", asset.identifier);
            println!("  preview: {}", asset.preview_url);
            println!("  full:    {}", asset.full_url);
        } else {
            println!("{}", asset.identifier);
        }
    }
    println!("{} assets", assets.len());
    Ok(())
}

/// Handle the categories command
pub async fn handle_categories(args: CategoriesArgs, global: &GlobalArgs) -> Result<()> {
    let mut runtime = build_runtime(global).await?;
    apply_source_override(&mut runtime.lister, args.from_page, &runtime.page_url);

    let assets = RemoteLister::new(&runtime.client, runtime.lister.clone())
        .list()
        .await
        .map_err(AppError::Listing)?;
    let buckets = categorize(&assets);

    for (bucket, members) in &buckets {
        println!("{} ({})", bucket, members.len());
        if !args.summary {
            for identifier in members {
                println!("  {identifier}");
            }
        }
    }
    Ok(())
}

/// Handle the fetch command
///
/// Downloads one full-resolution asset and writes it atomically to the
/// output path.
pub async fn handle_fetch(args: FetchArgs, global: &GlobalArgs) -> Result<()> {
    let runtime = build_runtime(global).await?;

    let output = match args.output {
        Some(path) => path,
        None => default_output_path(&args.identifier)?,
    };

    let bytes = if args.preview {
        info!("fetching large preview for {}", args.identifier);
        runtime
            .client
            .fetch_preview(
                &args.identifier,
                crate::constants::share::PREVIEW_WIDTH,
                crate::constants::share::PREVIEW_HEIGHT,
            )
            .await
            .map_err(AppError::Download)?
    } else {
        info!("fetching full asset {}", args.identifier);
        runtime
            .client
            .fetch_full(&args.identifier)
            .await
            .map_err(AppError::Download)?
    };

    let temp = output.with_extension("part");
    tokio::fs::write(&temp, &bytes).await?;
    tokio::fs::rename(&temp, &output).await?;

    println!(
        "Saved {} ({} bytes) to {}",
        args.identifier,
        bytes.len(),
        output.display()
    );
    Ok(())
}

/// Output file name for an identifier: its last path segment
fn default_output_path(identifier: &str) -> Result<PathBuf> {
    let name = identifier
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::generic(format!("cannot derive a file name from: {identifier}")))?;
    Ok(PathBuf::from(name))
}

/// Handle cache inspection commands
pub async fn handle_cache(args: CacheArgs, global: &GlobalArgs) -> Result<()> {
    let runtime = build_runtime(global).await?;

    match args.action {
        CacheAction::Info => {
            let stats = runtime.cache.stats().await.map_err(AppError::Cache)?;
            println!("Cache directory: {}", runtime.cache.cache_root().display());
            println!("Entries:         {}", stats.entry_count);
            println!("Total size:      {} bytes", stats.total_bytes);
        }
        CacheAction::Path => {
            println!("{}", runtime.cache.cache_root().display());
        }
    }
    Ok(())
}
