//! Command-line argument parsing for wallsync
//!
//! This module defines the CLI structure using clap derive macros, covering
//! thumbnail sync, remote listing, category display, full-asset fetching,
//! and cache inspection.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// wallsync - Mirror a remote wallpaper collection into a local thumbnail cache
#[derive(Parser, Debug)]
#[command(
    name = "wallsync",
    version,
    about = "Sync wallpaper previews from a public share into a local cache",
    long_about = "Mirrors the preview renditions of a remote wallpaper collection into a \
content-addressed local cache. Features concurrent fetching, conditional revalidation, \
and atomic cache writes."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync thumbnail previews into the local cache
    Sync(SyncArgs),

    /// List the assets the remote currently offers
    List(ListArgs),

    /// Show category buckets over the current listing
    Categories(CategoriesArgs),

    /// Download one full-resolution asset
    Fetch(FetchArgs),

    /// Cache inspection
    Cache(CacheArgs),
}

/// Arguments for the sync command
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Number of concurrent thumbnail fetch workers
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Revalidate cached entries with conditional requests
    #[arg(short, long)]
    pub revalidate: bool,

    /// Scrape the wallpaper page instead of the WebDAV listing
    #[arg(long)]
    pub from_page: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Scrape the wallpaper page instead of the WebDAV listing
    #[arg(long)]
    pub from_page: bool,

    /// Show preview and full URLs alongside identifiers
    #[arg(long)]
    pub urls: bool,
}

/// Arguments for the categories command
#[derive(Args, Debug, Clone)]
pub struct CategoriesArgs {
    /// Scrape the wallpaper page instead of the WebDAV listing
    #[arg(long)]
    pub from_page: bool,

    /// Show only bucket names and sizes
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Identifier of the asset to download (as shown by `list`)
    #[arg(value_name = "IDENTIFIER")]
    pub identifier: String,

    /// Output file path (defaults to the identifier's file name)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Download the large preview rendition instead of the original
    #[arg(long)]
    pub preview: bool,
}

/// Arguments for cache inspection
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache inspection actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Info,

    /// Print the cache directory path
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl SyncArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        Ok(())
    }
}
