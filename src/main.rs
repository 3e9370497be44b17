//! wallsync CLI application
//!
//! Command-line interface for mirroring a remote wallpaper collection into a
//! local thumbnail cache. Features concurrent fetching, conditional
//! revalidation, and atomic cache writes.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use wallsync::cli::{
    handle_cache, handle_categories, handle_fetch, handle_list, handle_sync, Cli, Commands,
};
use wallsync::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(&cli);

    info!("wallsync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync(args) => {
            info!("Executing sync command");
            handle_sync(args, &cli.global).await
        }
        Commands::List(args) => {
            info!("Executing list command");
            handle_list(args, &cli.global).await
        }
        Commands::Categories(args) => {
            info!("Executing categories command");
            handle_categories(args, &cli.global).await
        }
        Commands::Fetch(args) => {
            info!("Executing fetch command");
            handle_fetch(args, &cli.global).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(args, &cli.global).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("wallsync={}", log_level).parse().expect("valid directive"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();
}
