//! Command-line interface components
//!
//! This module contains CLI-specific code for wallsync, including argument
//! parsing, progress display, and command handlers.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    CacheAction, CacheArgs, CategoriesArgs, Cli, Commands, FetchArgs, GlobalArgs, ListArgs,
    SyncArgs,
};
pub use commands::{handle_cache, handle_categories, handle_fetch, handle_list, handle_sync};
pub use progress::{ProgressConfig, ProgressDisplay};
