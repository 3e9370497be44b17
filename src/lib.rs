//! Wallsync Library
//!
//! A Rust library for mirroring a remote wallpaper collection into a local
//! content-addressed thumbnail cache. Provides concurrent preview fetching
//! with rate limiting, conditional revalidation, and atomic cache writes.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
