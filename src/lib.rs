//! # pget
//!
//! Concurrent segmented HTTP downloader. URLs are taken directly or pulled
//! out of an arbitrary text blob; servers that support byte ranges are
//! fetched in parallel segments with resumable partial files, everything
//! else falls back to a single stream. The binary in `main.rs` is a thin
//! CLI over these modules.

pub mod allocator;
pub mod cli;
pub mod commands;
pub mod downloader;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod progress;
pub mod segment;
pub mod utils;

pub use downloader::Downloader;
pub use error::DownloadError;
