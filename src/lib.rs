//! # embedgrab
//!
//! Finds the video embedded in a third-party web page and downloads it.
//!
//! ## Features
//!
//! - Heuristic media URL discovery (markup, script objects, encoded
//!   literals, player frames, server-rendered player endpoints)
//! - Optional script-executing renderer as a last resort
//! - HLS rendition selection by resolution
//! - Sequential segment download with retries and reassembly
//! - Persisted JSON configuration with per-site hints
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedgrab::{Downloader, Quality};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new()
//!         .with_quality(Quality::Height(720))
//!         .with_output_path("./downloads");
//!
//!     let outcome = downloader.download("https://example.com/watch/42").await?;
//!     println!("Downloaded: {}", outcome.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use core::{
    AppConfig, ConfigStore, DownloadOptions, DownloadOutcome, Downloader, MediaKind, MediaLocator,
    Progress, Quality, Rendition, Segment,
};
pub use error::GrabError;
pub use platform::PageRenderer;

/// Result type alias for embedgrab operations
pub type Result<T> = std::result::Result<T, GrabError>;
