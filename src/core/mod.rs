//! Core functionality for embedgrab

pub mod config;
pub mod downloader;
pub mod job;
pub mod media;
pub mod progress;

pub use config::*;
pub use downloader::*;
pub use job::*;
pub use media::*;
pub use progress::*;
