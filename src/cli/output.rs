//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::downloader::DownloadOutcome;
use crate::core::media::MediaLocator;
use crate::core::progress::{format_bytes, format_clock, format_duration, Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

/// Output formatter for embedgrab
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    show_progress: bool,
    progress_bar: OnceLock<ProgressBar>,
    tracker: Mutex<Option<Progress>>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_progress: true,
            progress_bar: OnceLock::new(),
            tracker: Mutex::new(None),
        }
    }

    /// Enable or disable the segment progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if self.verbosity == VerbosityLevel::Quiet || !self.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(total as u64);
        progress_bar.set_style(style);
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar
    }

    /// Record `completed` of `total` segments
    pub fn update_segments(&self, completed: usize, total: usize) {
        let progress_bar = self
            .progress_bar
            .get_or_init(|| self.create_progress_bar(total));

        let eta = match self.tracker.lock() {
            Ok(mut tracker) => {
                let progress = tracker.get_or_insert_with(|| Progress::new(total));
                progress.update(completed);
                format!("{:.0}% ETA {}", progress.percent, progress.eta_string())
            }
            Err(_) => String::new(),
        };

        progress_bar.set_length(total as u64);
        progress_bar.set_position(completed as u64);
        progress_bar.set_message(eta);
    }

    /// Finish progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = self.progress_bar.get() {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Stop the progress bar where it is
    pub fn abandon_progress(&self) {
        if let Some(progress_bar) = self.progress_bar.get() {
            progress_bar.abandon();
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("✅ {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("⚠️  {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }

    /// Print download start message
    pub fn print_download_start(&self, url: &str, output_dir: &Path) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("🚀 Starting download...");
        println!("🔗 Page: {}", url);
        println!("📁 Directory: {}", output_dir.display());
        println!();
    }

    /// Print a resolved media locator
    pub fn print_locator(&self, locator: &MediaLocator) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("🎯 Media: {}", locator.url());
        if let Some((width, height)) = locator.resolution() {
            println!("📐 {}x{}", width, height);
        }
        if let Some(duration) = locator.duration() {
            println!("⏱️  {}", format_clock(duration));
        }
    }

    /// Print download complete message
    pub fn print_download_complete(&self, outcome: &DownloadOutcome, elapsed: Duration) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!();
        println!("✅ Download completed!");
        println!("💾 Saved to: {}", outcome.output_path.display());
        if let Some(rendition) = &outcome.rendition {
            println!("📺 Quality: {}", rendition);
        }
        println!(
            "📦 {} segment(s), {}",
            outcome.segments,
            format_bytes(outcome.bytes)
        );
        println!("⏱️  Time: {}", format_duration(elapsed));
    }
}

/// Create a progress callback for the downloader
pub fn create_progress_callback(formatter: Arc<OutputFormatter>) -> ProgressCallback {
    Arc::new(move |completed, total| formatter.update_segments(completed, total))
}
