//! Command line argument parsing

use crate::core::config::DEFAULT_CONFIG_FILE;
use crate::core::media::Quality;
use crate::error::GrabError;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default directory for log files
pub const DEFAULT_LOG_DIR: &str = "logs";

/// embedgrab - find and download the video embedded in a web page
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Page embedding the video
    pub url: String,

    /// Rendition quality ('auto', '720p', '480')
    #[arg(long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Download directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<humantime::Duration>,

    /// HTTP retries for transient errors
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Download rate limit (e.g., 2MiB/s, 500KiB/s)
    #[arg(long, value_name = "RATE", value_parser = rate_limit_arg)]
    pub rate_limit: Option<u64>,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Print the resolved media URL and exit (no download)
    #[arg(short = 'g', long)]
    pub print_url: bool,

    /// Store --quality, --output, --timeout, --retries and --user-agent in the config file
    #[arg(long)]
    pub save: bool,

    /// Directory for per-run log files
    #[arg(long, value_name = "DIR", default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Into::into)
    }

    /// Parsed `--quality`, if given
    pub fn quality(&self) -> Result<Option<Quality>, GrabError> {
        self.quality.as_deref().map(Quality::parse).transpose()
    }

    /// Log directory, unless file logging is off
    pub fn log_dir(&self) -> Option<&Path> {
        (!self.no_log_file).then_some(self.log_dir.as_path())
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

fn rate_limit_arg(rate: &str) -> Result<u64, String> {
    parse_rate_limit(rate).ok_or_else(|| format!("invalid rate '{}', expected e.g. 500KiB/s", rate))
}

/// Parse rate limit string to bytes per second
pub fn parse_rate_limit(rate: &str) -> Option<u64> {
    let rate = rate.trim().to_uppercase();
    if rate.is_empty() {
        return None;
    }

    let rate = rate.trim_end_matches("/S");

    let number_end = rate
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i + 1)?;

    let number: f64 = rate[..number_end].parse().ok()?;
    if number <= 0.0 {
        return None;
    }

    let multiplier: u64 = match rate[number_end..].trim() {
        "B" | "" => 1,
        "KB" => 1000,
        "KIB" => 1024,
        "MB" => 1000 * 1000,
        "MIB" => 1024 * 1024,
        "GB" => 1000 * 1000 * 1000,
        "GIB" => 1024 * 1024 * 1024,
        _ => return None,
    };

    Some((number * multiplier as f64) as u64)
}

impl Default for Args {
    fn default() -> Self {
        Self {
            url: String::new(),
            quality: None,
            output: None,
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            timeout: None,
            retries: None,
            rate_limit: None,
            user_agent: None,
            proxy: None,
            print_url: false,
            save: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            no_log_file: false,
            no_progress: false,
            verbose: false,
            quiet: false,
        }
    }
}
