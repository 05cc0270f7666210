//! Sequential segment fetching and concatenation

use crate::core::media::Segment;
use crate::error::GrabError;
use crate::download::scratch::ScratchDir;
use crate::platform::client::FetchClient;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Segment downloader configuration
#[derive(Debug, Clone, Default)]
pub struct DownloaderConfig {
    /// Rate limit in bytes per second
    pub rate_limit_bps: Option<u64>,
}

/// Rate limiter for controlling download speed
#[derive(Debug)]
struct RateLimiter {
    bytes_per_second: u64,
    started: Instant,
    bytes_sent: u64,
}

impl RateLimiter {
    fn new(bytes_per_second: u64) -> Self {
        Self {
            bytes_per_second: bytes_per_second.max(1),
            started: Instant::now(),
            bytes_sent: 0,
        }
    }

    /// Sleep until `bytes` more fit under the average rate since start
    async fn wait_if_needed(&mut self, bytes: u64) {
        self.bytes_sent += bytes;
        let due = Duration::from_secs_f64(self.bytes_sent as f64 / self.bytes_per_second as f64);
        let elapsed = self.started.elapsed();
        if due > elapsed {
            let wait_time = due - elapsed;
            if wait_time > Duration::from_millis(1) {
                tokio::time::sleep(wait_time).await;
            }
        }
    }
}

/// Downloads a rendition's segments one at a time into a scratch directory
pub struct SegmentDownloader<'a> {
    client: &'a FetchClient,
    config: DownloaderConfig,
    rate_limiter: Option<Mutex<RateLimiter>>,
    cancel: CancellationToken,
}

impl<'a> SegmentDownloader<'a> {
    pub fn new(client: &'a FetchClient) -> Self {
        Self::with_config(client, DownloaderConfig::default())
    }

    pub fn with_config(client: &'a FetchClient, config: DownloaderConfig) -> Self {
        let rate_limiter = config.rate_limit_bps.map(|bps| Mutex::new(RateLimiter::new(bps)));
        Self {
            client,
            config,
            rate_limiter,
            cancel: CancellationToken::new(),
        }
    }

    /// Set rate limit
    pub fn with_rate_limit(mut self, bytes_per_second: u64) -> Self {
        self.config.rate_limit_bps = Some(bytes_per_second);
        self.rate_limiter = Some(Mutex::new(RateLimiter::new(bytes_per_second)));
        self
    }

    /// Token checked before and during each segment
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every segment in index order into `scratch`.
    ///
    /// `on_progress(completed, total)` runs after each segment. On failure
    /// all files written so far are removed and the failing index is reported.
    pub async fn fetch_all<F>(
        &self,
        segments: &[Segment],
        scratch: &mut ScratchDir,
        on_progress: F,
    ) -> Result<Vec<PathBuf>, GrabError>
    where
        F: Fn(usize, usize),
    {
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.index);
        let total = ordered.len();

        info!("Downloading {} segments", total);

        let mut written: Vec<PathBuf> = Vec::with_capacity(total);
        for (done, segment) in ordered.into_iter().enumerate() {
            let path = scratch.segment_path(segment.index);

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(GrabError::Cancelled),
                result = async {
                    scratch.ensure().await?;
                    self.fetch_segment(segment, &path).await
                } => result,
            };

            match result {
                Ok(bytes) => {
                    debug!("Segment {} done ({} bytes)", segment.index, bytes);
                    written.push(path);
                    on_progress(done + 1, total);
                }
                Err(e) => {
                    written.push(path);
                    scratch.remove_files(&written).await;
                    if matches!(e, GrabError::Cancelled) {
                        warn!("Cancelled at segment {}/{}", done + 1, total);
                        return Err(e);
                    }
                    warn!("Segment {} failed: {}", segment.index, e);
                    return Err(GrabError::PartialDownload {
                        index: segment.index,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(written)
    }

    async fn fetch_segment(&self, segment: &Segment, path: &Path) -> Result<u64, GrabError> {
        let what = format!("segment {}", segment.index);
        self.client
            .retry_executor()
            .execute(&what, || self.stream_to_file(segment.url.as_str(), path))
            .await
    }

    /// Stream one response body to `path`, truncating any earlier attempt.
    /// The client timeout applies to each wait for a chunk, not the transfer.
    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, GrabError> {
        let idle_timeout = self.client.config().timeout;
        let response = self.client.open_stream(url).await?;
        let mut file = File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        loop {
            let chunk = match tokio::time::timeout(idle_timeout, stream.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => break,
                Err(_) => {
                    debug!("No data from {} for {:?}", url, idle_timeout);
                    return Err(GrabError::Timeout(url.to_string()));
                }
            };
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(rate_limiter) = &self.rate_limiter {
                let mut limiter = rate_limiter.lock().await;
                limiter.wait_if_needed(chunk.len() as u64).await;
            }
        }

        file.flush().await?;
        Ok(downloaded)
    }
}

/// Append `paths` in order into `output`. The result is written to a
/// `.part` sibling first and renamed, so `output` never holds a partial file.
pub async fn concatenate(paths: &[PathBuf], output: &Path) -> Result<u64, GrabError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part_path = part_path(output);

    match append_all(paths, &part_path).await {
        Ok(total) => {
            tokio::fs::rename(&part_path, output).await?;
            info!("Wrote {} bytes to {}", total, output.display());
            Ok(total)
        }
        Err(e) => {
            warn!("Concatenation failed: {}, cleaning up", e);
            let _ = tokio::fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}

async fn append_all(paths: &[PathBuf], target: &Path) -> Result<u64, GrabError> {
    let mut out = File::create(target).await?;
    let mut total = 0u64;
    let mut buffer = vec![0u8; 64 * 1024];

    for path in paths {
        let mut input = File::open(path).await?;
        loop {
            let read = input.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            out.write_all(&buffer[..read]).await?;
            total += read as u64;
        }
    }

    out.flush().await?;
    out.sync_all().await?;
    Ok(total)
}

fn part_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
