//! Main downloader implementation

use crate::core::config::{hints_for_host, AppConfig, SiteHints};
use crate::core::job::DownloadJob;
use crate::core::media::{MediaKind, MediaLocator, Quality, Segment};
use crate::core::progress::ProgressCallback;
use crate::download::segments::{DownloaderConfig, SegmentDownloader};
use crate::error::GrabError;
use crate::platform::client::{FetchClient, HttpClientConfig};
use crate::platform::playlist::PlaylistReader;
use crate::platform::renderer::{PageRenderer, DEFAULT_CAPTURE_WINDOW};
use crate::platform::resolver::Resolver;
use crate::utils::url::{parse_page_url, video_id_or_fallback};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Main downloader configuration
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Rendition quality
    pub quality: Quality,
    /// Directory receiving the output file and scratch directories
    pub output_dir: PathBuf,
    /// Rate limit in bytes per second
    pub rate_limit_bps: Option<u64>,
    /// HTTP timeout
    pub timeout: Duration,
    /// Maximum retries
    pub max_retries: u32,
    /// User agent override
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// How long the renderer watches network traffic
    pub capture_window: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            quality: Quality::Auto,
            output_dir: PathBuf::from("./downloads"),
            rate_limit_bps: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: None,
            proxy_url: None,
            capture_window: DEFAULT_CAPTURE_WINDOW,
        }
    }
}

impl DownloadOptions {
    /// Options seeded from persisted configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, GrabError> {
        Ok(Self {
            quality: config.quality()?,
            output_dir: config.download_dir.clone(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
            user_agent: config.user_agent.clone(),
            ..Self::default()
        })
    }
}

/// Result of a finished download
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Media the page resolved to
    pub locator: MediaLocator,
    /// Final output file
    pub output_path: PathBuf,
    /// Number of segments joined
    pub segments: usize,
    /// Bytes written to `output_path`
    pub bytes: u64,
    /// Chosen rendition, e.g. "720p"
    pub rendition: Option<String>,
}

/// Main downloader struct
pub struct Downloader {
    options: DownloadOptions,
    site_hints: BTreeMap<String, SiteHints>,
    progress: Option<ProgressCallback>,
    renderer: Option<Arc<dyn PageRenderer>>,
    cancel: CancellationToken,
}

impl Downloader {
    /// Create a new downloader with default options
    pub fn new() -> Self {
        Self::with_options(DownloadOptions::default())
    }

    pub fn with_options(options: DownloadOptions) -> Self {
        Self {
            options,
            site_hints: BTreeMap::new(),
            progress: None,
            renderer: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Downloader using persisted settings and site hints
    pub fn from_config(config: &AppConfig) -> Result<Self, GrabError> {
        let mut downloader = Self::with_options(DownloadOptions::from_config(config)?);
        downloader.site_hints = config.site_hints.clone();
        Ok(downloader)
    }

    /// Set rendition quality
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.options.quality = quality;
        self
    }

    /// Set output directory
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output_dir = path.into();
        self
    }

    /// Set progress callback, called with `(completed, total)` segments
    pub fn with_progress(mut self, callback: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Set rate limit
    pub fn with_rate_limit(mut self, bytes_per_second: u64) -> Self {
        self.options.rate_limit_bps = Some(bytes_per_second);
        self
    }

    /// Set HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.options.proxy_url = Some(proxy_url.into());
        self
    }

    /// Hints used for pages on `host`
    pub fn with_site_hints(mut self, host: impl Into<String>, hints: SiteHints) -> Self {
        self.site_hints.insert(host.into(), hints);
        self
    }

    /// Token that aborts the download between segments
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Script-executing renderer used when static extraction finds nothing
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_capture_window(mut self, window: Duration) -> Self {
        self.options.capture_window = window;
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Resolve the media URL behind `page_url` without downloading
    pub async fn resolve(&self, page_url: &str) -> Result<MediaLocator, GrabError> {
        let page_url = parse_page_url(page_url)?;
        let client = self.client_for(&page_url)?;
        self.resolver(&client, &page_url).resolve(&page_url).await
    }

    /// Resolve `page_url`, download its media and write one output file
    pub async fn download(&self, page_url: &str) -> Result<DownloadOutcome, GrabError> {
        let page_url = parse_page_url(page_url)?;
        let client = self.client_for(&page_url)?;

        let locator = self.resolver(&client, &page_url).resolve(&page_url).await?;
        info!("Media URL: {}", locator);

        let (segments, rendition) = match locator.kind() {
            MediaKind::Playlist => {
                let rendition = PlaylistReader::new(&client)
                    .fetch_rendition(locator.url(), self.options.quality)
                    .await?;
                info!(
                    "Rendition {} with {} segments ({:.0}s)",
                    rendition.quality_label(),
                    rendition.segments.len(),
                    rendition.total_duration()
                );
                let label = rendition.quality_label();
                (rendition.segments, Some(label))
            }
            MediaKind::File => {
                debug!("Direct media file, downloading as a single segment");
                let segment = Segment {
                    index: 0,
                    url: locator.url().clone(),
                    duration: locator.duration().unwrap_or(0.0) as f32,
                };
                let label = locator.resolution().map(|(_, h)| format!("{}p", h));
                (vec![segment], label)
            }
        };

        let video_id = video_id_or_fallback(locator.url());
        let mut job = DownloadJob::new(video_id, self.options.quality, &self.options.output_dir);
        let output_path = job.output_path(locator.kind()).await?;

        let segment_downloader = SegmentDownloader::with_config(
            &client,
            DownloaderConfig {
                rate_limit_bps: self.options.rate_limit_bps,
            },
        )
        .with_cancellation(self.cancel.clone());

        let bytes = job
            .run(&segment_downloader, &segments, &output_path, self.progress.clone())
            .await?;

        Ok(DownloadOutcome {
            locator,
            output_path,
            segments: segments.len(),
            bytes,
            rendition,
        })
    }

    /// Fresh client for one operation, sending the page as Referer
    fn client_for(&self, page_url: &Url) -> Result<FetchClient, GrabError> {
        FetchClient::with_config(HttpClientConfig {
            timeout: self.options.timeout,
            max_retries: self.options.max_retries,
            user_agent: self.options.user_agent.clone(),
            proxy_url: self.options.proxy_url.clone(),
            referer: Some(page_url.clone()),
            ..HttpClientConfig::default()
        })
    }

    fn resolver<'c>(&self, client: &'c FetchClient, page_url: &Url) -> Resolver<'c> {
        let hints = page_url
            .host_str()
            .and_then(|host| hints_for_host(&self.site_hints, host))
            .cloned();
        Resolver::new(client)
            .with_hints(hints)
            .with_renderer(self.renderer.clone())
            .with_capture_window(self.options.capture_window)
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}
