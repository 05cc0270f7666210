//! Media URL resolution for embedding pages
//!
//! Order: static strategies on the page, then on embedded player frames
//! (falling back to each frame's source API), then the server-rendered
//! player fallback, then the page renderer.
//! Only the page fetch itself can fail the resolution; every later stage
//! that errors is logged and skipped.

use crate::core::config::SiteHints;
use crate::core::media::MediaLocator;
use crate::error::GrabError;
use crate::platform::client::{FetchClient, RequestKind};
use crate::platform::renderer::{PageRenderer, DEFAULT_CAPTURE_WINDOW};
use crate::platform::strategies::{
    find_nonce, find_post_id, plausible_literal, player_frames, run_static_strategies,
    select_best_url, PageContext,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Maximum number of player frames fetched per page
pub const MAX_PLAYER_FRAMES: usize = 3;

/// Endpoint used when no site hint names one
pub const DEFAULT_AJAX_PATH: &str = "/wp-admin/admin-ajax.php";

/// Source API path on a player frame's origin
pub const FRAME_SOURCE_API: &str = "/api/source";

/// Actions tried against the server-rendered player endpoint, in order
pub const AJAX_ACTIONS: &[&str] = &["get_player", "load_player", "get_video"];

/// Locates the media URL behind an embedding page
pub struct Resolver<'a> {
    client: &'a FetchClient,
    hints: Option<SiteHints>,
    renderer: Option<Arc<dyn PageRenderer>>,
    capture_window: Duration,
}

impl<'a> Resolver<'a> {
    pub fn new(client: &'a FetchClient) -> Self {
        Self {
            client,
            hints: None,
            renderer: None,
            capture_window: DEFAULT_CAPTURE_WINDOW,
        }
    }

    /// Site-specific patterns for the page's host
    pub fn with_hints(mut self, hints: Option<SiteHints>) -> Self {
        self.hints = hints;
        self
    }

    /// Renderer used as the last resort
    pub fn with_renderer(mut self, renderer: Option<Arc<dyn PageRenderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_capture_window(mut self, window: Duration) -> Self {
        self.capture_window = window;
        self
    }

    /// Find the media URL for `page_url`
    pub async fn resolve(&self, page_url: &Url) -> Result<MediaLocator, GrabError> {
        info!("Resolving media on {}", page_url);
        let html = self.client.get_text(page_url.as_str(), RequestKind::Page).await?;

        if let Some(locator) = self.scan(&html, page_url) {
            return Ok(locator);
        }
        if let Some(locator) = self.scan_player_frames(&html, page_url).await {
            return Ok(locator);
        }
        if let Some(locator) = self.server_rendered_player(&html, page_url).await {
            return Ok(locator);
        }
        if let Some(locator) = self.render(page_url).await {
            return Ok(locator);
        }

        Err(GrabError::NotFound(page_url.to_string()))
    }

    fn scan(&self, text: &str, base_url: &Url) -> Option<MediaLocator> {
        let (strategy, locator) = run_static_strategies(&PageContext::new(text, base_url))?;
        info!("Found {} via {} scan of {}", locator, strategy, base_url);
        Some(locator)
    }

    async fn scan_player_frames(&self, html: &str, page_url: &Url) -> Option<MediaLocator> {
        let player_hosts = self
            .hints
            .as_ref()
            .map(|h| h.player_hosts.clone())
            .unwrap_or_default();
        let frames = player_frames(&PageContext::new(html, page_url), &player_hosts);
        if frames.is_empty() {
            debug!("No player frames on {}", page_url);
            return None;
        }

        for frame in frames.iter().take(MAX_PLAYER_FRAMES) {
            debug!("Fetching player frame {}", frame);
            match self.client.get_text(frame.as_str(), RequestKind::Frame).await {
                Ok(text) => {
                    if let Some(locator) = self.scan(&text, frame) {
                        return Some(locator);
                    }
                }
                Err(e) => debug!("Player frame {} failed: {}", frame, e),
            }
            if let Some(locator) = self.frame_source_api(frame).await {
                return Some(locator);
            }
        }
        None
    }

    /// Ask the frame's origin for its sources: POST `d=<host[:port]>` to
    /// [`FRAME_SOURCE_API`], answered with `{success, data: [{file}]}`
    async fn frame_source_api(&self, frame: &Url) -> Option<MediaLocator> {
        let host = frame.host_str()?;
        let netloc = match frame.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let endpoint = frame.join(FRAME_SOURCE_API).ok()?;

        match self.client.post_form(endpoint.as_str(), &[("d", netloc.as_str())]).await {
            Ok(body) => {
                let locator = locator_from_source_list(&body);
                match &locator {
                    Some(locator) => info!("Found {} via source API of {}", locator, frame),
                    None => debug!("Source API of {} listed no media", frame),
                }
                locator
            }
            Err(e) => {
                debug!("Source API of {} failed: {}", frame, e);
                None
            }
        }
    }

    async fn server_rendered_player(&self, html: &str, page_url: &Url) -> Option<MediaLocator> {
        let hints = self.hints.as_ref();
        let Some(post_id) = find_post_id(html, hints) else {
            debug!("No post id on {}, skipping player endpoint", page_url);
            return None;
        };
        let nonce = find_nonce(html, hints);
        let endpoint = match page_url.join(
            hints
                .and_then(|h| h.ajax_url.as_deref())
                .unwrap_or(DEFAULT_AJAX_PATH),
        ) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                debug!("Bad player endpoint for {}: {}", page_url, e);
                return None;
            }
        };

        for action in AJAX_ACTIONS {
            let fields = [("action", *action), ("post_id", post_id.as_str()), ("nonce", nonce.as_str())];
            match self.client.post_form(endpoint.as_str(), &fields).await {
                Ok(body) => {
                    if let Some(locator) = locator_from_player_response(&body, page_url) {
                        info!("Found {} via player endpoint action {}", locator, action);
                        return Some(locator);
                    }
                    debug!("Action {} returned no media", action);
                }
                Err(e) => debug!("Action {} failed: {}", action, e),
            }
        }
        None
    }

    async fn render(&self, page_url: &Url) -> Option<MediaLocator> {
        let renderer = self.renderer.as_ref()?;
        info!("Falling back to page renderer for {}", page_url);

        if let Err(e) = renderer.navigate(page_url).await {
            debug!("Renderer navigation failed: {}", e);
            return None;
        }

        match renderer.observe_network_traffic(self.capture_window).await {
            Ok(traffic) => {
                let candidates: Vec<Url> = traffic.iter().filter_map(|u| plausible_literal(u)).collect();
                debug!("{} of {} captured requests are media", candidates.len(), traffic.len());
                if let Some(best) = select_best_url(&candidates) {
                    info!("Found {} in captured traffic", best);
                    return Some(MediaLocator::new(best.clone()));
                }
            }
            Err(e) => debug!("Traffic capture failed: {}", e),
        }

        match renderer.page_source().await {
            Ok(source) => self.scan(&source, page_url),
            Err(e) => {
                debug!("Rendered source unavailable: {}", e);
                None
            }
        }
    }
}

/// Extract a locator from a `{success, data: {html}}` player response
fn locator_from_player_response(body: &str, base_url: &Url) -> Option<MediaLocator> {
    let value: Value = serde_json::from_str(body).ok()?;
    if !value.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let data = value.get("data")?;
    let html = data
        .get("html")
        .and_then(Value::as_str)
        .or_else(|| data.as_str())?;
    run_static_strategies(&PageContext::new(html, base_url)).map(|(_, locator)| locator)
}

/// First plausible `file` in a `{success, data: [{file, label}]}` response
fn locator_from_source_list(body: &str) -> Option<MediaLocator> {
    let value: Value = serde_json::from_str(body).ok()?;
    if !value.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    value
        .get("data")?
        .as_array()?
        .iter()
        .filter_map(|source| source.get("file").and_then(Value::as_str))
        .find_map(plausible_literal)
        .map(MediaLocator::new)
}
