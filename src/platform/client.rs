//! HTTP client for pages, playlists and segments

use crate::download::retry::{RetryConfig, RetryExecutor};
use crate::error::GrabError;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Browser profiles for realistic header emulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl ClientType {
    /// Default User-Agent for this profile
    pub fn user_agent(&self) -> &'static str {
        match self {
            ClientType::Chrome => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ClientType::Firefox => "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            ClientType::Safari => "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
            ClientType::Edge => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
        }
    }

    fn client_hints(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            ClientType::Chrome => vec![
                ("Sec-Ch-Ua", r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#),
                ("Sec-Ch-Ua-Mobile", "?0"),
                ("Sec-Ch-Ua-Platform", r#""Windows""#),
            ],
            ClientType::Edge => vec![
                ("Sec-Ch-Ua", r#""Not_A Brand";v="8", "Chromium";v="120", "Microsoft Edge";v="120""#),
                ("Sec-Ch-Ua-Mobile", "?0"),
                ("Sec-Ch-Ua-Platform", r#""Windows""#),
            ],
            ClientType::Firefox | ClientType::Safari => Vec::new(),
        }
    }
}

/// HTTP client configuration, scoped to one extraction or download
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retries for page, playlist and segment GETs
    pub max_retries: u32,
    /// User agent override
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Browser profile
    pub client_type: ClientType,
    /// Page the requests originate from (Referer/Origin)
    pub referer: Option<Url>,
    /// Retry backoff settings
    pub retry: RetryConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: None,
            proxy_url: None,
            client_type: ClientType::Chrome,
            referer: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Document kinds, each with its own Accept/Sec-Fetch headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Page,
    Frame,
    Media,
    Ajax,
}

/// HTTP client with a per-operation cookie session
pub struct FetchClient {
    client: Client,
    config: HttpClientConfig,
    retry: RetryExecutor,
}

impl FetchClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, GrabError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, GrabError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| config.client_type.user_agent().to_string());

        let mut builder = ClientBuilder::new()
            .connect_timeout(config.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent);

        if let Some(proxy_url) = &config.proxy_url {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!("Ignoring invalid proxy {}: {}", proxy_url, e),
            }
        }

        let client = builder.build()?;
        let retry = RetryExecutor::with_config(RetryConfig {
            max_retries: config.max_retries,
            ..config.retry.clone()
        });

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a request with browser headers for the given document kind
    pub fn create_request(&self, method: Method, url: &str, kind: RequestKind) -> RequestBuilder {
        let (accept, dest, mode) = match kind {
            RequestKind::Page => (
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
                "document",
                "navigate",
            ),
            RequestKind::Frame => (
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                "iframe",
                "navigate",
            ),
            RequestKind::Media => ("*/*", "empty", "cors"),
            RequestKind::Ajax => ("application/json, text/javascript, */*; q=0.01", "empty", "cors"),
        };

        let mut request = self
            .client
            .request(method, url)
            .header("Accept", accept)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("DNT", "1")
            .header("Sec-Fetch-Dest", dest)
            .header("Sec-Fetch-Mode", mode);

        for (name, value) in self.config.client_type.client_hints() {
            request = request.header(name, value);
        }

        if let Some(referer) = &self.config.referer {
            request = request
                .header("Referer", referer.as_str())
                .header("Origin", referer.origin().ascii_serialization());
        }

        if kind == RequestKind::Ajax {
            request = request.header("X-Requested-With", "XMLHttpRequest");
        }

        request
    }

    /// Fetch a page or playlist body as text, retrying transient failures.
    /// `timeout` bounds the whole exchange, body included.
    pub async fn get_text(&self, url: &str, kind: RequestKind) -> Result<String, GrabError> {
        self.retry
            .execute(url, || async move {
                let request = self
                    .create_request(Method::GET, url, kind)
                    .timeout(self.config.timeout);
                let response = send_checked(request, url).await?;
                Ok(response.text().await.map_err(classify)?)
            })
            .await
    }

    /// Open a streamed GET for binary content. Only the wait for response
    /// headers is bounded here; readers apply `timeout` per chunk.
    /// Single attempt; callers retry the whole transfer.
    pub async fn open_stream(&self, url: &str) -> Result<Response, GrabError> {
        let request = self.create_request(Method::GET, url, RequestKind::Media);
        match tokio::time::timeout(self.config.timeout, send_checked(request, url)).await {
            Ok(result) => result,
            Err(_) => Err(GrabError::Timeout(url.to_string())),
        }
    }

    /// POST a url-encoded form and return the body. Not retried.
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<String, GrabError> {
        debug!("POST {} ({} fields)", url, fields.len());
        let request = self
            .create_request(Method::POST, url, RequestKind::Ajax)
            .timeout(self.config.timeout)
            .form(fields);
        let response = send_checked(request, url).await?;
        Ok(response.text().await.map_err(classify)?)
    }

    /// Retry policy shared with segment downloads
    pub fn retry_executor(&self) -> &RetryExecutor {
        &self.retry
    }
}

async fn send_checked(request: RequestBuilder, url: &str) -> Result<Response, GrabError> {
    debug!("Sending request to {}", url);
    let response = request.send().await.map_err(classify)?;
    check_status(response)
}

fn classify(error: reqwest::Error) -> GrabError {
    if error.is_timeout() {
        let url = error.url().map(|u| u.to_string()).unwrap_or_default();
        GrabError::Timeout(url)
    } else {
        GrabError::Fetch(error)
    }
}

fn check_status(response: Response) -> Result<Response, GrabError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!("HTTP {} for {}", status, response.url());
        Err(GrabError::HttpStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
