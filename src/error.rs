//! Error types for embedgrab

use thiserror::Error;

/// Main error type for embedgrab operations
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("Request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("No media URL found on {0}")]
    NotFound(String),

    #[error("Playlist parse error: {0}")]
    Parse(String),

    #[error("Playlist has no renditions")]
    NoRendition,

    #[error("Download aborted at segment {index}: {source}")]
    PartialDownload {
        index: usize,
        #[source]
        source: Box<GrabError>,
    },

    #[error("Download cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid quality: {0}")]
    InvalidQuality(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Page renderer error: {0}")]
    Renderer(String),
}

impl GrabError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            GrabError::Fetch(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            GrabError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            GrabError::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_retryable() {
        let server_error = GrabError::HttpStatus {
            url: "https://example.com/a.ts".to_string(),
            status: 503,
        };
        assert!(server_error.is_retryable());

        let not_found = GrabError::HttpStatus {
            url: "https://example.com/a.ts".to_string(),
            status: 404,
        };
        assert!(!not_found.is_retryable());

        let throttled = GrabError::HttpStatus {
            url: "https://example.com/a.ts".to_string(),
            status: 429,
        };
        assert!(throttled.is_retryable());
    }

    #[test]
    fn test_parse_errors_not_retryable() {
        assert!(!GrabError::Parse("bad".to_string()).is_retryable());
        assert!(!GrabError::NotFound("https://example.com".to_string()).is_retryable());
        assert!(!GrabError::NoRendition.is_retryable());
        assert!(!GrabError::Cancelled.is_retryable());
        assert!(!GrabError::Renderer("gone".to_string()).is_retryable());
    }

    #[test]
    fn test_partial_download_reports_index() {
        let error = GrabError::PartialDownload {
            index: 4,
            source: Box::new(GrabError::Timeout("segment 4".to_string())),
        };
        assert!(!error.is_retryable());
        assert!(error.to_string().starts_with("Download aborted at segment 4"));
    }
}
