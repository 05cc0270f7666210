//! URL utilities for page URLs and media locators

use crate::error::GrabError;
use url::Url;

const MEDIA_EXTENSIONS: &[&str] = &[".mp4", ".m3u8"];

/// Parse a page URL given on the command line, requiring http(s)
pub fn parse_page_url(url: &str) -> Result<Url, GrabError> {
    let parsed = Url::parse(url.trim())?;
    if !is_absolute_http(&parsed) {
        return Err(GrabError::InvalidUrl(format!(
            "Expected an http(s) page URL, got {}",
            url
        )));
    }
    Ok(parsed)
}

/// Check that a URL has an http(s) scheme and a host
pub fn is_absolute_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().map_or(false, |h| !h.is_empty())
}

/// Resolve a candidate found in markup against the page it came from
pub fn resolve_candidate(base: &Url, candidate: &str) -> Option<Url> {
    let candidate = candidate.trim().replace("&amp;", "&").replace("\\/", "/");
    if candidate.is_empty() || candidate.starts_with("data:") || candidate.starts_with("blob:") {
        return None;
    }
    base.join(&candidate).ok()
}

/// Check if the URL path ends with a known media extension
pub fn has_media_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Extract a video identifier from a media or page URL.
///
/// Order: `v` query parameter, first path component of 8+ alphanumeric
/// characters, last path component that is not a media file name.
pub fn extract_video_id(url: &Url) -> Result<String, GrabError> {
    if let Some(id) = url
        .query_pairs()
        .find(|(key, value)| key == "v" && !value.is_empty())
        .map(|(_, value)| value.to_string())
    {
        return Ok(id);
    }

    let parts: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if let Some(part) = parts
        .iter()
        .find(|p| p.len() >= 8 && p.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Ok(part.to_string());
    }

    parts
        .iter()
        .rev()
        .find(|p| {
            let lower = p.to_ascii_lowercase();
            !MEDIA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .map(|p| p.to_string())
        .ok_or_else(|| GrabError::InvalidUrl(format!("Could not extract video ID from {}", url)))
}

/// Video identifier with a timestamped fallback when the URL carries none
pub fn video_id_or_fallback(url: &Url) -> String {
    extract_video_id(url).unwrap_or_else(|_| {
        format!(
            "video_{}_{}",
            chrono::Utc::now().timestamp(),
            rand::random::<u16>() % 9000 + 1000
        )
    })
}
