//! Media locators, renditions and quality selection

use crate::error::GrabError;
use std::fmt;
use url::Url;

/// What a locator points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// HLS playlist (master or media)
    Playlist,
    /// Directly fetchable file (MP4)
    File,
}

impl MediaKind {
    /// Output file extension for this kind of media
    pub fn output_extension(&self) -> &'static str {
        match self {
            MediaKind::Playlist => "ts",
            MediaKind::File => "mp4",
        }
    }
}

/// A resolved, directly fetchable media resource
#[derive(Debug, Clone, PartialEq)]
pub struct MediaLocator {
    url: Url,
    resolution: Option<(u32, u32)>,
    duration: Option<f64>,
}

impl MediaLocator {
    /// Create a locator without metadata
    pub fn new(url: Url) -> Self {
        Self {
            url,
            resolution: None,
            duration: None,
        }
    }

    /// Attach a declared resolution (width, height)
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    /// Attach a declared duration in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Playlist for `.m3u8` paths, plain file otherwise
    pub fn kind(&self) -> MediaKind {
        if self.url.path().to_ascii_lowercase().ends_with(".m3u8") {
            MediaKind::Playlist
        } else {
            MediaKind::File
        }
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)?;
        if let Some((width, height)) = self.resolution {
            write!(f, " ({}x{})", width, height)?;
        }
        Ok(())
    }
}

/// One fragment of a rendition
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 0-based position in the rendition
    pub index: usize,
    /// Absolute fragment URL
    pub url: Url,
    /// Declared duration in seconds
    pub duration: f32,
}

/// One quality variant with its ordered segments
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    /// URL of the media playlist the segments came from
    pub playlist_url: Url,
    /// Declared resolution (width, height)
    pub resolution: Option<(u32, u32)>,
    /// Declared bandwidth in bits per second
    pub bandwidth: u64,
    /// Segments in playlist order
    pub segments: Vec<Segment>,
}

impl Rendition {
    /// Total declared duration in seconds
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| f64::from(s.duration)).sum()
    }

    /// Human-readable quality label
    pub fn quality_label(&self) -> String {
        match self.resolution {
            Some((_, height)) => format!("{}p", height),
            None => "unknown".to_string(),
        }
    }
}

/// Requested rendition quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Highest declared horizontal resolution
    Auto,
    /// Closest declared vertical resolution
    Height(u32),
}

impl Quality {
    /// Parse quality from string ("auto", "720p", "720")
    pub fn parse(s: &str) -> Result<Self, GrabError> {
        let s = s.trim().to_lowercase();
        if s == "auto" || s == "best" {
            return Ok(Quality::Auto);
        }

        s.trim_end_matches('p')
            .parse::<u32>()
            .ok()
            .filter(|height| *height > 0)
            .map(Quality::Height)
            .ok_or(GrabError::InvalidQuality(s))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Auto
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Auto => write!(f, "auto"),
            Quality::Height(height) => write!(f, "{}p", height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parsing() {
        assert_eq!(Quality::parse("auto").unwrap(), Quality::Auto);
        assert_eq!(Quality::parse("AUTO").unwrap(), Quality::Auto);
        assert_eq!(Quality::parse("720p").unwrap(), Quality::Height(720));
        assert_eq!(Quality::parse("1080").unwrap(), Quality::Height(1080));
        assert_eq!(Quality::parse(" 360P ").unwrap(), Quality::Height(360));
        assert!(Quality::parse("0p").is_err());
        assert!(Quality::parse("hd").is_err());
        assert!(Quality::parse("").is_err());
    }

    #[test]
    fn test_quality_display() {
        assert_eq!(Quality::Auto.to_string(), "auto");
        assert_eq!(Quality::Height(480).to_string(), "480p");
    }

    #[test]
    fn test_locator_kind() {
        let hls = MediaLocator::new(Url::parse("https://cdn.example.com/v/master.M3U8?t=1").unwrap());
        assert_eq!(hls.kind(), MediaKind::Playlist);
        assert_eq!(hls.kind().output_extension(), "ts");

        let file = MediaLocator::new(Url::parse("https://cdn.example.com/v/clip.mp4").unwrap())
            .with_resolution(1280, 720)
            .with_duration(12.5);
        assert_eq!(file.kind(), MediaKind::File);
        assert_eq!(file.resolution(), Some((1280, 720)));
        assert_eq!(file.duration(), Some(12.5));
        assert_eq!(file.to_string(), "https://cdn.example.com/v/clip.mp4 (1280x720)");
    }

    #[test]
    fn test_rendition_helpers() {
        let base = Url::parse("https://cdn.example.com/720/index.m3u8").unwrap();
        let rendition = Rendition {
            playlist_url: base.clone(),
            resolution: Some((1280, 720)),
            bandwidth: 2_000_000,
            segments: vec![
                Segment { index: 0, url: base.join("a.ts").unwrap(), duration: 4.0 },
                Segment { index: 1, url: base.join("b.ts").unwrap(), duration: 2.5 },
            ],
        };
        assert_eq!(rendition.total_duration(), 6.5);
        assert_eq!(rendition.quality_label(), "720p");
    }
}
