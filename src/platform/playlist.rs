//! HLS playlist reading and rendition selection

use crate::core::media::{Quality, Rendition, Segment};
use crate::error::GrabError;
use crate::platform::client::{FetchClient, RequestKind};
use m3u8_rs::{KeyMethod, MediaPlaylist, Playlist, VariantStream};
use std::cmp::Reverse;
use tracing::{debug, info, warn};
use url::Url;

/// Reads a master playlist and resolves one rendition into segments
pub struct PlaylistReader<'a> {
    client: &'a FetchClient,
}

impl<'a> PlaylistReader<'a> {
    pub fn new(client: &'a FetchClient) -> Self {
        Self { client }
    }

    /// Fetch the playlist at `url` and select a rendition from it
    pub async fn fetch_rendition(&self, url: &Url, quality: Quality) -> Result<Rendition, GrabError> {
        let text = self.client.get_text(url.as_str(), RequestKind::Media).await?;
        self.select_rendition(url, &text, quality).await
    }

    /// Choose a rendition from `master_text` and load its segment list.
    ///
    /// A media playlist given in place of a master is used directly.
    pub async fn select_rendition(
        &self,
        master_url: &Url,
        master_text: &str,
        quality: Quality,
    ) -> Result<Rendition, GrabError> {
        match parse(master_text)? {
            Playlist::MediaPlaylist(media) => {
                debug!("{} is a media playlist, using it directly", master_url);
                Ok(Rendition {
                    playlist_url: master_url.clone(),
                    resolution: None,
                    bandwidth: 0,
                    segments: segments_from(&media, master_url)?,
                })
            }
            Playlist::MasterPlaylist(master) => {
                let variants: Vec<&VariantStream> =
                    master.variants.iter().filter(|v| !v.is_i_frame).collect();
                let variant = select_variant(&variants, quality).ok_or(GrabError::NoRendition)?;

                let playlist_url = master_url.join(&variant.uri)?;
                let resolution = variant
                    .resolution
                    .map(|r| (r.width as u32, r.height as u32));
                info!(
                    "Selected rendition {} ({} bps) out of {}",
                    resolution
                        .map(|(w, h)| format!("{}x{}", w, h))
                        .unwrap_or_else(|| "unknown".to_string()),
                    variant.bandwidth,
                    variants.len()
                );

                let media_text = self
                    .client
                    .get_text(playlist_url.as_str(), RequestKind::Media)
                    .await?;
                let segments = parse_segments(&media_text, &playlist_url)?;

                Ok(Rendition {
                    playlist_url,
                    resolution,
                    bandwidth: variant.bandwidth,
                    segments,
                })
            }
        }
    }
}

fn parse(text: &str) -> Result<Playlist, GrabError> {
    if !text.trim_start_matches('\u{feff}').trim_start().starts_with("#EXTM3U") {
        return Err(GrabError::Parse("missing #EXTM3U header".to_string()));
    }
    m3u8_rs::parse_playlist_res(text.as_bytes())
        .map_err(|e| GrabError::Parse(format!("{:?}", e)))
}

/// Pick a variant: widest for `Auto` (first wins on ties, missing width
/// counts as 0), nearest height otherwise (missing height never wins
/// against a declared one).
pub fn select_variant<'v>(
    variants: &[&'v VariantStream],
    quality: Quality,
) -> Option<&'v VariantStream> {
    match quality {
        Quality::Auto => variants
            .iter()
            .copied()
            .min_by_key(|v| Reverse(v.resolution.map(|r| r.width).unwrap_or(0))),
        Quality::Height(target) => variants.iter().copied().min_by_key(|v| {
            v.resolution
                .map(|r| r.height.abs_diff(u64::from(target)))
                .unwrap_or(u64::MAX)
        }),
    }
}

/// Parse a media playlist into absolute segment URLs in playlist order
pub fn parse_segments(text: &str, playlist_url: &Url) -> Result<Vec<Segment>, GrabError> {
    match parse(text)? {
        Playlist::MediaPlaylist(media) => segments_from(&media, playlist_url),
        Playlist::MasterPlaylist(_) => Err(GrabError::Parse(format!(
            "expected a media playlist at {}",
            playlist_url
        ))),
    }
}

fn segments_from(media: &MediaPlaylist, playlist_url: &Url) -> Result<Vec<Segment>, GrabError> {
    if media
        .segments
        .iter()
        .filter_map(|s| s.key.as_ref())
        .any(|key| key.method != KeyMethod::None)
    {
        warn!("Playlist {} declares encryption; segments are saved as-is", playlist_url);
    }

    let segments = media
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            Ok(Segment {
                index,
                url: playlist_url.join(&segment.uri)?,
                duration: segment.duration,
            })
        })
        .collect::<Result<Vec<_>, GrabError>>()?;

    if segments.is_empty() {
        return Err(GrabError::NoRendition);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::client::HttpClientConfig;
    use std::time::Duration;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
720/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080/index.m3u8
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=90000,RESOLUTION=3840x2160,URI=\"iframes.m3u8\"
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXTINF:10.0,
seg0.ts
#EXTINF:10.0,
https://other.example/seg1.ts
#EXTINF:4.5,
seg2.ts
#EXT-X-ENDLIST
";

    fn master_variants(text: &str) -> Vec<VariantStream> {
        match m3u8_rs::parse_playlist_res(text.as_bytes()).unwrap() {
            Playlist::MasterPlaylist(m) => m.variants.into_iter().filter(|v| !v.is_i_frame).collect(),
            _ => panic!("expected master"),
        }
    }

    fn height_of(v: Option<&VariantStream>) -> Option<u64> {
        v.and_then(|v| v.resolution).map(|r| r.height)
    }

    #[test]
    fn test_auto_picks_widest_ignoring_iframes() {
        let variants = master_variants(MASTER);
        let refs: Vec<&VariantStream> = variants.iter().collect();
        assert_eq!(refs.len(), 3);
        assert_eq!(height_of(select_variant(&refs, Quality::Auto)), Some(1080));
    }

    #[test]
    fn test_height_picks_nearest() {
        let variants = master_variants(MASTER);
        let refs: Vec<&VariantStream> = variants.iter().collect();
        assert_eq!(height_of(select_variant(&refs, Quality::Height(720))), Some(720));
        assert_eq!(height_of(select_variant(&refs, Quality::Height(600))), Some(720));
        assert_eq!(height_of(select_variant(&refs, Quality::Height(100))), Some(360));
        assert_eq!(height_of(select_variant(&refs, Quality::Height(4000))), Some(1080));
    }

    #[test]
    fn test_auto_tie_keeps_first_listed() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720
first.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=3500000,RESOLUTION=1280x720
second.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
small.m3u8
";
        let variants = master_variants(text);
        let refs: Vec<&VariantStream> = variants.iter().collect();
        assert_eq!(select_variant(&refs, Quality::Auto).unwrap().uri, "first.m3u8");
    }

    #[test]
    fn test_height_tie_keeps_first_listed() {
        let variants = master_variants(MASTER);
        let refs: Vec<&VariantStream> = variants.iter().collect();
        assert_eq!(height_of(select_variant(&refs, Quality::Height(540))), Some(360));

        let reversed: Vec<&VariantStream> = variants.iter().rev().collect();
        assert_eq!(height_of(select_variant(&reversed, Quality::Height(540))), Some(720));
    }

    #[test]
    fn test_missing_resolution() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=100
a.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=200,RESOLUTION=426x240
b.m3u8
";
        let variants = master_variants(text);
        let refs: Vec<&VariantStream> = variants.iter().collect();
        assert_eq!(select_variant(&refs, Quality::Auto).unwrap().uri, "b.m3u8");
        assert_eq!(select_variant(&refs, Quality::Height(2160)).unwrap().uri, "b.m3u8");

        let only_unknown = &refs[..1];
        assert_eq!(select_variant(only_unknown, Quality::Auto).unwrap().uri, "a.m3u8");
        assert!(select_variant(&[], Quality::Auto).is_none());
    }

    #[test]
    fn test_parse_segments_resolves_relative_uris() {
        let base = Url::parse("https://cdn.example/hls/720/index.m3u8?token=x").unwrap();
        let segments = parse_segments(MEDIA, &base).unwrap();
        let urls: Vec<&str> = segments.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/hls/720/seg0.ts",
                "https://other.example/seg1.ts",
                "https://cdn.example/hls/720/seg2.ts",
            ]
        );
        assert_eq!(segments[2].index, 2);
        assert_eq!(segments[2].duration, 4.5);
    }

    #[test]
    fn test_parse_errors() {
        let base = Url::parse("https://cdn.example/index.m3u8").unwrap();
        assert!(matches!(parse_segments("<html>nope</html>", &base), Err(GrabError::Parse(_))));
        assert!(matches!(parse_segments(MASTER, &base), Err(GrabError::Parse(_))));
        assert!(matches!(
            parse_segments("#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXT-X-ENDLIST\n", &base),
            Err(GrabError::NoRendition)
        ));
    }

    fn test_client() -> FetchClient {
        FetchClient::with_config(HttpClientConfig {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            ..HttpClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_select_rendition_fetches_variant() {
        let mut server = mockito::Server::new_async().await;
        let media = server
            .mock("GET", "/hls/720/index.m3u8")
            .with_status(200)
            .with_body(MEDIA)
            .create_async()
            .await;

        let client = test_client();
        let reader = PlaylistReader::new(&client);
        let master_url = Url::parse(&format!("{}/hls/master.m3u8", server.url())).unwrap();
        let rendition = reader
            .select_rendition(&master_url, MASTER, Quality::Height(720))
            .await
            .unwrap();

        media.assert_async().await;
        assert_eq!(rendition.resolution, Some((1280, 720)));
        assert_eq!(rendition.bandwidth, 2_800_000);
        assert_eq!(rendition.segments.len(), 3);
        assert_eq!(
            rendition.segments[0].url.as_str(),
            format!("{}/hls/720/seg0.ts", server.url())
        );
    }

    #[tokio::test]
    async fn test_select_rendition_media_playlist_directly() {
        let client = test_client();
        let reader = PlaylistReader::new(&client);
        let url = Url::parse("https://cdn.example/v/index.m3u8").unwrap();
        let rendition = reader.select_rendition(&url, MEDIA, Quality::Auto).await.unwrap();
        assert_eq!(rendition.playlist_url, url);
        assert_eq!(rendition.segments.len(), 3);
    }

    #[tokio::test]
    async fn test_select_rendition_only_iframes() {
        let text = "#EXTM3U
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=90000,RESOLUTION=640x360,URI=\"iframes.m3u8\"
";
        let client = test_client();
        let reader = PlaylistReader::new(&client);
        let url = Url::parse("https://cdn.example/v/master.m3u8").unwrap();
        assert!(matches!(
            reader.select_rendition(&url, text, Quality::Auto).await,
            Err(GrabError::NoRendition)
        ));
    }
}
