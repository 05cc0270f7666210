//! Page scanning strategies for media URL discovery
//!
//! Every strategy is a pure function over the page text. A strategy either
//! yields a plausible [`MediaLocator`] or nothing; parse and decode failures
//! inside a strategy count as "no match".

use crate::core::config::SiteHints;
use crate::core::media::MediaLocator;
use crate::utils::url::{has_media_extension, is_absolute_http, resolve_candidate};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};
use base64::Engine as _;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::cmp::Reverse;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// URL fragments that mark scripts and static assets rather than media
const DENYLIST: &[&str] = &[
    "jwplayer.js",
    "player.js",
    ".min.js",
    "/assets/",
    "/static/",
    "/lib/",
    "/cdn-cgi/",
    "/wp-content/plugins/",
    "/wp-includes/",
];

/// Object keys that may hold a media URL
const URL_KEYS: &[&str] = &["file", "src", "url", "videoUrl", "source"];

/// Markup attributes that may hold a media URL
const URL_ATTRS: &[&str] = &["src", "data-src", "data-url", "data-file", "data-source"];

/// Text of one page plus the URL it was fetched from
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub text: &'a str,
    pub base_url: &'a Url,
}

impl<'a> PageContext<'a> {
    pub fn new(text: &'a str, base_url: &'a Url) -> Self {
        Self { text, base_url }
    }
}

/// A pure page scanning strategy
pub type Strategy = fn(&PageContext<'_>) -> Option<MediaLocator>;

/// Static strategies in priority order
pub const STATIC_STRATEGIES: &[(&str, Strategy)] = &[
    ("markup", scan_markup),
    ("script-objects", scan_script_objects),
    ("encoded", scan_encoded),
];

/// Fold over [`STATIC_STRATEGIES`], stopping at the first hit
pub fn run_static_strategies(ctx: &PageContext<'_>) -> Option<(&'static str, MediaLocator)> {
    STATIC_STRATEGIES.iter().find_map(|(name, strategy)| {
        let found = strategy(ctx);
        if found.is_none() {
            debug!("Strategy '{}' found nothing on {}", name, ctx.base_url);
        }
        found.map(|locator| (*name, locator))
    })
}

/// Plausibility filter: absolute http(s), media extension, no asset path
pub fn is_plausible_media_url(url: &Url) -> bool {
    if !is_absolute_http(url) || !has_media_extension(url) {
        return false;
    }
    let lower = url.as_str().to_ascii_lowercase();
    !DENYLIST.iter().any(|fragment| lower.contains(fragment))
}

/// Parse a string literal found in script text as a plausible absolute URL
pub fn plausible_literal(raw: &str) -> Option<Url> {
    let unescaped = raw.trim().replace("\\/", "/").replace("&amp;", "&");
    Url::parse(&unescaped)
        .ok()
        .filter(is_plausible_media_url)
}

fn regex_set(cell: &'static OnceLock<Vec<Regex>>, patterns: &[&str]) -> &'static [Regex] {
    cell.get_or_init(|| patterns.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

/// Strategy 1: media references in markup attributes, then bare URLs in the text
pub fn scan_markup(ctx: &PageContext<'_>) -> Option<MediaLocator> {
    scan_tags(ctx).or_else(|| scan_bare_urls(ctx.text))
}

fn scan_tags(ctx: &PageContext<'_>) -> Option<MediaLocator> {
    let document = Html::parse_document(ctx.text);
    let selector = Selector::parse(
        "video[src], source[src], iframe[src], embed[src], [data-src], [data-url], [data-file], [data-source]",
    )
    .ok()?;

    document.select(&selector).find_map(|element| {
        let element = element.value();
        let url = URL_ATTRS
            .iter()
            .filter_map(|attr| element.attr(attr))
            .filter_map(|raw| resolve_candidate(ctx.base_url, raw))
            .find(is_plausible_media_url)?;

        let mut locator = MediaLocator::new(url);
        if let (Some(width), Some(height)) = (
            element.attr("width").and_then(parse_dimension),
            element.attr("height").and_then(parse_dimension),
        ) {
            locator = locator.with_resolution(width, height);
        }
        if let Some(duration) = element
            .attr("data-duration")
            .and_then(|d| d.trim().parse::<f64>().ok())
        {
            locator = locator.with_duration(duration);
        }
        Some(locator)
    })
}

fn scan_bare_urls(text: &str) -> Option<MediaLocator> {
    static BARE: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = regex_set(
        &BARE,
        &[r#"(?i)https?://[^\s<>"'\\]+?\.(?:mp4|m3u8)[^\s<>"'\\]*"#],
    );

    let text = text.replace("\\/", "/");
    patterns
        .iter()
        .flat_map(|re| re.find_iter(&text))
        .find_map(|m| plausible_literal(m.as_str()))
        .map(MediaLocator::new)
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.trim().trim_end_matches("px").parse::<u32>().ok().filter(|v| *v > 0)
}

/// Strategy 2: object literals and string assignments in scripts
pub fn scan_script_objects(ctx: &PageContext<'_>) -> Option<MediaLocator> {
    let trimmed = ctx.text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(locator) = parse_relaxed_json(trimmed).as_ref().and_then(locator_from_value) {
            return Some(locator);
        }
    }

    scan_object_literals(ctx.text)
        .or_else(|| scan_keyed_strings(ctx.text))
        .or_else(|| scan_script_variables(ctx.text))
}

fn scan_object_literals(text: &str) -> Option<MediaLocator> {
    static LITERALS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = regex_set(
        &LITERALS,
        &[
            r"(?i)\bsources?\s*[:=]\s*(\[[^\[\]]*\])",
            r"(?i)\b(?:playbackConfig|playerConfig)\s*[:=]\s*(\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\})",
            r"(?i)jwplayer\([^)]*\)\s*\.setup\s*\(\s*(\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\})",
        ],
    );

    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .find_map(|literal| match parse_relaxed_json(literal.as_str()) {
            Some(value) => locator_from_value(&value),
            None => {
                debug!("Skipping malformed script literal ({} bytes)", literal.len());
                None
            }
        })
}

fn scan_keyed_strings(text: &str) -> Option<MediaLocator> {
    static KEYED: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = regex_set(
        &KEYED,
        &[
            r#"(?i)\bfile\s*:\s*["']([^"']+\.(?:mp4|m3u8)[^"']*)["']"#,
            r#"(?i)\bsource\s*:\s*["']([^"']+\.(?:mp4|m3u8)[^"']*)["']"#,
            r#"(?i)\bsrc\s*:\s*["']([^"']+\.(?:mp4|m3u8)[^"']*)["']"#,
            r#"(?i)["']?\burl["']?\s*:\s*["']([^"']+\.(?:mp4|m3u8)[^"']*)["']"#,
        ],
    );
    first_plausible_capture(patterns, text)
}

fn scan_script_variables(text: &str) -> Option<MediaLocator> {
    static VARIABLES: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = regex_set(
        &VARIABLES,
        &[r#"\b(?:var|let|const)\s+(?:videoUrl|videoSrc|videoFile|mp4Url)\s*=\s*["']([^"']+)["']"#],
    );
    first_plausible_capture(patterns, text)
}

fn first_plausible_capture(patterns: &[Regex], text: &str) -> Option<MediaLocator> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .find_map(|m| plausible_literal(m.as_str()))
        .map(MediaLocator::new)
}

/// Walk a parsed literal looking for a plausible media URL under known keys
pub fn locator_from_value(value: &Value) -> Option<MediaLocator> {
    match value {
        Value::Array(items) => items.iter().find_map(locator_from_value),
        Value::Object(map) => {
            let direct = URL_KEYS
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find_map(plausible_literal)
                .map(|url| {
                    let mut locator = MediaLocator::new(url);
                    if let (Some(width), Some(height)) =
                        (number_field(map.get("width")), number_field(map.get("height")))
                    {
                        locator = locator.with_resolution(width as u32, height as u32);
                    }
                    if let Some(duration) = map.get("duration").and_then(Value::as_f64) {
                        locator = locator.with_duration(duration);
                    }
                    locator
                });

            direct.or_else(|| {
                ["sources", "playlist", "source", "file"]
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .filter(|v| v.is_array() || v.is_object())
                    .find_map(locator_from_value)
            })
        }
        _ => None,
    }
}

fn number_field(value: Option<&Value>) -> Option<u64> {
    let number = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v| *v > 0)
}

/// Parse JSON, falling back to a JavaScript-literal normalisation
/// (single quotes, unquoted keys, trailing commas)
pub fn parse_relaxed_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    serde_json::from_str(&normalize_js_literal(text)).ok()
}

fn normalize_js_literal(text: &str) -> String {
    static SINGLE: OnceLock<Vec<Regex>> = OnceLock::new();
    static KEYS: OnceLock<Vec<Regex>> = OnceLock::new();
    static TRAILING: OnceLock<Vec<Regex>> = OnceLock::new();

    let mut out = text.to_string();
    for re in regex_set(&SINGLE, &[r"'((?:[^'\\]|\\.)*)'"]) {
        out = re
            .replace_all(&out, |caps: &regex::Captures| {
                format!("\"{}\"", caps[1].replace("\\'", "'").replace('"', "\\\""))
            })
            .into_owned();
    }
    for re in regex_set(&KEYS, &[r"([\{,]\s*)([A-Za-z_$][\w$]*)\s*:"]) {
        out = re.replace_all(&out, "${1}\"${2}\":").into_owned();
    }
    for re in regex_set(&TRAILING, &[r",(\s*[\}\]])"]) {
        out = re.replace_all(&out, "${1}").into_owned();
    }
    out
}

/// Strategy 3: decode base64/percent-encoded literals, then rescan
pub fn scan_encoded(ctx: &PageContext<'_>) -> Option<MediaLocator> {
    static BASE64: OnceLock<Vec<Regex>> = OnceLock::new();
    static PERCENT: OnceLock<Vec<Regex>> = OnceLock::new();

    let base64_literals = regex_set(&BASE64, &[r#"atob\(\s*["']([A-Za-z0-9+/=_-]+)["']\s*\)"#]);
    let percent_literals = regex_set(
        &PERCENT,
        &[
            r#"decodeURIComponent\(\s*["']([^"']+)["']\s*\)"#,
            r#"unescape\(\s*["']([^"']+)["']\s*\)"#,
        ],
    );

    let decoded_base64 = base64_literals
        .iter()
        .flat_map(|re| re.captures_iter(ctx.text))
        .filter_map(|caps| caps.get(1).and_then(|m| decode_base64(m.as_str())));
    let decoded_percent = percent_literals
        .iter()
        .flat_map(|re| re.captures_iter(ctx.text))
        .filter_map(|caps| {
            caps.get(1)
                .and_then(|m| urlencoding::decode(m.as_str()).ok())
                .map(|s| s.into_owned())
        });

    decoded_base64.chain(decoded_percent).find_map(|decoded| {
        let inner = PageContext::new(&decoded, ctx.base_url);
        scan_markup(&inner).or_else(|| scan_script_objects(&inner))
    })
}

fn decode_base64(encoded: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .or_else(|_| URL_SAFE.decode(encoded))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Class fragments marking a container `div` as a player element
const PLAYER_CLASSES: &[&str] = &["player", "video-container", "video-wrapper"];

/// Player pages embedded in the page, in document order: iframes that look
/// like players, and player `div`s pointing at one through a `data-*`
/// attribute whose name mentions `src`, `url` or `source`.
pub fn player_frames(ctx: &PageContext<'_>, player_hosts: &[String]) -> Vec<Url> {
    let document = Html::parse_document(ctx.text);
    let Ok(selector) = Selector::parse("iframe[src], iframe[data-src], div[class]") else {
        return Vec::new();
    };

    let mut frames: Vec<Url> = Vec::new();
    for element in document.select(&selector) {
        let element = element.value();
        let (raw, is_div) = if element.name() == "div" {
            let class = element.attr("class").unwrap_or_default().to_ascii_lowercase();
            if !PLAYER_CLASSES.iter().any(|c| class.contains(c)) {
                continue;
            }
            let raw = element.attrs().find_map(|(name, value)| {
                let name = name.to_ascii_lowercase();
                let points_at_player = name.starts_with("data-")
                    && ["src", "url", "source"].iter().any(|k| name.contains(k));
                points_at_player.then_some(value)
            });
            (raw, true)
        } else {
            (element.attr("src").or_else(|| element.attr("data-src")), false)
        };

        let Some(url) = raw.and_then(|raw| resolve_candidate(ctx.base_url, raw)) else {
            continue;
        };
        if !is_absolute_http(&url) || is_plausible_media_url(&url) {
            continue;
        }

        let lower = url.as_str().to_ascii_lowercase();
        let host = url.host_str().unwrap_or_default();
        let known_host = player_hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{}", h)));
        let looks_like_player = is_div || lower.contains("player") || lower.contains("embed");
        if (known_host || looks_like_player) && !frames.contains(&url) {
            frames.push(url);
        }
    }
    frames
}

/// Post id for server-rendered fallbacks
pub fn find_post_id(text: &str, hints: Option<&SiteHints>) -> Option<String> {
    static POST_ID: OnceLock<Vec<Regex>> = OnceLock::new();
    let defaults = regex_set(
        &POST_ID,
        &[
            r#"class=["'][^"']*\bpost-(\d+)\b"#,
            r"\bpostid-(\d+)\b",
            r#"["']?post_id["']?\s*[:=]\s*["']?(\d+)"#,
        ],
    );
    first_capture(hints.and_then(|h| h.post_id_pattern.as_deref()), defaults, text)
}

/// Nonce for server-rendered fallbacks; empty when none is present
pub fn find_nonce(text: &str, hints: Option<&SiteHints>) -> String {
    static NONCE: OnceLock<Vec<Regex>> = OnceLock::new();
    let defaults = regex_set(
        &NONCE,
        &[
            r#"(?i)\bnonce["']?\s*:\s*["']([^"']+)["']"#,
            r#"(?i)_wpnonce["']?\s*:\s*["']([^"']+)["']"#,
            r#"(?i)<input[^>]+?name=["']\w*nonce\w*["']\s+value=["']([\w-]+)["']"#,
        ],
    );
    first_capture(hints.and_then(|h| h.token_pattern.as_deref()), defaults, text)
        .unwrap_or_default()
}

fn first_capture(custom: Option<&str>, defaults: &[Regex], text: &str) -> Option<String> {
    let custom = custom.and_then(|pattern| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Ignoring invalid site pattern {:?}: {}", pattern, e);
            None
        }
    });

    custom
        .iter()
        .chain(defaults.iter())
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().to_string())
}

/// Pick the best of several observed media URLs: MP4 first, then longer
/// URLs, then URLs mentioning high quality. Ties keep the earliest.
pub fn select_best_url(urls: &[Url]) -> Option<&Url> {
    urls.iter()
        .enumerate()
        .max_by_key(|(index, url)| {
            let lower = url.as_str().to_ascii_lowercase();
            (
                url.path().to_ascii_lowercase().ends_with(".mp4"),
                lower.len(),
                lower.contains("high") || lower.contains("hd"),
                Reverse(*index),
            )
        })
        .map(|(_, url)| url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.example/posts/42/").unwrap()
    }

    #[test]
    fn test_plausibility_filter() {
        let ok = |s: &str| is_plausible_media_url(&Url::parse(s).unwrap());

        assert!(ok("https://cdn.example.com/v/clip.mp4"));
        assert!(ok("https://cdn.example.com/v/master.m3u8?token=a&exp=1"));
        assert!(ok("http://cdn.example.com/v/CLIP.MP4"));
        assert!(!ok("https://cdn.example.com/wp-includes/js/video.mp4"));
        assert!(!ok("https://cdn.example.com/static/intro.mp4"));
        assert!(!ok("https://cdn.example.com/cdn-cgi/trace.m3u8"));
        assert!(!ok("https://cdn.example.com/v/clip.webm"));
        assert!(!ok("ftp://cdn.example.com/v/clip.mp4"));
        assert!(plausible_literal("/relative/clip.mp4").is_none());
    }

    #[test]
    fn test_markup_video_source() {
        let html = r#"<html><body>
            <script src="/wp-includes/js/jquery.min.js"></script>
            <video width="1280" height="720" data-duration="61.5">
                <source src="/media/clip.mp4" type="video/mp4">
            </video>
        </body></html>"#;
        let base = base();
        let locator = scan_markup(&PageContext::new(html, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://site.example/media/clip.mp4");
    }

    #[test]
    fn test_markup_dimensions_on_video_tag() {
        let html = r#"<video src="https://cdn.example/v.mp4" width="640" height="360" data-duration="10"></video>"#;
        let base = base();
        let locator = scan_markup(&PageContext::new(html, &base)).unwrap();
        assert_eq!(locator.resolution(), Some((640, 360)));
        assert_eq!(locator.duration(), Some(10.0));
    }

    #[test]
    fn test_markup_rejects_asset_urls() {
        let html = r#"<iframe src="https://cdn.example.com/wp-includes/js/video.mp4"></iframe>
            <div data-src="https://cdn.example.com/assets/bg.mp4"></div>"#;
        let base = base();
        assert!(scan_markup(&PageContext::new(html, &base)).is_none());
    }

    #[test]
    fn test_markup_bare_url_fallback() {
        let html = r#"<p>stream at https:\/\/media.example\/hls\/abc\/index.m3u8?t=9 now</p>"#;
        let base = base();
        let locator = scan_markup(&PageContext::new(html, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://media.example/hls/abc/index.m3u8?t=9");
    }

    #[test]
    fn test_script_sources_array() {
        let script = r#"<script>
            var player = jwplayer("box");
            var config = { sources: [{file: 'https://cdn.example/v/720.mp4', label: '720p', width: 1280, height: 720,}], autostart: false };
        </script>"#;
        let base = base();
        let locator = scan_script_objects(&PageContext::new(script, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://cdn.example/v/720.mp4");
        assert_eq!(locator.resolution(), Some((1280, 720)));
    }

    #[test]
    fn test_script_jwplayer_setup() {
        let script = r#"jwplayer('player').setup({ "playlist": [{ "file": "https://cdn.example/hls/x/master.m3u8" }], "width": "100%" });"#;
        let base = base();
        let locator = scan_script_objects(&PageContext::new(script, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://cdn.example/hls/x/master.m3u8");
    }

    #[test]
    fn test_script_malformed_literal_falls_through() {
        let script = r#"playerConfig = { broken: [ }; var videoUrl = "https://cdn.example/v/final.mp4";"#;
        let base = base();
        let locator = scan_script_objects(&PageContext::new(script, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://cdn.example/v/final.mp4");
    }

    #[test]
    fn test_relaxed_json() {
        let value = parse_relaxed_json(r#"{file: 'https://a.example/x.mp4', 'label': "HD", n: 3,}"#).unwrap();
        assert_eq!(value["file"], "https://a.example/x.mp4");
        assert_eq!(value["label"], "HD");
        assert_eq!(value["n"], 3);
        assert!(parse_relaxed_json("{ nope").is_none());
    }

    #[test]
    fn test_encoded_base64() {
        let payload = STANDARD.encode(r#"{"file":"https://cdn.example/enc/clip.mp4"}"#);
        let html = format!(r#"<script>var cfg = JSON.parse(atob("{}"));</script>"#, payload);
        let base = base();
        let ctx = PageContext::new(&html, &base);
        assert!(scan_markup(&ctx).is_none());
        assert!(scan_script_objects(&ctx).is_none());
        let locator = scan_encoded(&ctx).unwrap();
        assert_eq!(locator.url().as_str(), "https://cdn.example/enc/clip.mp4");
    }

    #[test]
    fn test_encoded_percent() {
        let html = r#"document.write(decodeURIComponent("%3Cvideo%20src%3D%22https%3A%2F%2Fcdn.example%2Fp%2Fclip.m3u8%22%3E"));"#;
        let base = base();
        let locator = scan_encoded(&PageContext::new(html, &base)).unwrap();
        assert_eq!(locator.url().as_str(), "https://cdn.example/p/clip.m3u8");
    }

    #[test]
    fn test_encoded_garbage_is_no_match() {
        let html = r#"atob("!!!not-base64!!!"); unescape("%E0%A4%A")"#;
        let base = base();
        assert!(scan_encoded(&PageContext::new(html, &base)).is_none());
    }

    #[test]
    fn test_strategy_order_short_circuits() {
        let html = r#"<video src="https://cdn.example/first.mp4"></video>
            <script>var videoUrl = "https://cdn.example/second.mp4";</script>"#;
        let base = base();
        let (name, locator) = run_static_strategies(&PageContext::new(html, &base)).unwrap();
        assert_eq!(name, "markup");
        assert_eq!(locator.url().as_str(), "https://cdn.example/first.mp4");
    }

    #[test]
    fn test_player_frames() {
        let html = r#"<iframe src="https://player.example/embed/abc"></iframe>
            <iframe src="https://ads.example/banner"></iframe>
            <iframe src="https://frames.example/v/1"></iframe>"#;
        let base = base();
        let ctx = PageContext::new(html, &base);
        let frames = player_frames(&ctx, &["frames.example".to_string()]);
        let frames: Vec<&str> = frames.iter().map(Url::as_str).collect();
        assert_eq!(frames, vec!["https://player.example/embed/abc", "https://frames.example/v/1"]);
    }

    #[test]
    fn test_player_divs_are_frames() {
        let html = r#"<div class="entry-content">
              <div class="Video-Wrapper" data-player-url="/watch/frame/9"></div>
              <div class="video-container" data-source="https://cdn.example/v/a.mp4"></div>
              <div class="jw-player" data-id="3" data-src="https://host.example/p/4"></div>
              <div class="sidebar" data-src="https://other.example/p/5"></div>
              <div class="player-box"></div>
            </div>"#;
        let base = base();
        let frames = player_frames(&PageContext::new(html, &base), &[]);
        let frames: Vec<&str> = frames.iter().map(Url::as_str).collect();
        assert_eq!(
            frames,
            vec![
                "https://site.example/watch/frame/9",
                "https://host.example/p/4",
            ]
        );
    }

    #[test]
    fn test_post_id_and_nonce() {
        let html = r#"<article class="entry post-1234 type-post">
            <script>var ajax = { nonce: "f00ba4", url: "/wp-admin/admin-ajax.php" };</script>"#;
        assert_eq!(find_post_id(html, None).as_deref(), Some("1234"));
        assert_eq!(find_nonce(html, None), "f00ba4");
        assert_eq!(find_nonce("<p>nothing</p>", None), "");

        let hints = SiteHints {
            token_pattern: Some(r#"var\s+token\s*=\s*["']([^"']+)["']"#.to_string()),
            post_id_pattern: Some(r"data-vid=(\d+)".to_string()),
            ..Default::default()
        };
        let custom = r#"<div data-vid=77></div><script>var token = "tok";</script>"#;
        assert_eq!(find_post_id(custom, Some(&hints)).as_deref(), Some("77"));
        assert_eq!(find_nonce(custom, Some(&hints)), "tok");
    }

    #[test]
    fn test_select_best_url() {
        let urls: Vec<Url> = [
            "https://cdn.example/a/index.m3u8",
            "https://cdn.example/a/low.mp4",
            "https://cdn.example/a/high.mp4",
        ]
        .iter()
        .map(|s| Url::parse(s).unwrap())
        .collect();
        assert_eq!(select_best_url(&urls).unwrap().as_str(), "https://cdn.example/a/high.mp4");
        assert!(select_best_url(&[]).is_none());
    }
}
