//! Script-executing page renderer seam
//!
//! A renderer loads a page in a real browser engine, reports the URLs the
//! page requested, and exposes the rendered markup. The resolver only uses it
//! as a last resort and treats every renderer failure as "no match".

use crate::error::GrabError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Default time spent watching network traffic after navigation
pub const DEFAULT_CAPTURE_WINDOW: Duration = Duration::from_secs(10);

/// A page renderer able to execute scripts
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load the page and wait for its document to be ready
    async fn navigate(&self, url: &Url) -> Result<(), GrabError>;

    /// URLs requested by the page during the next `window`
    async fn observe_network_traffic(&self, window: Duration) -> Result<Vec<String>, GrabError>;

    /// Markup of the page after scripts have run
    async fn page_source(&self) -> Result<String, GrabError>;
}

/// Drain `requests` for at most `window`, or until `stop` fires or every
/// sender is gone. Renderer implementations feed their request events here.
pub async fn collect_window(
    mut requests: mpsc::Receiver<String>,
    window: Duration,
    stop: CancellationToken,
) -> Vec<String> {
    let mut seen = Vec::new();
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = stop.cancelled() => {
                debug!("Capture window stopped early");
                break;
            }
            next = requests.recv() => match next {
                Some(url) => {
                    if !seen.contains(&url) {
                        seen.push(url);
                    }
                }
                None => break,
            },
        }
    }

    debug!("Captured {} request(s)", seen.len());
    seen
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_window_dedups_until_senders_close() {
        let (tx, rx) = mpsc::channel(8);
        tx.send("https://a.example/1.m3u8".to_string()).await.unwrap();
        tx.send("https://a.example/1.m3u8".to_string()).await.unwrap();
        tx.send("https://a.example/app.js".to_string()).await.unwrap();
        drop(tx);

        let seen = collect_window(rx, Duration::from_secs(5), CancellationToken::new()).await;
        assert_eq!(seen, vec!["https://a.example/1.m3u8", "https://a.example/app.js"]);
    }

    #[tokio::test]
    async fn test_collect_window_is_bounded() {
        let (tx, rx) = mpsc::channel::<String>(1);
        let started = std::time::Instant::now();
        let seen = collect_window(rx, Duration::from_millis(50), CancellationToken::new()).await;
        assert!(seen.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(tx);
    }

    #[tokio::test]
    async fn test_collect_window_stops_on_cancel() {
        let (_tx, rx) = mpsc::channel::<String>(1);
        let stop = CancellationToken::new();
        stop.cancel();
        let seen = collect_window(rx, Duration::from_secs(60), stop).await;
        assert!(seen.is_empty());
    }
}
