//! Progress tracking for segment downloads

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback invoked with `(completed, total)` after each finished segment
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Segment counters for one download job
#[derive(Debug, Clone)]
pub struct Progress {
    /// Number of segments in the rendition
    pub total: usize,
    /// Number of segments written to disk
    pub completed: usize,
    /// Bytes in the joined output
    pub bytes: u64,
    /// 0.0 to 100.0
    pub percent: f64,
    /// Estimated time remaining, from the mean time per segment so far
    pub eta: Option<Duration>,
    pub start_time: Instant,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            bytes: 0,
            percent: 0.0,
            eta: None,
            start_time: Instant::now(),
        }
    }

    /// Record that `completed` segments are on disk
    pub fn update(&mut self, completed: usize) {
        self.completed = completed.min(self.total);
        self.percent = match self.total {
            0 => 0.0,
            total => self.completed as f64 * 100.0 / total as f64,
        };

        self.eta = match (self.completed, self.remaining()) {
            (_, 0) if self.total > 0 => Some(Duration::ZERO),
            (0, _) => None,
            (done, left) => {
                let per_segment = self.start_time.elapsed().div_f64(done as f64);
                Some(per_segment.mul_f64(left as f64))
            }
        };
    }

    /// Segments still to fetch
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// ETA for display, "?" until the first segment lands
    pub fn eta_string(&self) -> String {
        self.eta.map(format_duration).unwrap_or_else(|| "?".to_string())
    }
}

/// Format bytes as human-readable string (binary units)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Format an elapsed time or ETA ("45s", "3m 05s", "1h 02m")
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {:02}s", m, s),
        (h, m, _) => format!("{}h {:02}m", h, m),
    }
}

/// Format a media running time as a clock ("1:35", "1:02:09")
pub fn format_clock(seconds: f64) -> String {
    let secs = seconds.max(0.0).round() as u64;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_creation() {
        let progress = Progress::new(10);
        assert_eq!(progress.total, 10);
        assert_eq!(progress.remaining(), 10);
        assert_eq!(progress.eta_string(), "?");
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_segments() {
        let mut progress = Progress::new(4);

        progress.update(1);
        progress.update(2);
        assert_eq!(progress.remaining(), 2);
        assert_eq!(progress.percent, 50.0);
        assert!(progress.eta.is_some());
        assert!(!progress.is_complete());

        progress.update(4);
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.eta, Some(Duration::ZERO));
        assert_eq!(progress.eta_string(), "0s");
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_clamps_to_total() {
        let mut progress = Progress::new(2);
        progress.update(5);
        assert_eq!(progress.completed, 2);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_empty_job_is_never_complete() {
        let mut progress = Progress::new(0);
        progress.update(0);
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.eta, None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m 05s");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h 02m");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(95.4), "1:35");
        assert_eq!(format_clock(3729.0), "1:02:09");
        assert_eq!(format_clock(-3.0), "0:00");
    }
}
