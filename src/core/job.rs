//! One download job: scratch directory, segment files and progress

use crate::core::media::{MediaKind, Quality, Segment};
use crate::core::progress::{Progress, ProgressCallback};
use crate::download::scratch::ScratchDir;
use crate::download::segments::{concatenate, SegmentDownloader};
use crate::error::GrabError;
use crate::utils::filename::{generate_unique_filename, output_file_name};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// State owned by a single download operation
#[derive(Debug)]
pub struct DownloadJob {
    video_id: String,
    quality: Quality,
    destination: PathBuf,
    scratch: ScratchDir,
    segment_paths: Vec<PathBuf>,
    progress: Mutex<Progress>,
}

impl DownloadJob {
    pub fn new(video_id: impl Into<String>, quality: Quality, destination: impl Into<PathBuf>) -> Self {
        let video_id = video_id.into();
        let destination = destination.into();
        let scratch = ScratchDir::new(&destination, &video_id);
        Self {
            video_id,
            quality,
            destination,
            scratch,
            segment_paths: Vec::new(),
            progress: Mutex::new(Progress::new(0)),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Snapshot of the job's progress counters
    pub fn progress(&self) -> Progress {
        self.progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Unused output path for this job's media in the destination directory
    pub async fn output_path(&self, kind: MediaKind) -> Result<PathBuf, GrabError> {
        tokio::fs::create_dir_all(&self.destination).await?;
        let name = output_file_name(
            &self.video_id,
            chrono::Utc::now().timestamp(),
            kind.output_extension(),
        );
        let name = generate_unique_filename(&self.destination, &name).await?;
        Ok(self.destination.join(name))
    }

    /// Fetch `segments` into scratch, join them into `output`, and remove
    /// the scratch directory whatever the outcome. Returns bytes written.
    pub async fn run(
        &mut self,
        downloader: &SegmentDownloader<'_>,
        segments: &[Segment],
        output: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<u64, GrabError> {
        if let Ok(mut progress) = self.progress.lock() {
            *progress = Progress::new(segments.len());
        }

        let result = self.fetch_and_join(downloader, segments, output, on_progress).await;

        self.scratch.cleanup().await;
        self.segment_paths.clear();
        debug!("Job {} finished, scratch removed", self.video_id);
        result
    }

    async fn fetch_and_join(
        &mut self,
        downloader: &SegmentDownloader<'_>,
        segments: &[Segment],
        output: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<u64, GrabError> {
        let scratch = &mut self.scratch;
        let progress = &self.progress;

        let paths = downloader
            .fetch_all(segments, scratch, |completed, total| {
                if let Ok(mut progress) = progress.lock() {
                    progress.update(completed);
                }
                if let Some(callback) = &on_progress {
                    callback(completed, total);
                }
            })
            .await?;
        self.segment_paths = paths;

        let bytes = concatenate(&self.segment_paths, output).await?;
        if let Ok(mut progress) = self.progress.lock() {
            progress.bytes = bytes;
        }
        info!(
            "Joined {} segments of {} into {}",
            self.segment_paths.len(),
            self.video_id,
            output.display()
        );
        Ok(bytes)
    }
}
