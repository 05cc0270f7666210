//! Per-job scratch directory for downloaded segments

use crate::error::GrabError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory holding segment files for one download job.
///
/// Created lazily on first use and removed by [`ScratchDir::cleanup`];
/// dropping an uncleaned directory removes it as well.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    created: bool,
}

impl ScratchDir {
    /// Scratch directory `temp_<id>_<suffix>` under `parent`
    pub fn new(parent: &Path, video_id: &str) -> Self {
        let suffix: String = {
            use rand::distributions::Alphanumeric;
            use rand::Rng;
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect()
        };
        let name = format!(
            "temp_{}_{}",
            crate::utils::filename::to_safe_stem(video_id),
            suffix.to_ascii_lowercase()
        );
        Self {
            path: parent.join(name),
            created: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure(&mut self) -> Result<&Path, GrabError> {
        if !self.created {
            tokio::fs::create_dir_all(&self.path).await?;
            self.created = true;
            debug!("Created scratch directory {}", self.path.display());
        }
        Ok(&self.path)
    }

    /// Path for the segment at `index`; zero-padded so names sort in order
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("segment_{:05}.ts", index))
    }

    /// Remove the given segment files, ignoring ones already gone
    pub async fn remove_files(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Remove the directory and everything in it
    pub async fn cleanup(&mut self) {
        if !self.created {
            return;
        }
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Removed scratch directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
        self.created = false;
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.created {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
