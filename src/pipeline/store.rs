//! Finished videos awaiting download

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{DubbingError, Result};
use crate::pipeline::context::is_valid_run_id;

/// File name offered to the browser for every download.
pub const DOWNLOAD_FILE_NAME: &str = "ai_voice_video.mp4";

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored location for a run, or `None` for ids that cannot be ours.
    pub fn path_for(&self, run_id: &str) -> Option<PathBuf> {
        is_valid_run_id(run_id).then(|| self.dir.join(format!("{}.mp4", run_id)))
    }

    /// Moves a finished video out of the run workspace into the store.
    pub async fn deliver(&self, run_id: &str, video: &Path) -> Result<PathBuf> {
        let target = self.path_for(run_id)
            .ok_or_else(|| DubbingError::input(format!("invalid run id: {}", run_id)))?;

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            log::warn!("Cannot create output dir {}: {}", self.dir.display(), e);
            return Err(DubbingError::io(format!("cannot create the output directory: {}", e)));
        }

        if let Err(e) = tokio::fs::rename(video, &target).await {
            // Work and output dirs may sit on different filesystems.
            log::debug!("rename into output store failed ({}), copying instead", e);
            if let Err(e) = tokio::fs::copy(video, &target).await {
                log::warn!("Cannot store {}: {}", target.display(), e);
                return Err(DubbingError::io(format!("cannot write the output video: {}", e)));
            }
        }

        Ok(target)
    }

    /// Deletes stored videos last modified more than `max_age` ago.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_ours = path.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(is_valid_run_id)
                && path.extension().is_some_and(|e| e == "mp4");
            if !is_ours {
                continue;
            }

            let age = entry.metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age > max_age) {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => log::debug!("Could not remove expired output {}: {}", path.display(), e),
                }
            }
        }

        removed
    }
}
