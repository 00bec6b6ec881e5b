//! Request-scoped run context
//!
//! Every run owns a uniquely named workspace directory under the configured
//! work root. All intermediate artifacts live inside it, so releasing the
//! context removes them with one recursive delete. Release happens on every
//! exit path through `Drop`; failures to delete are logged and ignored.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;

use crate::error::{DubbingError, Result};
use crate::speech::Language;

const RUN_ID_LEN: usize = 12;

pub fn new_run_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RUN_ID_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

/// True for identifiers produced by `new_run_id`.
pub fn is_valid_run_id(id: &str) -> bool {
    id.len() == RUN_ID_LEN && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[derive(Debug)]
pub struct RunContext {
    run_id: String,
    language: Language,
    workspace: Option<TempDir>,
    workspace_path: PathBuf,
}

impl RunContext {
    /// `create` on the blocking pool, for use inside async request handling.
    pub async fn acquire(work_root: &Path, language: Language) -> Result<Self> {
        let work_root = work_root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::create(&work_root, language))
            .await
            .map_err(|e| DubbingError::io(format!("workspace task failed: {}", e)))?
    }

    pub fn create(work_root: &Path, language: Language) -> Result<Self> {
        if let Err(e) = std::fs::create_dir_all(work_root) {
            log::warn!("Cannot create work dir {}: {}", work_root.display(), e);
            return Err(DubbingError::io(format!("cannot create the work directory: {}", e)));
        }

        let run_id = new_run_id();
        let workspace = tempfile::Builder::new()
            .prefix(&format!("run-{}-", run_id))
            .tempdir_in(work_root)
            .map_err(|e| DubbingError::io(format!("cannot create run workspace: {}", e)))?;
        let workspace_path = workspace.path().to_path_buf();

        log::debug!("Run {} workspace: {}", run_id, workspace_path.display());

        Ok(Self {
            run_id,
            language,
            workspace: Some(workspace),
            workspace_path,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace_path
    }

    /// Location of a named artifact inside this run's workspace.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.workspace_path.join(name)
    }

    /// Deletes the workspace now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            match workspace.close() {
                Ok(()) => log::debug!("Run {} workspace removed", self.run_id),
                Err(e) => log::debug!("Run {} workspace cleanup failed (ignored): {}", self.run_id, e),
            }
        }
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique_and_valid() {
        let a = new_run_id();
        let b = new_run_id();
        assert_ne!(a, b);
        assert!(is_valid_run_id(&a));
        assert!(!is_valid_run_id("../etc/passwd"));
        assert!(!is_valid_run_id("ABCDEFGHIJKL"));
    }

    #[test]
    fn test_workspace_removed_on_close() {
        let root = TempDir::new().unwrap();
        let context = RunContext::create(root.path(), Language::French).unwrap();
        let workspace = context.workspace().to_path_buf();
        std::fs::write(context.artifact("audio.wav"), b"pcm").unwrap();
        assert!(workspace.starts_with(root.path()));

        context.close();

        assert!(!workspace.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let workspace = {
            let context = RunContext::create(root.path(), Language::Hindi).unwrap();
            std::fs::create_dir(context.artifact("nested")).unwrap();
            context.workspace().to_path_buf()
        };
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_acquire_creates_missing_work_root() {
        let root = TempDir::new().unwrap();
        let work_root = root.path().join("nested").join("work");

        let context = RunContext::acquire(&work_root, Language::Spanish).await.unwrap();
        assert!(context.workspace().starts_with(&work_root));
        assert!(context.workspace().is_dir());

        context.close();
        assert_eq!(std::fs::read_dir(&work_root).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_contexts_are_isolated() {
        let root = TempDir::new().unwrap();
        let a = RunContext::create(root.path(), Language::English).unwrap();
        let b = RunContext::create(root.path(), Language::English).unwrap();
        assert_ne!(a.workspace(), b.workspace());
        assert_ne!(a.artifact("audio.wav"), b.artifact("audio.wav"));
    }
}
