//! Per-run temporary workspace.
//!
//! Each pipeline run owns an isolated directory under the configured temp
//! root, keyed by a generated run ID, so concurrent runs never collide on
//! file paths. The workspace is removed deterministically when the run
//! finishes, success or failure, unless explicitly kept for debugging.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

/// Directory names inside a run workspace.
const DOWNLOADS_DIR: &str = "downloads";
const AUDIO_DIR: &str = "audio";
const WORK_DIR: &str = "work";

/// Generate a unique run identifier: local timestamp plus a random suffix.
pub fn generate_run_id() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0x1000..0xffff);
    format!("run_{stamp}_{suffix:04x}")
}

/// An exclusive, self-cleaning directory tree for one run.
pub struct RunWorkspace {
    run_id: String,
    root: PathBuf,
    keep: bool,
}

impl RunWorkspace {
    /// Create the workspace for `run_id` under `temp_root`.
    ///
    /// Creates the root and all standard subdirectories.
    pub fn create(temp_root: impl AsRef<Path>, run_id: impl Into<String>) -> io::Result<Self> {
        let run_id = run_id.into();
        let root = temp_root.as_ref().join(&run_id);

        for sub in [DOWNLOADS_DIR, AUDIO_DIR, WORK_DIR] {
            fs::create_dir_all(root.join(sub))?;
        }

        tracing::debug!("Run workspace created: {}", root.display());
        Ok(Self {
            run_id,
            root,
            keep: false,
        })
    }

    /// The run identifier this workspace belongs to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for sourced/downloaded clips.
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join(DOWNLOADS_DIR)
    }

    /// Directory for narration and mixed audio.
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR)
    }

    /// Directory for normalized clips, composites, and other intermediates.
    pub fn work_dir(&self) -> PathBuf {
        self.root.join(WORK_DIR)
    }

    /// Keep the workspace on disk after the run (for debugging).
    pub fn keep(&mut self) {
        self.keep = true;
    }

    /// Remove the workspace tree now.
    pub fn cleanup(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            tracing::debug!("Run workspace removed: {}", self.root.display());
        }
        Ok(())
    }
}

impl Drop for RunWorkspace {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = self.cleanup() {
            tracing::warn!(
                "Failed to clean up run workspace {}: {}",
                self.root.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_makes_all_subdirectories() {
        let temp = tempdir().unwrap();
        let ws = RunWorkspace::create(temp.path(), "run_test_0001").unwrap();
        assert!(ws.downloads_dir().is_dir());
        assert!(ws.audio_dir().is_dir());
        assert!(ws.work_dir().is_dir());
    }

    #[test]
    fn drop_removes_workspace() {
        let temp = tempdir().unwrap();
        let root = {
            let ws = RunWorkspace::create(temp.path(), "run_test_0002").unwrap();
            fs::write(ws.work_dir().join("intermediate.mp4"), b"x").unwrap();
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn kept_workspace_survives_drop() {
        let temp = tempdir().unwrap();
        let root = {
            let mut ws = RunWorkspace::create(temp.path(), "run_test_0003").unwrap();
            ws.keep();
            ws.root().to_path_buf()
        };
        assert!(root.exists());
    }

    #[test]
    fn run_ids_are_unique_enough() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert!(a.starts_with("run_"));
        // Same-second collisions are still separated by the random suffix.
        assert_ne!(a, b);
    }
}
