//! Per-request scratch directory.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Result, SubburnError};

const WORKSPACE_PREFIX: &str = "subburn-";

/// Temporary directory owning every file a single request produces.
///
/// The directory and its contents are removed when the workspace is dropped,
/// whichever way the request ends. Holders that outlive the handler (the
/// download stream) keep the workspace alive by owning it.
///
/// # Example
///
/// ```no_run
/// use subburn::workspace::Workspace;
///
/// let workspace = Workspace::create(None)?;
/// let subtitles = workspace.subtitle_input();
/// // ... write files, run tools ...
/// drop(workspace); // directory is gone
/// # Ok::<(), subburn::error::SubburnError>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace under `parent`, or under the system temp directory.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let temp_dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SubburnError::Workspace(format!("Failed to create workspace root {}: {}", parent.display(), e))
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| SubburnError::Workspace(format!("Failed to create workspace: {}", e)))?;

        // Tools run with other working directories, so every path handed out must be absolute
        let root = std::fs::canonicalize(temp_dir.path())
            .map_err(|e| SubburnError::Workspace(format!("Failed to resolve workspace path: {}", e)))?;

        debug!("Created workspace {}", root.display());
        Ok(Self { temp_dir, root })
    }

    /// Get the workspace directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a file path with the given name inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Where the uploaded media is written, keeping its extension as a demuxer hint.
    pub fn media_input(&self, extension: Option<&str>) -> PathBuf {
        match extension {
            Some(ext) => self.file(&format!("input_media.{}", ext)),
            None => self.file("input_media"),
        }
    }

    /// Where the uploaded subtitles are written.
    pub fn subtitle_input(&self) -> PathBuf {
        self.file("input.srt")
    }

    /// Intermediate video produced from an audio-only upload.
    pub fn converted_video(&self) -> PathBuf {
        self.file("converted.mp4")
    }

    /// Final subtitled output with the given container extension.
    pub fn output(&self, extension: &str) -> PathBuf {
        self.file(&format!("output.{}", extension))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // TempDir removes the directory right after this
        debug!("Releasing workspace {}", self.temp_dir.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_paths() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();

        assert!(workspace.path().is_absolute());
        assert!(workspace.path().file_name().unwrap().to_string_lossy().starts_with(WORKSPACE_PREFIX));
        assert_eq!(workspace.media_input(Some("mp4")).file_name().unwrap(), "input_media.mp4");
        assert_eq!(workspace.media_input(None).file_name().unwrap(), "input_media");
        assert_eq!(workspace.output("mkv").file_name().unwrap(), "output.mkv");
        assert!(workspace.subtitle_input().starts_with(workspace.path()));
        assert!(workspace.converted_video().starts_with(workspace.path()));
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        std::fs::write(workspace.file("leftover.bin"), b"data").unwrap();
        let dir = workspace.path().to_path_buf();
        assert!(dir.exists());

        drop(workspace);
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_parent_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let nested = parent.path().join("a").join("b");
        let workspace = Workspace::create(Some(&nested)).unwrap();
        assert!(workspace.path().starts_with(std::fs::canonicalize(&nested).unwrap()));
    }
}
