use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::Result;

/// Destination of downloaded subtitle files
pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` verbatim to `file_name` in the download directory.
    pub async fn offer(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(file_name);
        fs::write(&path, content).await?;

        info!("Saved {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}
