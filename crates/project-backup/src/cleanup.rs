use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Recursively delete `path`.
pub fn remove_tree(path: &Path) -> Result<(), CleanupError> {
    fs::remove_dir_all(path).map_err(|e| CleanupError::Remove(e, path.to_path_buf()))?;
    debug!("Removed {path:?}");

    Ok(())
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to remove {1:?}: {0}")]
    Remove(#[source] io::Error, PathBuf),
}

impl CleanupError {
    /// The path the error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::Remove(_, path) => path,
        }
    }
}
