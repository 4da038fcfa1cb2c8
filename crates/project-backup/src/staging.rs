//! The staging directory a run mirrors its files into.
//!

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::cleanup::{CleanupError, remove_tree};

/// A staging directory owned by one run.
///
/// Nothing is removed on drop, a failed run leaves its staging directory for inspection.
#[derive(Debug)]
pub struct StagingDirectory {
    path: PathBuf,
}

impl StagingDirectory {
    /// The path to the staging directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively delete the staging directory.
    pub fn remove(self) -> Result<(), CleanupError> {
        remove_tree(&self.path)
    }
}

/// Create `root` if absent, then the empty directory `root/name`.
pub fn create_staging(root: &Path, name: &str) -> Result<StagingDirectory, StagingError> {
    fs::create_dir_all(root).map_err(|e| StagingError::CreateRoot(e, root.to_path_buf()))?;

    let path = root.join(name);

    match fs::create_dir(&path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            // An empty directory left behind is safe to reuse.
            if !path.is_dir() {
                return Err(StagingError::AlreadyExists(path));
            }

            let mut entries =
                fs::read_dir(&path).map_err(|e| StagingError::Inspect(e, path.clone()))?;
            if entries.next().is_some() {
                return Err(StagingError::AlreadyExists(path));
            }

            debug!("Reusing empty staging directory {path:?}");
        }
        Err(error) => return Err(StagingError::Create(error, path)),
    }

    Ok(StagingDirectory { path })
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create backup root {1:?}: {0}")]
    CreateRoot(#[source] io::Error, PathBuf),

    #[error("Failed to create staging directory {1:?}: {0}")]
    Create(#[source] io::Error, PathBuf),

    #[error("Failed to inspect existing staging directory {1:?}: {0}")]
    Inspect(#[source] io::Error, PathBuf),

    #[error("Staging path {0:?} already exists and is not an empty directory")]
    AlreadyExists(PathBuf),
}

impl StagingError {
    /// The path the error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::CreateRoot(_, path)
            | Self::Create(_, path)
            | Self::Inspect(_, path)
            | Self::AlreadyExists(path) => path,
        }
    }
}
