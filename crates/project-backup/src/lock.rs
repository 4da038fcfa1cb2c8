use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

/// The lock file name inside the backup root.
pub const LOCK_FILE_NAME: &str = ".project-backup.lock";

/// An advisory lock on a backup root, released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Create the backup root if needed and take its lock.
    pub fn acquire(root: &Path) -> Result<Self, LockError> {
        fs::create_dir_all(root).map_err(|e| LockError::Io(e, root.to_path_buf()))?;

        let path = root.join(LOCK_FILE_NAME);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|error| {
                if error.kind() == io::ErrorKind::AlreadyExists {
                    LockError::Held(path.clone())
                } else {
                    LockError::Io(error, path.clone())
                }
            })?;

        let lock = Self { path };

        writeln!(file, "{}", std::process::id())
            .map_err(|e| LockError::Io(e, lock.path.clone()))?;

        Ok(lock)
    }

    /// The path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            warn!("Could not release lock {:?}: {error}", self.path);
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another backup is running against this root, remove {0:?} if it is stale")]
    Held(PathBuf),

    #[error("Failed to take lock at {1:?}: {0}")]
    Io(#[source] io::Error, PathBuf),
}

impl LockError {
    /// The path the error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::Held(path) | Self::Io(_, path) => path,
        }
    }
}
