//! Mirror the backup manifest into the staging directory.
//!

use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::Config;

/// What to do when a path in the manifest does not exist.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingSourcePolicy {
    /// Fail the run.
    #[default]
    Abort,

    /// Log a warning and continue without the path.
    Skip,
}

/// Options for copying the manifest.
#[derive(Debug, Default, Clone)]
pub struct CopyOptions {
    /// What to do when a path in the manifest does not exist.
    pub missing_source: MissingSourcePolicy,

    /// Folder names that are never descended into.
    pub ignore_folders: Vec<String>,

    /// File extensions, without the leading dot, that are not copied from directories.
    pub ignore_extensions: Vec<String>,

    /// Paths that are never copied, such as a backup root inside the source tree.
    pub excluded: Vec<PathBuf>,

    /// Paths relative to the destination root that are never overwritten.
    pub reserved: Vec<PathBuf>,
}

impl CopyOptions {
    /// Copy options from the config, with no excluded or reserved paths.
    pub fn from_config(config: &Config) -> Self {
        Self {
            missing_source: config.missing_source,
            ignore_folders: config.ignore_folders.clone(),
            ignore_extensions: config.ignore_extensions.clone(),
            excluded: Vec::new(),
            reserved: Vec::new(),
        }
    }

    fn is_ignored_folder(&self, name: &OsStr) -> bool {
        self.ignore_folders.iter().any(|folder| name == OsStr::new(folder))
    }

    fn is_ignored_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|extension| {
            self.ignore_extensions
                .iter()
                .any(|ignored| extension == OsStr::new(ignored.trim_start_matches('.')))
        })
    }
}

/// What was copied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopySummary {
    /// The number of files copied.
    pub files: u64,

    /// The number of bytes copied.
    pub bytes: u64,

    /// Manifest paths that did not exist and were skipped.
    pub skipped: Vec<PathBuf>,
}

/// Copy each manifest path under `source_root` to the same relative path under `dest_root`.
///
/// Files named directly in the manifest are always copied, ignore rules only apply while
/// walking directories. Existing destination files are overwritten unless reserved.
pub fn copy_tree(
    source_root: &Path,
    manifest: &[PathBuf],
    dest_root: &Path,
    options: &CopyOptions,
) -> Result<CopySummary, CopyError> {
    let source_root = fs::canonicalize(source_root)
        .map_err(|e| CopyError::Io(e, "resolve source root", source_root.to_path_buf()))?;
    let excluded: Vec<PathBuf> = options
        .excluded
        .iter()
        .map(|path| fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
        .collect();
    let is_excluded = |path: &Path| excluded.iter().any(|excluded| path.starts_with(excluded));
    let reserved: Vec<PathBuf> = options
        .reserved
        .iter()
        .map(|path| dest_root.join(path))
        .collect();

    let mut summary = CopySummary::default();

    for relative in manifest {
        let source = source_root.join(relative);
        let destination = dest_root.join(relative);

        let metadata = match fs::symlink_metadata(&source) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                match options.missing_source {
                    MissingSourcePolicy::Abort => return Err(CopyError::MissingSource(source)),
                    MissingSourcePolicy::Skip => {
                        warn!("Skipping missing source {source:?}");
                        summary.skipped.push(relative.clone());
                        continue;
                    }
                }
            }
            Err(error) => return Err(CopyError::Io(error, "inspect source", source)),
        };

        if is_excluded(&source) {
            debug!("Not copying excluded path {source:?}");
            continue;
        }

        if metadata.is_symlink() {
            warn!("Skipping symbolic link {source:?}");
        } else if metadata.is_dir() {
            copy_directory(
                &source,
                &destination,
                options,
                &is_excluded,
                &reserved,
                &mut summary,
            )?;
        } else {
            copy_file(&source, &destination, &reserved, &mut summary)?;
        }
    }

    Ok(summary)
}

fn copy_directory(
    source: &Path,
    destination: &Path,
    options: &CopyOptions,
    is_excluded: &impl Fn(&Path) -> bool,
    reserved: &[PathBuf],
    summary: &mut CopySummary,
) -> Result<(), CopyError> {
    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if is_excluded(entry.path()) {
                return false;
            }

            // The manifest root itself is never filtered by name.
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && options.is_ignored_folder(entry.file_name()))
        });

    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        let Ok(relative) = path.strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| CopyError::Io(e, "create directory", target.clone()))?;
        } else if file_type.is_symlink() {
            warn!("Skipping symbolic link {path:?}");
        } else if options.is_ignored_file(path) {
            debug!("Ignoring {path:?}");
        } else {
            copy_file(path, &target, reserved, summary)?;
        }
    }

    Ok(())
}

fn copy_file(
    source: &Path,
    destination: &Path,
    reserved: &[PathBuf],
    summary: &mut CopySummary,
) -> Result<(), CopyError> {
    if reserved.iter().any(|path| path == destination) {
        warn!("Not copying {source:?}, {destination:?} is reserved");
        return Ok(());
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CopyError::Io(e, "create directory", parent.to_path_buf()))?;
    }

    let bytes = fs::copy(source, destination)
        .map_err(|e| CopyError::Io(e, "copy file", source.to_path_buf()))?;

    summary.files += 1;
    summary.bytes += bytes;

    Ok(())
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Source path {0:?} does not exist")]
    MissingSource(PathBuf),

    #[error("Failed to {1} {2:?}: {0}")]
    Io(#[source] io::Error, &'static str, PathBuf),

    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CopyError {
    /// The path the error occurred at, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingSource(path) | Self::Io(_, _, path) => Some(path),
            Self::Walk(error) => error.path(),
        }
    }
}
