//! Compress a staging directory into an archive.
//!

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipWriter, result::ZipError, write::SimpleFileOptions};

/// Compresses a directory into a single archive file.
pub trait Compressor {
    /// The file extension of archives produced, without the leading dot.
    fn extension(&self) -> &str;

    /// Compress every file under `source_dir` into `dest_archive`.
    fn compress(
        &self,
        source_dir: &Path,
        dest_archive: &Path,
    ) -> Result<ArchiveSummary, ArchiveError>;
}

/// The compression method for archive entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// Store entries without compression.
    Stored,

    /// Deflate each entry.
    #[default]
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => Self::Stored,
            Compression::Deflated => Self::Deflated,
        }
    }
}

/// What was archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// The number of file entries in the archive.
    pub entries: u64,

    /// The size of the archive in bytes.
    pub bytes: u64,
}

/// Writes ZIP archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver {
    /// The compression method for each entry.
    pub compression: Compression,

    /// If an existing archive may be replaced.
    pub overwrite: bool,
}

impl Compressor for ZipArchiver {
    fn extension(&self) -> &str {
        "zip"
    }

    fn compress(
        &self,
        source_dir: &Path,
        dest_archive: &Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        if !self.overwrite && dest_archive.exists() {
            return Err(ArchiveError::AlreadyExists(dest_archive.to_path_buf()));
        }

        let files = collect_files(source_dir)?;
        if files.is_empty() {
            return Err(ArchiveError::EmptySource(source_dir.to_path_buf()));
        }

        // Write next to the destination, then move into place once complete.
        let partial_path = partial_path(dest_archive);
        let result = self.write_archive(&files, &partial_path);
        if let Err(error) = result {
            match fs::remove_file(&partial_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove partial archive {partial_path:?}: {e}"),
            }
            return Err(error);
        }

        fs::rename(&partial_path, dest_archive).map_err(|e| {
            ArchiveError::Io(e, "move archive into place", dest_archive.to_path_buf())
        })?;

        let bytes = fs::metadata(dest_archive)
            .map_err(|e| ArchiveError::Io(e, "get archive metadata", dest_archive.to_path_buf()))?
            .len();
        let entries = u64::try_from(files.len()).unwrap_or(u64::MAX);

        Ok(ArchiveSummary { entries, bytes })
    }
}

impl ZipArchiver {
    fn write_archive(&self, files: &[ArchiveEntry], path: &Path) -> Result<(), ArchiveError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| ArchiveError::Io(e, "create archive", path.to_path_buf()))?;
        let mut zip = ZipWriter::new(file);

        for entry in files {
            let options = SimpleFileOptions::default()
                .compression_method(self.compression.into())
                .large_file(entry.bytes >= u64::from(u32::MAX));

            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| ArchiveError::Zip(e, entry.absolute.clone()))?;

            let source = File::open(&entry.absolute)
                .map_err(|e| ArchiveError::Io(e, "open", entry.absolute.clone()))?;
            io::copy(&mut BufReader::new(source), &mut zip)
                .map_err(|e| ArchiveError::Io(e, "compress", entry.absolute.clone()))?;

            debug!("Archived {}", entry.name);
        }

        zip.finish()
            .map_err(|e| ArchiveError::Zip(e, path.to_path_buf()))?
            .sync_all()
            .map_err(|e| ArchiveError::Io(e, "sync archive", path.to_path_buf()))?;

        Ok(())
    }
}

/// A file to add to the archive.
struct ArchiveEntry {
    absolute: PathBuf,
    /// Relative to the source directory, `/` separated.
    name: String,
    bytes: u64,
}

fn collect_files(source_dir: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let absolute = entry.path().to_path_buf();
        let Ok(relative) = absolute.strip_prefix(source_dir) else {
            continue;
        };

        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = entry.metadata()?.len();

        files.push(ArchiveEntry {
            absolute,
            name,
            bytes,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(files)
}

fn partial_path(dest_archive: &Path) -> PathBuf {
    let mut name = dest_archive.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive {0:?} already exists")]
    AlreadyExists(PathBuf),

    #[error("Nothing to archive in {0:?}")]
    EmptySource(PathBuf),

    #[error("Failed to {1} {2:?}: {0}")]
    Io(#[source] io::Error, &'static str, PathBuf),

    #[error("Failed to write archive entry for {1:?}: {0}")]
    Zip(#[source] ZipError, PathBuf),

    #[error("Failed to walk staging directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ArchiveError {
    /// The path the error occurred at, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::AlreadyExists(path)
            | Self::EmptySource(path)
            | Self::Io(_, _, path)
            | Self::Zip(_, path) => Some(path),
            Self::Walk(error) => error.path(),
        }
    }
}
