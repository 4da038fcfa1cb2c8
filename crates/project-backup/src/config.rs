//! Project backup config
//!

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{archiver::Compression, copier::MissingSourcePolicy};

/// The backup config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The root of the project to back up.
    pub source_directory: PathBuf,

    /// The directory holding every archive produced.
    pub backup_root: PathBuf,

    /// The prefix of each backup name. Only `[a-zA-Z0-9_\-]` is valid.
    pub prefix: String,

    /// Paths relative to the source directory to include in the backup.
    pub include: Vec<PathBuf>,

    /// Folder names that are never descended into.
    pub ignore_folders: Vec<String>,

    /// File extensions, without the leading dot, that are never copied.
    pub ignore_extensions: Vec<String>,

    /// What to do when an included path does not exist.
    pub missing_source: MissingSourcePolicy,

    /// The compression method for archive entries.
    pub compression: Compression,

    /// If an existing archive with the same name may be replaced.
    pub overwrite_archive: bool,

    /// The number of archives to keep in the backup root, all are kept if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_archives: Option<usize>,
}

impl Config {
    /// Tries to load a config from a toml file.
    pub fn load_toml(file_path: &Path) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile);
        }

        let contents = fs::read_to_string(file_path).map_err(LoadConfigError::Read)?;
        let config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Checks the config describes a backup that can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Source directory
        let source_metadata = fs::metadata(&self.source_directory).map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                ConfigError::SourceNotFound(self.source_directory.clone())
            } else {
                ConfigError::Io(error, self.source_directory.clone())
            }
        })?;
        if !source_metadata.is_dir() {
            return Err(ConfigError::SourceNotDirectory(
                self.source_directory.clone(),
            ));
        }

        // Backup root, may not exist yet.
        match fs::metadata(&self.backup_root) {
            Ok(metadata) if !metadata.is_dir() => {
                return Err(ConfigError::BackupRootNotDirectory(
                    self.backup_root.clone(),
                ));
            }
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(ConfigError::Io(error, self.backup_root.clone())),
        }

        validate_prefix(&self.prefix)?;

        // Manifest
        if self.include.is_empty() {
            return Err(ConfigError::EmptyManifest);
        }
        for path in &self.include {
            let is_relative_inside = path.components().count() > 0
                && path.components().all(|component| {
                    matches!(component, Component::Normal(_) | Component::CurDir)
                });

            if !is_relative_inside {
                return Err(ConfigError::InvalidInclude(path.clone()));
            }
        }

        if self.max_archives == Some(0) {
            return Err(ConfigError::ZeroMaxArchives);
        }

        // The backup root is never copied, so it may not contain the source.
        let source = fs::canonicalize(&self.source_directory)
            .map_err(|error| ConfigError::Io(error, self.source_directory.clone()))?;
        match fs::canonicalize(&self.backup_root) {
            Ok(backup_root) if source.starts_with(&backup_root) => {
                return Err(ConfigError::SourceInsideBackupRoot(
                    self.source_directory.clone(),
                ));
            }
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(ConfigError::Io(error, self.backup_root.clone())),
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("."),
            backup_root: PathBuf::from("snapshot").join("backups"),
            prefix: String::from("DSR_PRO_Backup"),
            include: vec![
                PathBuf::from("main.py"),
                PathBuf::from("requirements.txt"),
                PathBuf::from("ui"),
                PathBuf::from("core"),
            ],
            ignore_folders: [
                ".git",
                "__pycache__",
                "venv",
                "env",
                "backups",
                "dist",
                "build",
                ".idea",
                ".vscode",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ignore_extensions: ["pyc", "tmp", "log"]
                .into_iter()
                .map(String::from)
                .collect(),
            missing_source: MissingSourcePolicy::default(),
            compression: Compression::default(),
            overwrite_archive: false,
            max_archives: None,
        }
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::EmptyPrefix);
    }

    if let Some((index, character)) = prefix.char_indices().find(|(_, character)| {
        !(character.is_ascii_alphanumeric() || matches!(character, '_' | '-'))
    }) {
        return Err(ConfigError::InvalidPrefix(index, character));
    }

    Ok(())
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file does not exist.")]
    NoFile,

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    Deserialize(#[from] toml::de::Error),
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Source directory {0:?} does not exist")]
    SourceNotFound(PathBuf),

    #[error("Source path {0:?} is not a directory")]
    SourceNotDirectory(PathBuf),

    #[error("Backup root {0:?} exists but is not a directory")]
    BackupRootNotDirectory(PathBuf),

    #[error("Source directory {0:?} is inside the backup root")]
    SourceInsideBackupRoot(PathBuf),

    #[error("Failed to inspect {1:?}: {0}")]
    Io(#[source] io::Error, PathBuf),

    #[error("Prefix must not be empty")]
    EmptyPrefix,

    /// `index, char`
    #[error("Invalid character at index {0}: '{1}', prefix may only contain [a-zA-Z0-9_\\-]")]
    InvalidPrefix(usize, char),

    #[error("No paths to include")]
    EmptyManifest,

    #[error("Included path {0:?} must be relative and stay inside the source directory")]
    InvalidInclude(PathBuf),

    #[error("Max archives must be at least 1 to keep the new archive")]
    ZeroMaxArchives,
}

impl ConfigError {
    /// The offending path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceNotFound(path)
            | Self::SourceNotDirectory(path)
            | Self::BackupRootNotDirectory(path)
            | Self::SourceInsideBackupRoot(path)
            | Self::Io(_, path)
            | Self::InvalidInclude(path) => Some(path),
            Self::EmptyPrefix
            | Self::InvalidPrefix(_, _)
            | Self::EmptyManifest
            | Self::ZeroMaxArchives => None,
        }
    }
}
