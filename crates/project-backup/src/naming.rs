//! Backup timestamps and names.
//!

use core::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// The format of a backup timestamp, `YYYY-MM-DD_HH-MM`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// The name of a single backup run, `<prefix>_<timestamp>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupName {
    prefix: String,
    timestamp: String,
    counter: Option<u32>,
}

impl BackupName {
    /// The prefix this name was derived from.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The timestamp part of the name.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The disambiguating counter, if the name collided with an earlier run.
    pub fn counter(&self) -> Option<u32> {
        self.counter
    }

    /// The file name of the archive for this backup.
    pub fn archive_file_name(&self, extension: &str) -> String {
        format!("{self}.{extension}")
    }

    fn with_counter(&self, counter: u32) -> Self {
        Self {
            counter: Some(counter),
            ..self.clone()
        }
    }
}

impl fmt::Display for BackupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix, self.timestamp)?;

        if let Some(counter) = self.counter {
            write!(f, "_{counter}")?;
        }

        Ok(())
    }
}

/// Formats a timestamp as `YYYY-MM-DD_HH-MM`.
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Derive the backup name for a run started at `now`.
///
/// Runs within the same minute derive the same name, see [`resolve_unique`].
pub fn derive_backup_name(now: NaiveDateTime, prefix: &str) -> BackupName {
    BackupName {
        prefix: prefix.to_string(),
        timestamp: format_timestamp(now),
        counter: None,
    }
}

/// Returns the first of `name`, `name_2`, `name_3`, ... with no staging directory
/// and no archive in `root`.
pub fn resolve_unique(root: &Path, name: &BackupName, extension: &str) -> BackupName {
    let is_free = |candidate: &BackupName| {
        let staging: PathBuf = root.join(candidate.to_string());
        let archive = root.join(candidate.archive_file_name(extension));
        !staging.exists() && !archive.exists()
    };

    if is_free(name) {
        return name.clone();
    }

    let mut counter = 2;
    loop {
        let candidate = name.with_counter(counter);
        if is_free(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
