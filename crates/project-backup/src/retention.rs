use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::{Context, naming::TIMESTAMP_FORMAT};

/// Remove the oldest archives in `root` so at most `keep` remain.
///
/// Only files named `<prefix>_<timestamp>[_<n>].<extension>` are considered, oldest by
/// timestamp then counter are removed first. Returns the removed archives.
pub fn prune_archives(
    context: &mut Context,
    root: &Path,
    prefix: &str,
    extension: &str,
    keep: usize,
) -> Vec<PathBuf> {
    context.current_context = "Prune";

    let directory = match fs::read_dir(root) {
        Ok(directory) => directory,
        Err(error) => {
            if error.kind() == ErrorKind::NotFound {
                warn!("{context}Backup root not found: {root:?}");
            } else {
                error!("{context}Could not read backup root {root:?}: {error}");
            }
            return Vec::new();
        }
    };

    // Get each archive in the backup root that can be accessed.
    let mut archives: Vec<((NaiveDateTime, u32), PathBuf)> = directory
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("{context}Could not read entry: {error}");
                    return None;
                }
            };
            let path = entry.path();

            let age = archive_age(entry.file_name().to_str()?, prefix, extension)?;

            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => Some((age, path)),
                Ok(_) => None,
                Err(error) => {
                    warn!("{context}Could not get entry '{path:?}' file type: {error}");
                    None
                }
            }
        })
        .collect();

    // If there is less than the limit, nothing to do
    if archives.len() <= keep {
        return Vec::new();
    }

    // Oldest first.
    archives.sort_by(|a, b| a.0.cmp(&b.0));

    let excess = archives.len() - keep;
    archives
        .into_iter()
        .take(excess)
        .filter_map(|(_, archive)| match fs::remove_file(&archive) {
            Ok(()) => {
                info!("{context}Removed old archive {archive:?}");
                Some(archive)
            }
            Err(e) => {
                error!("{context}Could not remove archive {archive:?}: {e}");
                None
            }
        })
        .collect()
}

/// The timestamp and counter of an archive named `<prefix>_<timestamp>[_<n>].<extension>`.
///
/// An archive without a counter is the first of its minute.
fn archive_age(file_name: &str, prefix: &str, extension: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = file_name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(extension)?
        .strip_suffix('.')?;

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT) {
        return Some((timestamp, 1));
    }

    let (timestamp, counter) = stem.rsplit_once('_')?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    let counter = counter.parse::<u32>().ok()?;

    Some((timestamp, counter))
}
