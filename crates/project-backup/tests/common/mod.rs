//! # common
//!

#![allow(dead_code)]

use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime};
use project_backup::{
    Config,
    archiver::{ArchiveError, ArchiveSummary, Compressor},
};
use tempfile::TempDir;
use zip::ZipArchive;

/// 2026-01-05 07:03:09
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(7, 3, 9)
        .unwrap()
}

/// Create a directory tree from `(relative path, contents)` pairs.
pub fn source_tree(files: &[(&str, &[u8])]) -> TempDir {
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), files);
    directory
}

pub fn write_files(root: &Path, files: &[(&str, &[u8])]) {
    for (path, contents) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}

/// A config backing up `include` from `source` into `backup_root`.
pub fn test_config(source: &Path, backup_root: &Path, include: &[&str]) -> Config {
    Config {
        source_directory: source.to_path_buf(),
        backup_root: backup_root.to_path_buf(),
        prefix: String::from("Test_Backup"),
        include: include.iter().map(PathBuf::from).collect(),
        ..Config::default()
    }
}

/// Entry names in a ZIP archive, sorted.
pub fn archive_entries(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

/// The contents of one entry in a ZIP archive.
pub fn archive_contents(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents).unwrap();
    contents
}

/// Every file directly inside `directory`, sorted.
pub fn list_directory(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// A compressor that always fails, leaving nothing on disk.
pub struct FailingCompressor;

impl Compressor for FailingCompressor {
    fn extension(&self) -> &str {
        "zip"
    }

    fn compress(
        &self,
        _source_dir: &Path,
        dest_archive: &Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        Err(ArchiveError::Io(
            std::io::Error::other("simulated compression failure"),
            "compress",
            dest_archive.to_path_buf(),
        ))
    }
}
