#![allow(missing_docs)]

use std::fs;

use common::list_directory;
use project_backup::{Context, prune_archives};

mod common;

fn touch(directory: &std::path::Path, names: &[&str]) {
    for name in names {
        fs::write(directory.join(name), b"archive").unwrap();
    }
}

#[test]
fn removes_oldest_beyond_limit() {
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &[
            "Backup_2026-01-05_07-03.zip",
            "Backup_2025-12-31_23-59.zip",
            "Backup_2026-01-05_07-03_2.zip",
            "Backup_2026-01-06_00-00.zip",
        ],
    );

    let mut context = Context::default();
    let removed = prune_archives(&mut context, root.path(), "Backup", "zip", 2);

    assert_eq!(removed.len(), 2);
    assert_eq!(
        list_directory(root.path()),
        vec!["Backup_2026-01-05_07-03_2.zip", "Backup_2026-01-06_00-00.zip"]
    );
}

#[test]
fn counters_order_numerically() {
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &[
            "Backup_2026-01-05_07-03.zip",
            "Backup_2026-01-05_07-03_2.zip",
            "Backup_2026-01-05_07-03_10.zip",
        ],
    );

    let mut context = Context::default();
    prune_archives(&mut context, root.path(), "Backup", "zip", 1);

    assert_eq!(
        list_directory(root.path()),
        vec!["Backup_2026-01-05_07-03_10.zip"]
    );
}

#[test]
fn unrelated_files_are_kept() {
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &[
            "Backup_2026-01-05_07-03.zip",
            "Other_2020-01-01_00-00.zip",
            "Backup_notes.txt",
        ],
    );
    fs::create_dir(root.path().join("Backup_2026-01-05_07-04")).unwrap();

    let mut context = Context::default();
    let removed = prune_archives(&mut context, root.path(), "Backup", "zip", 0);

    assert_eq!(removed, vec![root.path().join("Backup_2026-01-05_07-03.zip")]);
    assert_eq!(
        list_directory(root.path()),
        vec![
            "Backup_2026-01-05_07-04",
            "Backup_notes.txt",
            "Other_2020-01-01_00-00.zip"
        ]
    );
}

#[test]
fn under_limit_removes_nothing() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["Backup_2026-01-05_07-03.zip"]);

    let mut context = Context::default();
    let removed = prune_archives(&mut context, root.path(), "Backup", "zip", 3);

    assert!(removed.is_empty());
    assert_eq!(list_directory(root.path()).len(), 1);
}

#[test]
fn missing_root_removes_nothing() {
    let root = tempfile::tempdir().unwrap();

    let mut context = Context::default();
    let removed = prune_archives(&mut context, &root.path().join("missing"), "Backup", "zip", 0);

    assert!(removed.is_empty());
}

#[test]
fn longer_prefix_is_not_this_prefix() {
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &[
            "Test_Backup_2026-01-01_00-00.zip",
            "Test_Backup_2026-01-02_00-00.zip",
            "Test_2026-01-03_00-00.zip",
        ],
    );

    let mut context = Context::default();
    let removed = prune_archives(&mut context, root.path(), "Test", "zip", 1);

    assert!(removed.is_empty());
    assert_eq!(
        list_directory(root.path()),
        vec![
            "Test_2026-01-03_00-00.zip",
            "Test_Backup_2026-01-01_00-00.zip",
            "Test_Backup_2026-01-02_00-00.zip"
        ]
    );

    let removed = prune_archives(&mut context, root.path(), "Test_Backup", "zip", 1);

    assert_eq!(
        removed,
        vec![root.path().join("Test_Backup_2026-01-01_00-00.zip")]
    );
    assert_eq!(
        list_directory(root.path()),
        vec![
            "Test_2026-01-03_00-00.zip",
            "Test_Backup_2026-01-02_00-00.zip"
        ]
    );
}

#[test]
fn names_without_a_timestamp_are_kept() {
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &[
            "Backup_2026-01-05_07-03.zip",
            "Backup_latest.zip",
            "Backup_2026-01-05_07-03_final.zip",
            "Backup_2026-13-40_99-99.zip",
        ],
    );

    let mut context = Context::default();
    let removed = prune_archives(&mut context, root.path(), "Backup", "zip", 0);

    assert_eq!(removed, vec![root.path().join("Backup_2026-01-05_07-03.zip")]);
    assert_eq!(
        list_directory(root.path()),
        vec![
            "Backup_2026-01-05_07-03_final.zip",
            "Backup_2026-13-40_99-99.zip",
            "Backup_latest.zip"
        ]
    );
}
