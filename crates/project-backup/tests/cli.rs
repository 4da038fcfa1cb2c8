#![allow(missing_docs)]

use std::{fs, path::Path};

use assert_cmd::Command;
use common::{list_directory, source_tree};
use predicates::prelude::*;
use project_backup::Config;

mod common;

fn command(scratch: &Path) -> Command {
    let mut command = Command::cargo_bin("project-backup").unwrap();
    command
        .current_dir(scratch)
        .env_remove("SOURCE_DIR")
        .env_remove("BACKUP_ROOT")
        .arg("--log-dir")
        .arg(scratch.join("logs"));
    command
}

#[test]
fn backup_from_arguments() {
    let source = source_tree(&[("main.ext", b"main"), ("ui/widget.ext", b"widget")]);
    let scratch = tempfile::tempdir().unwrap();
    let backup_root = scratch.path().join("backups");

    command(scratch.path())
        .arg("--source-dir")
        .arg(source.path())
        .arg("--backup-root")
        .arg(&backup_root)
        .args(["--prefix", "Cli_Backup", "--include", "main.ext", "--include", "ui"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BACKUP COMPLETE"))
        .stdout(predicate::str::contains("Cli_Backup_"));

    let archives = list_directory(&backup_root);
    assert_eq!(archives.len(), 1);
    assert!(archives[0].starts_with("Cli_Backup_"));
    assert!(archives[0].ends_with(".zip"));
}

#[test]
fn backup_from_environment() {
    let source = source_tree(&[("main.ext", b"main")]);
    let scratch = tempfile::tempdir().unwrap();
    let backup_root = scratch.path().join("backups");

    command(scratch.path())
        .env("SOURCE_DIR", source.path())
        .env("BACKUP_ROOT", &backup_root)
        .args(["--include", "main.ext"])
        .assert()
        .success();

    assert_eq!(list_directory(&backup_root).len(), 1);
}

#[test]
fn failed_step_exits_non_zero() {
    let source = source_tree(&[("main.ext", b"main")]);
    let scratch = tempfile::tempdir().unwrap();
    let backup_root = scratch.path().join("backups");

    command(scratch.path())
        .arg("--source-dir")
        .arg(source.path())
        .arg("--backup-root")
        .arg(&backup_root)
        .args(["--include", "main.ext", "--include", "missing.ext"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("copy files"))
        .stderr(predicate::str::contains("missing.ext"))
        .stderr(predicate::str::contains("Staging directory kept"));

    // Only the preserved staging directory, no archive.
    let entries = list_directory(&backup_root);
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].ends_with(".zip"));
}

#[test]
fn skip_missing_flag() {
    let source = source_tree(&[("main.ext", b"main")]);
    let scratch = tempfile::tempdir().unwrap();

    command(scratch.path())
        .arg("--source-dir")
        .arg(source.path())
        .arg("--backup-root")
        .arg(scratch.path().join("backups"))
        .args(["--include", "main.ext", "--include", "missing.ext", "--skip-missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped:  missing.ext"));
}

#[test]
fn config_file_is_used() {
    let source = source_tree(&[("main.ext", b"main")]);
    let scratch = tempfile::tempdir().unwrap();
    let backup_root = scratch.path().join("from-config");

    let config = Config {
        source_directory: source.path().to_path_buf(),
        backup_root: backup_root.clone(),
        prefix: String::from("Configured"),
        include: vec!["main.ext".into()],
        ..Config::default()
    };
    fs::write(
        scratch.path().join("config.toml"),
        toml::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    command(scratch.path()).assert().success();

    let archives = list_directory(&backup_root);
    assert_eq!(archives.len(), 1);
    assert!(archives[0].starts_with("Configured_"));
}

#[test]
fn invalid_config_file_exits_non_zero() {
    let scratch = tempfile::tempdir().unwrap();
    fs::write(scratch.path().join("config.toml"), "include = 5\n").unwrap();

    command(scratch.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not load config"));
}

#[test]
fn init_writes_default_config() {
    let scratch = tempfile::tempdir().unwrap();

    command(scratch.path()).arg("init").assert().success();

    let config = Config::load_toml(&scratch.path().join("config.toml")).unwrap();
    assert_eq!(config.prefix, Config::default().prefix);
    assert_eq!(config.include, Config::default().include);
}
