#![allow(missing_docs)]

use std::fs;

use project_backup::{LOCK_FILE_NAME, LockError, RunLock};

#[test]
fn lock_is_exclusive_until_dropped() {
    let root = tempfile::tempdir().unwrap();

    let lock = RunLock::acquire(root.path()).unwrap();
    assert_eq!(lock.path(), root.path().join(LOCK_FILE_NAME));
    assert_eq!(
        fs::read_to_string(lock.path()).unwrap().trim(),
        std::process::id().to_string()
    );

    let second = RunLock::acquire(root.path());
    assert!(matches!(second, Err(LockError::Held(_))));

    drop(lock);
    assert!(!root.path().join(LOCK_FILE_NAME).exists());

    RunLock::acquire(root.path()).unwrap();
}

#[test]
fn lock_creates_missing_root() {
    let directory = tempfile::tempdir().unwrap();
    let root = directory.path().join("a").join("b");

    let _lock = RunLock::acquire(&root).unwrap();
    assert!(root.join(LOCK_FILE_NAME).is_file());
}
