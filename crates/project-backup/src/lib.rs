//! # project-backup
//! Back up a project directory into a timestamped archive.
//!
//! A run stages the configured files next to a status report, compresses the staging
//! directory and only then removes it.
//!

pub mod archiver;
mod cleanup;
pub mod config;
mod context;
pub mod copier;
mod lock;
pub mod naming;
pub mod report;
mod retention;
pub mod runner;
pub mod staging;

pub use cleanup::{CleanupError, remove_tree};
pub use config::{Config, ConfigError, LoadConfigError};
pub use context::Context;
pub use lock::{LOCK_FILE_NAME, LockError, RunLock};
pub use retention::prune_archives;
pub use runner::{ErrorKind, RunError, RunFailure, RunOutcome, RunState, Runner};
