//! The backup pipeline.
//!

use core::fmt;
use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    Config, Context,
    archiver::{ArchiveError, ArchiveSummary, Compressor, ZipArchiver},
    cleanup::CleanupError,
    config::ConfigError,
    copier::{CopyError, CopyOptions, CopySummary, copy_tree},
    lock::{LockError, RunLock},
    naming::{BackupName, derive_backup_name, resolve_unique},
    report::{REPORT_FILE_NAME, write_report},
    retention::prune_archives,
    staging::{StagingError, create_staging},
};

/// The states of a single run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Nothing has been written.
    Init,

    /// The staging directory exists.
    StagingCreated,

    /// The status report is in the staging directory.
    ReportWritten,

    /// The manifest has been copied into the staging directory.
    FilesCopied,

    /// The archive has been written.
    Archived,

    /// The staging directory has been removed.
    CleanedUp,

    /// The run completed.
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::StagingCreated => "staging created",
            Self::ReportWritten => "report written",
            Self::FilesCopied => "files copied",
            Self::Archived => "archived",
            Self::CleanedUp => "cleaned up",
            Self::Done => "done",
        };

        f.write_str(name)
    }
}

/// A completed run.
#[derive(Debug)]
pub struct RunOutcome {
    /// The backup's name.
    pub name: BackupName,

    /// The archive produced.
    pub archive: PathBuf,

    /// The staging directory used, no longer on disk.
    pub staging_directory: PathBuf,

    /// What was copied from the source.
    pub copied: CopySummary,

    /// What was archived.
    pub archive_summary: ArchiveSummary,

    /// Old archives removed by retention.
    pub pruned: Vec<PathBuf>,
}

/// Runs backups.
#[derive(Debug)]
pub struct Runner<C> {
    config: Config,
    compressor: C,
}

impl Runner<ZipArchiver> {
    /// A runner writing ZIP archives as configured.
    pub fn zip(config: Config) -> Self {
        let compressor = ZipArchiver {
            compression: config.compression,
            overwrite: config.overwrite_archive,
        };

        Self::new(config, compressor)
    }
}

impl<C: Compressor> Runner<C> {
    /// Create a new runner.
    pub fn new(config: Config, compressor: C) -> Self {
        Self { config, compressor }
    }

    /// The runner's config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a backup now.
    pub fn run(&self) -> Result<RunOutcome, RunFailure> {
        self.run_at(Local::now().naive_local())
    }

    /// Run a backup as if started at `now`.
    ///
    /// Stops at the first failing step. The staging directory is only removed once the
    /// archive has been written, a failed run keeps it for inspection.
    pub fn run_at(&self, now: NaiveDateTime) -> Result<RunOutcome, RunFailure> {
        let mut context = Context::default();
        let mut state = RunState::Init;
        let mut staging_directory = None;

        self.execute(&mut context, now, &mut state, &mut staging_directory)
            .map_err(|error| {
                error!("{context}Failed after {state}: {error}");
                if let Some(staging) = &staging_directory {
                    warn!("{context}Kept staging directory {staging:?}");
                }

                RunFailure {
                    state,
                    staging_directory,
                    error,
                }
            })
    }

    fn execute(
        &self,
        context: &mut Context,
        now: NaiveDateTime,
        state: &mut RunState,
        staging_directory: &mut Option<PathBuf>,
    ) -> Result<RunOutcome, RunError> {
        let config = &self.config;
        let extension = self.compressor.extension();

        context.current_context = "Validate";
        config.validate()?;

        context.current_context = "Lock";
        let _lock = RunLock::acquire(&config.backup_root)?;

        let name = derive_backup_name(now, &config.prefix);
        let name = resolve_unique(&config.backup_root, &name, extension);
        context.backup = Some(name.to_string());
        if name.counter().is_some() {
            warn!("{context}A backup already exists for this minute, using {name}");
        }

        // Stage
        let staging = {
            context.current_context = "Stage";

            let staging = create_staging(&config.backup_root, &name.to_string())?;
            *staging_directory = Some(staging.path().to_path_buf());
            *state = RunState::StagingCreated;
            info!("{context}Created {:?}", staging.path());

            staging
        };

        // Report
        {
            context.current_context = "Report";

            write_report(staging.path(), name.timestamp())
                .map_err(|e| RunError::Report(e, staging.path().join(REPORT_FILE_NAME)))?;
            *state = RunState::ReportWritten;
        }

        // Copy
        let copied = {
            context.current_context = "Copy";

            let mut options = CopyOptions::from_config(config);
            options.excluded.push(config.backup_root.clone());
            options.reserved.push(PathBuf::from(REPORT_FILE_NAME));

            let copied = copy_tree(
                &config.source_directory,
                &config.include,
                staging.path(),
                &options,
            )?;
            *state = RunState::FilesCopied;
            info!(
                "{context}Copied {} files ({} bytes), skipped {}",
                copied.files,
                copied.bytes,
                copied.skipped.len()
            );

            copied
        };

        // Archive
        let archive = config
            .backup_root
            .join(name.archive_file_name(extension));
        let archive_summary = {
            context.current_context = "Archive";

            let summary = self.compressor.compress(staging.path(), &archive)?;
            *state = RunState::Archived;
            info!(
                "{context}Wrote {archive:?} ({} entries, {} bytes)",
                summary.entries, summary.bytes
            );

            summary
        };

        // Cleanup
        let staging_path = staging.path().to_path_buf();
        {
            context.current_context = "Cleanup";

            staging.remove()?;
            *staging_directory = None;
            *state = RunState::CleanedUp;
        }

        // Retention
        let pruned = match config.max_archives {
            Some(keep) => prune_archives(
                context,
                &config.backup_root,
                &config.prefix,
                extension,
                keep,
            ),
            None => Vec::new(),
        };

        *state = RunState::Done;
        context.current_context = "Done";
        info!("{context}Backup complete");

        Ok(RunOutcome {
            name,
            archive,
            staging_directory: staging_path,
            copied,
            archive_summary,
            pruned,
        })
    }
}

/// A failed run.
#[derive(Debug, Error)]
#[error("Backup failed after {state}: {error}")]
pub struct RunFailure {
    /// The last state the run reached.
    pub state: RunState,

    /// The staging directory left on disk, if one was created.
    pub staging_directory: Option<PathBuf>,

    /// The error that stopped the run.
    #[source]
    pub error: RunError,
}

impl RunFailure {
    /// The step that failed, named for users.
    pub fn failed_step(&self) -> &'static str {
        match &self.error {
            RunError::Config(_) => "validate config",
            RunError::Lock(_) => "lock backup root",
            RunError::Staging(_) => "create staging directory",
            RunError::Report(_, _) => "write status report",
            RunError::Copy(_) => "copy files",
            RunError::Archive(_) => "compress",
            RunError::Cleanup(_) => "remove staging directory",
        }
    }
}

/// The kinds of run errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The config is missing or invalid.
    Config,

    /// A filesystem step failed.
    Io,
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Lock(#[from] LockError),

    #[error("{0}")]
    Staging(#[from] StagingError),

    #[error("Failed to write status report {1:?}: {0}")]
    Report(#[source] io::Error, PathBuf),

    #[error("{0}")]
    Copy(#[from] CopyError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("{0}")]
    Cleanup(#[from] CleanupError),
}

impl RunError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            _ => ErrorKind::Io,
        }
    }

    /// The offending path, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Config(error) => error.path(),
            Self::Lock(error) => Some(error.path()),
            Self::Staging(error) => Some(error.path()),
            Self::Report(_, path) => Some(path),
            Self::Copy(error) => error.path(),
            Self::Archive(error) => error.path(),
            Self::Cleanup(error) => Some(error.path()),
        }
    }
}
