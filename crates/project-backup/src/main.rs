//! # project-backup
//! Back up a project directory into a timestamped ZIP archive.
//!

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use project_backup::{Config, LoadConfigError, Runner, copier::MissingSourcePolicy};
use shared::{Failure, init_logger};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "project-backup",
    version,
    about = "Back up a project directory into a timestamped ZIP archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// The project directory to back up
    #[arg(long, env = "SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// The directory archives are written to
    #[arg(long, env = "BACKUP_ROOT")]
    backup_root: Option<PathBuf>,

    /// The backup name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// A path relative to the source directory to back up, replaces the config's list
    #[arg(long = "include", value_name = "PATH")]
    include: Vec<PathBuf>,

    /// Skip missing include paths instead of failing
    #[arg(long)]
    skip_missing: bool,

    /// The directory for log files
    #[arg(long, env = "BACKUP_LOG_DIR", default_value = "logs", global = true)]
    log_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match init_logger(&cli.log_dir) {
        Ok(guards) => guards,
        Err(error) => {
            eprintln!("Could not start logger: {error}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize config if the command is 'init'.
    if let Some(Command::Init) = cli.command {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write(&cli.config, contents).or_log_and_panic("Could not create config file");
        info!("Wrote default config to {:?}", cli.config);
        return ExitCode::SUCCESS;
    }

    // Load config
    let config = match load_config(cli) {
        Some(config) => config,
        None => return ExitCode::FAILURE,
    };

    let runner = Runner::zip(config);
    match runner.run() {
        Ok(outcome) => {
            println!("--- BACKUP COMPLETE ---");
            println!("Archive:  {}", outcome.archive.display());
            println!("Files:    {}", outcome.archive_summary.entries);
            println!("Size:     {}", format_size(outcome.archive_summary.bytes));
            for path in &outcome.copied.skipped {
                println!("Skipped:  {}", path.display());
            }
            for path in &outcome.pruned {
                println!("Pruned:   {}", path.display());
            }

            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("--- BACKUP FAILED ---");
            eprintln!("Step:     {}", failure.failed_step());
            if let Some(path) = failure.error.path() {
                eprintln!("Path:     {}", path.display());
            }
            eprintln!("Error:    {}", failure.error);
            if let Some(staging) = &failure.staging_directory {
                eprintln!("Staging directory kept at {}", staging.display());
            }

            ExitCode::FAILURE
        }
    }
}

/// Loads the config file, or the defaults if there is none, then applies command line overrides.
fn load_config(cli: Cli) -> Option<Config> {
    let mut config = match Config::load_toml(&cli.config) {
        Ok(config) => config,
        Err(LoadConfigError::NoFile) => {
            warn!("No config at {:?}, using defaults", cli.config);
            Config::default()
        }
        Err(error) => {
            error!("Could not load config {:?}: {error}", cli.config);
            eprintln!("Could not load config {}: {error}", cli.config.display());
            return None;
        }
    };

    if let Some(source_dir) = cli.source_dir {
        config.source_directory = source_dir;
    }
    if let Some(backup_root) = cli.backup_root {
        config.backup_root = backup_root;
    }
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }
    if !cli.include.is_empty() {
        config.include = cli.include;
    }
    if cli.skip_missing {
        config.missing_source = MissingSourcePolicy::Skip;
    }

    Some(config)
}

fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;

    format!(
        "{}.{:02} MB ({bytes} bytes)",
        bytes / MIB,
        (bytes % MIB) * 100 / MIB
    )
}
